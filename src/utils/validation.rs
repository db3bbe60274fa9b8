//! Token address validation

use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::{MAX_ADDRESS_LEN, MIN_ADDRESS_LEN};

/// Base58 alphabet check (`[1-9A-HJ-NP-Za-km-z]`, no 0/O/I/l)
#[inline]
pub fn is_base58_char(c: char) -> bool {
    matches!(c, '1'..='9' | 'A'..='H' | 'J'..='N' | 'P'..='Z' | 'a'..='k' | 'm'..='z')
}

pub fn is_valid_address(address: &str) -> bool {
    (MIN_ADDRESS_LEN..=MAX_ADDRESS_LEN).contains(&address.len())
        && address.chars().all(is_base58_char)
}

/// Trim and validate a token address, returning the normalized form
pub fn validate_address(address: &str) -> AppResult<String> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("Contract address is required"));
    }
    if !is_valid_address(trimmed) {
        return Err(AppError::validation(format!(
            "Invalid contract address: expected {}-{} base58 characters",
            MIN_ADDRESS_LEN, MAX_ADDRESS_LEN
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::ErrorCode;

    #[test]
    fn test_valid_addresses() {
        assert!(is_valid_address("So11111111111111111111111111111111111111112"));
        assert!(is_valid_address("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"));
        assert_eq!(
            validate_address("  DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263 ").unwrap(),
            "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263"
        );
    }

    #[test]
    fn test_invalid_addresses() {
        // too short
        assert!(!is_valid_address("So1111111111111111111111111111"));
        // too long
        assert!(!is_valid_address(&"1".repeat(45)));
        // forbidden characters
        assert!(!is_valid_address("0x11111111111111111111111111111111111111112"));
        assert!(!is_valid_address("Ol11111111111111111111111111111111111111112"));

        let err = validate_address("").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.code.api_code(), "VALIDATION_ERROR");
    }
}
