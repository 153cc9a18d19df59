//! Evaluación de máscaras binarias de 8 bits.

use crate::error::DomainError;

/// Ancho fijo de objetivo y máscara.
pub const MASK_WIDTH: usize = 8;

/// `true` si `target | mask == mask`, es decir, si la máscara cubre todos los
/// bits encendidos del objetivo.
pub fn evaluate_bitwise_or(target: &str, mask: &str) -> Result<bool, DomainError> {
    let target_bits = parse_bits("target", target)?;
    let mask_bits = parse_bits("mask", mask)?;
    Ok(target_bits | mask_bits == mask_bits)
}

fn parse_bits(label: &str, raw: &str) -> Result<u8, DomainError> {
    if raw.chars().count() != MASK_WIDTH {
        return Err(DomainError::InvalidBitMask(format!("{label} must be {MASK_WIDTH} characters long")));
    }
    if !raw.chars().all(|c| c == '0' || c == '1') {
        return Err(DomainError::InvalidBitMask(format!("{label} must contain only '0' or '1'")));
    }
    u8::from_str_radix(raw, 2).map_err(|e| DomainError::InvalidBitMask(format!("{label}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_covering_target_bits_passes() {
        assert!(evaluate_bitwise_or("10000000", "11000000").unwrap());
        assert!(evaluate_bitwise_or("10101010", "11111111").unwrap());
        assert!(evaluate_bitwise_or("00000000", "00000000").unwrap());
    }

    #[test]
    fn mask_missing_a_target_bit_fails() {
        assert!(!evaluate_bitwise_or("10101010", "10000000").unwrap());
        assert!(!evaluate_bitwise_or("00000001", "00000000").unwrap());
    }

    #[test]
    fn wrong_width_is_rejected() {
        let err = evaluate_bitwise_or("1010", "11111111").unwrap_err();
        assert_eq!(err.to_string(), "invalid bit mask: target must be 8 characters long");
        let err = evaluate_bitwise_or("10101010", "111111111").unwrap_err();
        assert_eq!(err.to_string(), "invalid bit mask: mask must be 8 characters long");
    }

    #[test]
    fn non_binary_digits_are_rejected() {
        let err = evaluate_bitwise_or("1010102a", "11111111").unwrap_err();
        assert_eq!(err.to_string(), "invalid bit mask: target must contain only '0' or '1'");
        let err = evaluate_bitwise_or("10101010", "1111 111").unwrap_err();
        assert_eq!(err.to_string(), "invalid bit mask: mask must contain only '0' or '1'");
    }
}
