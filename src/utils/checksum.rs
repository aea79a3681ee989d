//! Mixed-case address checksums (EIP-55 style)
//!
//! The case of each hex letter is decided by the keccak-256 digest of the
//! lowercase address, so any two spellings of the same 20 bytes checksum
//! identically.

use alloy_primitives::{keccak256, Address};
use serde::Serializer;

use crate::models::errors::{AppError, AppResult};

/// Checksum a `0x`-prefixed, 40-hex-digit address given in any case.
pub fn to_checksum(address: &str) -> AppResult<String> {
    let digits = address
        .strip_prefix("0x")
        .filter(|d| d.len() == 40 && d.bytes().all(|b| b.is_ascii_hexdigit()))
        .ok_or_else(|| AppError::invalid_address(address))?;

    let lower = digits.to_ascii_lowercase();
    let digest = hex::encode(keccak256(lower.as_bytes()));

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (c, h) in lower.chars().zip(digest.chars()) {
        // digest is lowercase hex, so the nibble always parses
        let nibble = h.to_digit(16).unwrap_or(0);
        if nibble > 7 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

/// Checksum a parsed address.
pub fn checksum_address(address: &Address) -> String {
    // Lowercase hex of 20 bytes is always well-formed
    to_checksum(&format!("{:#x}", address)).unwrap_or_else(|_| format!("{:#x}", address))
}

/// Parse an address string, rejecting anything that is not `0x` + 40 hex digits.
pub fn parse_address(address: &str) -> AppResult<Address> {
    let checksummed = to_checksum(address)?;
    checksummed
        .parse::<Address>()
        .map_err(|_| AppError::invalid_address(address))
}

/// Serde helper: write an address in checksummed form
pub fn serialize_checksummed<S: Serializer>(address: &Address, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&checksum_address(address))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_checksums() {
        assert_eq!(
            to_checksum("0x2791bca1f2de4661ed88a30c99a7a9449aa84174").unwrap(),
            "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174"
        );
        assert_eq!(
            to_checksum("0x3C499C542CEF5E3811E1192CE70D8CC03D5C3359").unwrap(),
            "0x3c499c542cEF5E3811e1192ce70d8cC03d5c3359"
        );
        // EIP-55 reference vector
        assert_eq!(
            to_checksum("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap(),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
    }

    #[test]
    fn test_idempotent_under_lowercase() {
        let inputs = [
            "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0x0000000000000000000000000000000000000000",
            "0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF",
        ];
        for input in inputs {
            let once = to_checksum(input).unwrap();
            let twice = to_checksum(&once.to_lowercase()).unwrap();
            assert_eq!(once, twice);
            assert_eq!(once.to_lowercase(), input.to_lowercase());
        }
    }

    #[test]
    fn test_matches_alloy() {
        let addr: Address = "0xd8da6bf26964af9d7eed9e03e53415d37aa96045".parse().unwrap();
        assert_eq!(checksum_address(&addr), addr.to_checksum(None));
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in [
            "",
            "0x",
            "2791bca1f2de4661ed88a30c99a7a9449aa84174",
            "0x2791bca1f2de4661ed88a30c99a7a9449aa8417",
            "0x2791bca1f2de4661ed88a30c99a7a9449aa841740",
            "0x2791bca1f2de4661ed88a30c99a7a9449aa8417g",
            "0X2791bca1f2de4661ed88a30c99a7a9449aa84174",
        ] {
            let err = to_checksum(bad).unwrap_err();
            assert_eq!(err.code, crate::models::errors::ErrorCode::InvalidAddressFormat);
        }
    }

    #[test]
    fn test_parse_address_roundtrip() {
        let addr = parse_address("0x2791BCA1F2DE4661ED88A30C99A7A9449AA84174").unwrap();
        assert_eq!(checksum_address(&addr), "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174");
    }
}
