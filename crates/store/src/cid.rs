//! Syntactic CID validation.
//!
//! Accepts CIDv0 (`Qm` + base58, 0x12 0x20 multihash prefix) and base32
//! CIDv1 (`b` multibase prefix). No multicodec table lookup; the engine
//! authenticates content by re-hashing, not by CID inspection.

/// Check whether a string is a plausibly well-formed CID.
pub fn validate_cid(s: &str) -> bool {
    if s.len() < 8 {
        return false;
    }

    // CIDv0: 46-char base58 string encoding a sha2-256 multihash
    if let Some(rest) = s.strip_prefix("Qm") {
        if s.len() != 46 {
            return false;
        }
        if !rest.bytes().all(is_base58_char) {
            return false;
        }
        return match bs58::decode(s).into_vec() {
            Ok(bytes) => bytes.len() == 34 && bytes[0] == 0x12 && bytes[1] == 0x20,
            Err(_) => false,
        };
    }

    // CIDv1, base32 lowercase multibase
    if let Some(rest) = s.strip_prefix('b') {
        return rest.len() >= 8 && rest.bytes().all(is_base32_char);
    }

    false
}

fn is_base58_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() && !matches!(c, b'0' | b'O' | b'I' | b'l')
}

fn is_base32_char(c: u8) -> bool {
    matches!(c, b'a'..=b'z' | b'2'..=b'7')
}
