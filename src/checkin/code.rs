//! Participant code shape and random candidates.

pub const CODE_LENGTH: usize = 5;

pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Exactly `CODE_LENGTH` characters, each from `CODE_ALPHABET`.
pub fn is_valid_code(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| CODE_ALPHABET.contains(&b))
}

/// Produces candidate identifiers for new participants.
pub trait IdSource: Send + Sync {
    fn candidate(&self) -> String;
}

pub struct RandomIds;

impl IdSource for RandomIds {
    fn candidate(&self) -> String {
        (0..CODE_LENGTH)
            .map(|_| CODE_ALPHABET[rand::random_range(0..CODE_ALPHABET.len())] as char)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_five_allowed_characters() {
        assert!(is_valid_code("AB12C"));
        assert!(is_valid_code("00000"));

        for bad in ["", "AB12", "AB12CD", "ab12c", "AB-2C", "AB 2C", "ÄB12C", "AB12\n"] {
            assert!(!is_valid_code(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn random_candidates_are_valid_codes() {
        for _ in 0..200 {
            let id = RandomIds.candidate();
            assert!(is_valid_code(&id), "{id}");
        }
    }
}
