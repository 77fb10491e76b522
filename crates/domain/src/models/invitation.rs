//! Invitation domain model and code generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single-use code granting membership in one circle, issued by one member.
///
/// Once `used` flips to true, `used_by` and `used_at` are set and never
/// change again; a code is redeemable at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Invitation {
    pub id: Uuid,
    pub code: String,
    pub circle_id: Uuid,
    pub issued_by: Uuid,
    pub used: bool,
    pub used_by: Option<Uuid>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Generate a random invitation code in XXXX-XXXX-XXXX format.
pub fn generate_invitation_code() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let chars: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789"; // Avoiding confusing chars: 0, O, I, 1

    let mut generate_segment = || -> String {
        (0..4)
            .map(|_| {
                let idx = rng.gen_range(0..chars.len());
                chars[idx] as char
            })
            .collect()
    };

    format!(
        "{}-{}-{}",
        generate_segment(),
        generate_segment(),
        generate_segment()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_invitation_code_format() {
        let code = generate_invitation_code();
        assert_eq!(code.len(), 14); // XXXX-XXXX-XXXX
        assert_eq!(&code[4..5], "-");
        assert_eq!(&code[9..10], "-");

        for (i, c) in code.chars().enumerate() {
            if i == 4 || i == 9 {
                assert_eq!(c, '-');
            } else {
                assert!(
                    c.is_ascii_uppercase() || c.is_ascii_digit(),
                    "Invalid char: {}",
                    c
                );
                assert!(c != 'O' && c != 'I' && c != '0' && c != '1');
            }
        }
    }

    #[test]
    fn test_generate_invitation_code_uniqueness() {
        let codes: Vec<String> = (0..100).map(|_| generate_invitation_code()).collect();
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        // With this character space, duplicates should be extremely rare
        assert!(unique.len() >= 99);
    }
}
