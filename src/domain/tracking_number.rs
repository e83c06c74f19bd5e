use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

const PREFIX: &str = "VN";
const SEQUENCE_MODULO: u64 = 10_000;

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a public tracking number: `VN{unix-millis}{4-digit-sequence}`,
/// e.g. `VN17369123450001`. The sequence suffix keeps numbers generated
/// within the same millisecond distinct; the unique column on `orders`
/// is the final arbiter against collisions.
pub fn generate() -> String {
    let timestamp = Utc::now().timestamp_millis();
    let sequence = COUNTER.fetch_add(1, Ordering::Relaxed).wrapping_add(1) % SEQUENCE_MODULO;
    format!("{PREFIX}{timestamp}{sequence:04}")
}

/// Format check: `VN` followed by 13 timestamp digits and 4 sequence digits.
pub fn is_valid_format(tracking_number: &str) -> bool {
    let Some(digits) = tracking_number.strip_prefix(PREFIX) else {
        return false;
    };
    digits.len() == 17 && digits.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_numbers_match_the_format() {
        let number = generate();
        assert!(is_valid_format(&number), "bad format: {number}");
    }

    #[test]
    fn consecutive_numbers_differ() {
        let a = generate();
        let b = generate();
        assert_ne!(a, b);
    }

    #[test]
    fn format_check_rejects_garbage() {
        assert!(!is_valid_format(""));
        assert!(!is_valid_format("VN123"));
        assert!(!is_valid_format("XX17369123450001"));
        assert!(!is_valid_format("VN1736912345000A00"));
        assert!(is_valid_format("VN17369123450000001"));
    }
}
