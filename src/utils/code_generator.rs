use rand::Rng;
use uuid::Uuid;

/// Six-digit numeric code used for email verification.
pub fn generate_six_digit_code() -> String {
    let mut rng = rand::thread_rng();
    format!("{:06}", rng.gen_range(100000..=999999))
}

/// Human-readable transaction reference, `EMB-` followed by eight uppercase hex chars.
pub fn generate_transaction_id() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("EMB-{}", raw[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_six_digit_code() {
        let code = generate_six_digit_code();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));

        let code_num: u32 = code.parse().unwrap();
        assert!((100000..=999999).contains(&code_num));
    }

    #[test]
    fn test_transaction_id_format() {
        let id = generate_transaction_id();
        assert_eq!(id.len(), 12);
        assert!(id.starts_with("EMB-"));
        assert!(
            id[4..]
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }

    #[test]
    fn test_transaction_ids_differ() {
        assert_ne!(generate_transaction_id(), generate_transaction_id());
    }
}
