//! Input validation helpers
//!
//! Text length limits for everything a customer or staff member can type.
//! Helpers return the message only; callers wrap it in their own error type.

// ── Text length limits ──────────────────────────────────────────────

/// Menu item names, customer names
pub const MAX_NAME_LEN: usize = 200;

/// Special instructions on items and orders
pub const MAX_NOTE_LEN: usize = 500;

/// Venue ids, menu item ids
pub const MAX_ID_LEN: usize = 64;

/// Table codes printed on the QR stickers
pub const MAX_TABLE_LEN: usize = 32;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;

/// Minimum length for newly provisioned passwords
pub const MIN_PASSWORD_LEN: usize = 8;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    check_len(value, field, max_len)
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), String> {
    match value {
        Some(v) => check_len(v, field, max_len),
        None => Ok(()),
    }
}

fn check_len(value: &str, field: &str, max_len: usize) -> Result<(), String> {
    let len = value.chars().count();
    if len > max_len {
        return Err(format!("{field} is too long ({len} chars, max {max_len})"));
    }
    Ok(())
}

/// Minimal shape check used when provisioning staff accounts
pub fn validate_email(email: &str) -> Result<(), String> {
    validate_required_text(email, "email", MAX_EMAIL_LEN)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(format!("email {email:?} is not a valid address")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("T5", "tableNumber", MAX_TABLE_LEN).is_ok());
        assert_eq!(
            validate_required_text("   ", "tableNumber", MAX_TABLE_LEN),
            Err("tableNumber must not be empty".to_string())
        );
        let long = "x".repeat(MAX_TABLE_LEN + 1);
        assert!(
            validate_required_text(&long, "tableNumber", MAX_TABLE_LEN)
                .unwrap_err()
                .contains("too long")
        );
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        let name = "ë".repeat(MAX_NAME_LEN);
        assert!(validate_required_text(&name, "name", MAX_NAME_LEN).is_ok());
    }

    #[test]
    fn test_optional_text() {
        assert!(validate_optional_text(&None, "note", MAX_NOTE_LEN).is_ok());
        let note = Some("n".repeat(MAX_NOTE_LEN + 1));
        assert!(validate_optional_text(&note, "note", MAX_NOTE_LEN).is_err());
    }

    #[test]
    fn test_email_shape() {
        assert!(validate_email("manager@venue.al").is_ok());
        assert!(validate_email("manager").is_err());
        assert!(validate_email("@venue.al").is_err());
        assert!(validate_email("manager@localhost").is_err());
    }
}
