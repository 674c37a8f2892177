use bcrypt::{hash, verify};
use uuid::Uuid;

pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    hash(password, cost)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password, hash)
}

/// Fresh opaque bearer token. Tokens carry no claims and never expire;
/// they stop working only when the owner logs in again.
pub fn issue_token() -> String {
    Uuid::new_v4().to_string()
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
/// The scheme is matched case-insensitively.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let scheme = header_value.get(..7)?;
    if !scheme.eq_ignore_ascii_case("bearer ") {
        return None;
    }
    let token = header_value[7..].trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hashed = hash_password("pass123", 4).expect("hash");
        assert_ne!(hashed, "pass123");
        assert!(verify_password("pass123", &hashed).unwrap());
        assert!(!verify_password("Pass123", &hashed).unwrap());
    }

    #[test]
    fn test_issued_tokens_are_distinct() {
        assert_ne!(issue_token(), issue_token());
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bear"), None);
    }
}
