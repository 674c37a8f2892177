//! Failure kinds returned by every fallible store operation.

use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    // ========== Identity ==========
    #[error("Username already exists.")]
    DuplicateUsername,

    #[error("Email already exists.")]
    DuplicateEmail,

    #[error("Invalid or expired admin invite code.")]
    InvalidInviteCode,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("unauthorized")]
    Unauthenticated,

    #[error("forbidden")]
    Forbidden,

    #[error("user not found")]
    UserNotFound,

    // ========== Tenancy ==========
    #[error("community not found")]
    CommunityNotFound,

    #[error("slug cannot be empty")]
    EmptySlug,

    #[error("community slug already exists")]
    SlugAlreadyExists,

    #[error("user already belongs to this community")]
    MembershipAlreadyExists,

    // ========== Catalog / assessment ==========
    #[error("courseID not found")]
    CourseNotFound,

    #[error("Test not found")]
    TestNotFound,

    #[error("Test is not in the active community")]
    WrongTenant,

    #[error("Answer count does not match question count: expected {expected}, got {got}")]
    AnswerCountMismatch { expected: usize, got: usize },

    #[error("passing score must be between 0 and 100")]
    InvalidPassingScore,

    #[error("invalid test: {0}")]
    InvalidTest(String),

    // ========== Backend ==========
    #[error("credential hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
}
