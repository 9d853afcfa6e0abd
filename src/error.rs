use thiserror::Error;

/// Column that carries a uniqueness constraint in the credential store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

impl UniqueField {
    pub fn as_str(&self) -> &'static str {
        match self {
            UniqueField::Username => "username",
            UniqueField::Email => "email",
        }
    }
}

/// Errors raised by the credential and review stores.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("Duplicate {}", .0.as_str())]
    Duplicate(UniqueField),

    /// The store could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// The store rejected or failed a query
    #[error("Query error: {0}")]
    Query(String),

    /// A stored row could not be mapped to a domain record
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Errors raised by the image host.
#[derive(Debug, Clone, Error)]
pub enum ImageHostError {
    /// Network or connection failure talking to the host
    #[error("Connection error: {0}")]
    Connection(String),

    /// The host answered with an error status
    #[error("Image host rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The host answered with a body we could not understand
    #[error("Invalid image host response: {0}")]
    InvalidResponse(String),

    /// The referenced asset does not exist
    #[error("Image not found: {0}")]
    NotFound(String),
}

/// Errors raised when issuing or verifying bearer tokens.
#[derive(Debug, Clone, Error)]
pub enum TokenError {
    /// Signature, structure or claims are invalid
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// The token's expiry is in the past
    #[error("Token expired")]
    Expired,

    /// The token could not be signed
    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// Errors raised by password hashing.
#[derive(Debug, Clone, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    Hash(String),

    /// Stored hash is not a valid PHC string
    #[error("Invalid password hash: {0}")]
    MalformedHash(String),
}

/// Request-level error taxonomy, mapped onto HTTP statuses by the server layer.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Missing or malformed input (400)
    #[error("{0}")]
    Validation(String),

    /// Request body exceeds the configured limit (413)
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Uniqueness violation on registration (400)
    #[error("{0}")]
    Conflict(String),

    /// Unknown email or wrong password on login (400)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No usable bearer token on a protected route (401)
    #[error("Token is not valid")]
    Unauthenticated,

    /// Bearer token failed verification or names no user (401)
    #[error("Token is not valid")]
    InvalidToken,

    /// Requested resource does not exist (404)
    #[error("{0}")]
    NotFound(String),

    /// Caller does not own the resource (401)
    #[error("Unauthorized")]
    Unauthorized,

    /// An external service failed (502)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Anything unexpected (500)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(UniqueField::Username) => {
                ApiError::Conflict("Username already exists, please login instead".to_string())
            }
            StoreError::Duplicate(UniqueField::Email) => ApiError::Conflict(
                "User with this email already exists, please login instead".to_string(),
            ),
            StoreError::Connection(msg) => ApiError::Upstream(format!("Store unavailable: {}", msg)),
            StoreError::Query(_) | StoreError::Corrupt(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<ImageHostError> for ApiError {
    fn from(err: ImageHostError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
