use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, error};

/// Platform roles
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl FromStr for Role {
    type Err = SessionError;

    fn from_str(role: &str) -> Result<Self, Self::Err> {
        match role.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            _ => Err(SessionError::UnknownRole(role.to_string())),
        }
    }
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }

    /// Teachers and admins author notifications and see a "sent" list
    pub fn can_send_notifications(&self) -> bool {
        matches!(self, Role::Admin | Role::Teacher)
    }
}

/// Claims carried by the platform's access token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // Subject (user ID)
    pub role: String, // Role name, any case
    pub exp: usize,   // Expiration time
    #[serde(default)]
    pub iat: Option<usize>, // Issued at
}

/// The currently authenticated user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: i64,
    pub role: Role,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Build a session from a bearer token issued by the platform.
    ///
    /// Expiry is enforced here; the signature is not, since only the server
    /// holds the signing secret and it re-verifies every request.
    pub fn from_token(token: &str) -> Result<Self, SessionError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(SessionError::MissingToken);
        }

        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = true;
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|e| {
                error!("Access token rejected: {}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::Expired,
                    _ => SessionError::InvalidToken,
                }
            })?;

        let claims = token_data.claims;
        let user_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| SessionError::InvalidSubject(claims.sub.clone()))?;
        let role = claims.role.parse::<Role>()?;
        let expires_at = Utc
            .timestamp_opt(claims.exp as i64, 0)
            .single()
            .ok_or(SessionError::InvalidToken)?;

        debug!("Session decoded for user {} ({})", user_id, role.as_str());

        Ok(Session {
            user_id,
            role,
            token: token.to_string(),
            expires_at,
        })
    }

    /// Same person in the same role; token rotation alone is not a new identity.
    pub fn same_identity(&self, other: &Session) -> bool {
        self.user_id == other.user_id && self.role == other.role
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum SessionError {
    MissingToken,
    InvalidToken,
    Expired,
    InvalidSubject(String),
    UnknownRole(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::MissingToken => write!(f, "Access token is missing"),
            SessionError::InvalidToken => write!(f, "Access token is malformed"),
            SessionError::Expired => write!(f, "Access token has expired"),
            SessionError::InvalidSubject(sub) => write!(f, "Invalid user identifier: {}", sub),
            SessionError::UnknownRole(role) => write!(f, "Invalid role: {}", role),
        }
    }
}

impl std::error::Error for SessionError {}
