// quill-service/src/models/mod.rs
use actix_web::{HttpResponse, ResponseError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod document;
pub use document::*;

pub mod team;
pub use team::*;

// User models
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UserName {
    pub first_name: String,
    #[serde(default)]
    pub middle_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub name: UserName,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    /// Denormalized back-reference: ids of every team this user belongs to.
    #[serde(default)]
    pub teams: Vec<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Projection safe to hand to other users: no credential hash, no team-set.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            username: self.username.clone(),
            name: self.name.clone(),
            avatar: self.avatar.clone(),
        }
    }

    /// Full profile for the user themselves, minus the credential hash.
    pub fn profile(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "username": self.username,
            "email": self.email,
            "name": self.name,
            "avatar": self.avatar,
            "bio": self.bio,
            "teams": self.teams,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub name: UserName,
    pub avatar: Option<String>,
}

/// The authenticated identity a request acts as: the user id plus the
/// user's current team-set. Built from the stored User record on every
/// request, never cached across requests.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: String,
    pub teams: Vec<String>,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Actor {
            user_id: user.id.clone(),
            teams: user.teams.clone(),
        }
    }
}

// Request/response payloads for the user routes
#[derive(Serialize, Deserialize, Debug)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: String,
    pub username: String,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
}

// JWT claims structure for authentication
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub username: String,
    pub exp: usize, // Expiration time
    pub iat: usize, // Issued at
}

// Custom error types
//
// One variant per error class the API surfaces; handlers return
// Result<HttpResponse, ServiceError> and let ResponseError do the mapping.
#[derive(Debug, PartialEq)]
pub enum ServiceError {
    /// Request rejected before touching storage (missing field, bad role, ...).
    Validation(String),
    /// No or invalid token.
    Unauthorized,
    /// Resolved role below the operation's minimum, or no access at all.
    /// Deliberately carries no detail about the resource's access entries.
    Denied,
    NotFound(String),
    /// Duplicate grant / duplicate membership / attempt to strip the owner.
    Conflict(String),
    /// Persistence collaborator failure. Never retried here.
    Internal,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ServiceError::Validation(msg) => write!(f, "Validation: {}", msg),
            ServiceError::Unauthorized => write!(f, "Unauthorized"),
            ServiceError::Denied => write!(f, "Access denied"),
            ServiceError::NotFound(what) => write!(f, "Not found: {}", what),
            ServiceError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ServiceError::Internal => write!(f, "Internal server error"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl ResponseError for ServiceError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ServiceError::Validation(ref msg) => HttpResponse::BadRequest().json(msg),
            ServiceError::Unauthorized => HttpResponse::Unauthorized().json("Unauthorized"),
            ServiceError::Denied => HttpResponse::Forbidden().json("Access denied."),
            ServiceError::NotFound(ref what) => {
                HttpResponse::NotFound().json(format!("{} not found.", what))
            }
            ServiceError::Conflict(ref msg) => HttpResponse::Conflict().json(msg),
            ServiceError::Internal => {
                HttpResponse::InternalServerError().json("Server error. Please try again later.")
            }
        }
    }
}
