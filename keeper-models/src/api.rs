use serde::{Deserialize, Serialize};

/// Body of `POST /api/users/register` and `POST /api/users/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
}

/// Returned by `POST /api/secrets`; carries the id of the created or updated secret
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SaveSecretResponse {
    pub id: i64,
}

/// JSON error body produced by the server for every failed call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}
