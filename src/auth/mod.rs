//! # Auth Module
//!
//! Account registration and login, access token issuing, and the
//! `AuthedUser` extractor guarding the secret and notification routes.

pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod tokens;


pub use extractors::AuthedUser;
pub use models::{Claims, User};
pub use routes::auth_routes;
pub use services::{UserError, UserService};
