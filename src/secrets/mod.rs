//! # Secrets Module
//!
//! Per-user storage of encrypted secrets. The server never sees plaintext:
//! `payload` arrives and leaves as ciphertext produced by the client.
//!
//! Layers:
//! - `repository` - SQL access scoped by id and owner
//! - `services` - domain errors on top of the repository
//! - `handlers` / `routes` - HTTP surface, create-vs-update routing and
//!   notification fan-out after a save

pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;


pub use models::{NewSecret, SecretRecord};
pub use repository::SecretRepository;
pub use routes::secrets_routes;
pub use services::{SecretError, SecretService};
