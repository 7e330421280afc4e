//! # keepercli
//!
//! Client side of keeper: envelope encryption, the sync client facade over
//! the server's HTTP and WebSocket API, and the encrypted remote storage
//! adapter the command line front end drives.

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod crypto;
pub mod error;
pub mod storage;

pub use client::{ClientEvent, NotificationStream, SyncClient};
pub use config::ClientConfig;
pub use error::ClientError;
pub use storage::{RemoteStorage, Storage};
