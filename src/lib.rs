//! Property-listing backend: user registration/login and CRUD over property listings with
//! image/video attachments, stored in SQLite.

pub mod api;
pub mod attachments;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
