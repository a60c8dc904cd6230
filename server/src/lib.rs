//! HTTP API and email notifier for the swimdesk platform.
//!
//! The server is a thin layer over `swimdesk-postgres`: handlers extract the
//! caller's portal session, translate the request into a store call, and map
//! store errors onto HTTP responses. Email leaves the system through the
//! notification outbox drained by [`notifier`].

#![forbid(unsafe_code)]

pub mod api;
pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod notifier;
pub mod server;

pub use config::Config;
pub use error::AppError;
pub use server::{AppState, build_router};
