//! REST adapter for figrep
//!
//! [`FigmaClient`] implements [`libfigrep_core::CommentSource`] over the
//! public HTTP API, authenticating with a personal access token.

pub mod client;
pub mod error;
pub mod wire;

pub use client::{FigmaClient, DEFAULT_TIMEOUT, TOKEN_HEADER};
pub use error::ApiError;
