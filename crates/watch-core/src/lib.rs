//! Core types for roomwatch.
//!
//! Holds the message and notification models, the account configuration
//! loader, CLI settings, and the two pure stages of the per-room pipeline:
//! the [`filter`] engine and the [`sanitize`] text transform.

pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod sanitize;
pub mod settings;

pub use error::{Result, WatchError};
