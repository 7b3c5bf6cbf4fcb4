//! Core types and utilities for reelchat
//!
//! This crate provides configuration loading, logging setup, the shared
//! error type and the in-memory conversation history store used by the
//! other reelchat components.

pub mod config;
pub mod error;
pub mod logging;
pub mod session;

pub use error::{Error, Result};
