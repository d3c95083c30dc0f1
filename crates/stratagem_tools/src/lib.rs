//! # Stratagem Development Tools
//!
//! Command-line tools for content authors:
//! - Content validation
//! - Requirement listings
//! - Headless scenario runs

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod error;
pub mod requirements;
pub mod simulate;
pub mod validate;

pub use error::{Result, ToolError};
