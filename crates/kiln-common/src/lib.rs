//! # kiln-common
//!
//! Shared types for the Kiln image build tool.
//!
//! Currently this is the error taxonomy used across the workspace.

#![warn(missing_docs)]

pub mod error;

pub use error::{KilnError, KilnResult};
