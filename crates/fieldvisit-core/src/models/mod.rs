//! Data models for the application
//!
//! This module contains the data structures that flow through one submission,
//! organized by concern.

mod attachment;
mod roster;
mod visit;

// Re-export all models for convenient imports
pub use attachment::*;
pub use roster::*;
pub use visit::*;
