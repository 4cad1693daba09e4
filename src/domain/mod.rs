//! Domain layer for ycm-flags
//!
//! Architecture: Domain Model - Flag lists, compilation info and the host response
//! - Independent of how databases or override files are found on disk
//! - Error types shared by every layer live here

pub mod flags;

// Re-export main domain types for convenience
pub use flags::*;
