//! Core definitions shared by all arrayscope-* crates: the error taxonomy
//! and the `Result` alias used by fallible buffer operations.

pub mod error;
pub mod result;

pub use result::Result;
