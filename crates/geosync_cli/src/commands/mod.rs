//! CLI command implementations.

pub mod demo;
pub mod edits;
pub mod inspect;
