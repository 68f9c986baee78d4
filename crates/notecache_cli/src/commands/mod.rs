//! CLI command implementations.

pub mod content;
pub mod inspect;
pub mod notebooks;
pub mod notes;
pub mod sync;
