//! Stage lookups and the parent-rule engine.

pub mod directory;
pub mod rules;

pub use directory::StageDirectory;
pub use rules::{evaluate, ParentDecision};
