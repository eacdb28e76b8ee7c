//! Agent selection: outcomes, classifier prompt and output parsing.

pub mod entities;
pub mod parsing;
pub mod prompt;
