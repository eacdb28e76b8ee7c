//! Novelty for recurring jobs: batch pre-generation, sequential delivery,
//! and similarity-based anti-repetition directives.

pub mod batch;
pub mod directive;
pub mod parsing;
pub mod policy;
