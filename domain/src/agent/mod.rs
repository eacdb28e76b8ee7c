//! Agent catalog value objects.

pub mod descriptor;
pub mod validation;
