//! Offline agent classifiers.

mod keyword;

pub use keyword::KeywordClassifier;
