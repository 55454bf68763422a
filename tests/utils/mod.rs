pub mod match_builders;

// Re-export main utilities for use by test files
pub use match_builders::MatchBuilder;
