//! Crate-level tests for pgguard-syntax.
