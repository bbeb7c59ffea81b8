//! Property-based tests

pub mod registry_proptest;
