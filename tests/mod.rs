//! Test suite for moehub
//!
//! This module organizes all tests

#[cfg(feature = "ssr")]
pub mod common;
#[cfg(feature = "ssr")]
pub mod integration;
#[cfg(feature = "ssr")]
pub mod property;
