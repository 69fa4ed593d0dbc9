//! Utility and helper functions needed for:
//! - Error handling
//! - Fixed point arithmetic
//! - Reading the current time

pub(crate) mod common;
pub(crate) mod error;
pub(crate) mod math;
