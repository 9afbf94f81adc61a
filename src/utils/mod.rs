//! Shared helpers: input validation and the worker pool.

pub mod concurrent;
pub mod validation;
