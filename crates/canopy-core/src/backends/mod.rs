//! Site backends.

pub mod memory;
