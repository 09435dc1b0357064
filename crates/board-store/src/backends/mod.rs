//! Document store backend implementations

pub mod json_file;

pub use json_file::*;
