#![forbid(unsafe_code)]
//! Hashing, filesystem walking, and coordinate parsing for sbegen.

pub mod coordinate;
pub mod error;
pub mod fs;
pub mod hash;
