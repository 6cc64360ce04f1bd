//! Common utilities used by other smet crates.
//!
//! This is an internal crate which contains the integer-sequence algebra used
//! to renumber axes, plus small helpers that don't have a more dedicated home.

pub mod bit_set;
pub mod int_seq;
pub mod iter;
pub mod num;
