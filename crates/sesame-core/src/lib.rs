//! Core abstractions for Sesame: the session backend contract, the cipher
//! contract and JSON argument screening.
//! This crate is intentionally small to keep dependency surface minimal.

pub mod cipher;
pub mod json;
pub mod session;

pub use json::{is_valid_json, TextArg};
