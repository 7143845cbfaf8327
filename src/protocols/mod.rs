//! Quantum Cryptography Protocols.
//!
//! This module contains implementations of quantum key distribution protocols.

pub mod qkd;
pub use qkd::{b92, bb84, e91};
