//! Quantum Key Distribution (QKD) Protocols.
//!
//! This module contains simulators for three QKD protocols:
//! - **BB84**: The first quantum key distribution protocol.
//! - **B92**: A simplified version of BB84 using only two non-orthogonal states.
//! - **E91**: Ekert's entanglement-based protocol with a CHSH Bell test.

pub mod b92;
pub mod bb84;
pub mod e91;
pub mod sifting;
