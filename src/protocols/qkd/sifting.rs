//! Sifted key material shared by all three protocols.

use serde::Serialize;

/// Alice's and Bob's sifted keys together with the raw indices they came from.
///
/// The three vectors always have the same length, and `indices` is
/// strictly increasing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SiftedKeyPair {
    pub indices: Vec<usize>,
    pub alice: Vec<bool>,
    pub bob: Vec<bool>,
}

impl SiftedKeyPair {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            indices: Vec::with_capacity(capacity),
            alice: Vec::with_capacity(capacity),
            bob: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, index: usize, alice: bool, bob: bool) {
        debug_assert!(self.indices.last().is_none_or(|&last| last < index));
        self.indices.push(index);
        self.alice.push(alice);
        self.bob.push(bob);
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of positions where the two keys disagree.
    pub fn errors(&self) -> usize {
        self.alice
            .iter()
            .zip(&self.bob)
            .filter(|(a, b)| a != b)
            .count()
    }

    pub fn keys_match(&self) -> bool {
        self.alice == self.bob
    }

    /// Copy of the pair with Bob's bit flipped wherever `flip` says so.
    pub fn corrected(&self, mut flip: impl FnMut(usize) -> bool) -> Self {
        let bob = self
            .indices
            .iter()
            .zip(&self.bob)
            .map(|(&i, &b)| b ^ flip(i))
            .collect();
        Self {
            indices: self.indices.clone(),
            alice: self.alice.clone(),
            bob,
        }
    }
}

/// Keeps the positions where the bases agree and `kept(i)` holds.
pub fn sift_by_basis<B: PartialEq>(
    alice_bases: &[B],
    bob_bases: &[B],
    alice_bits: &[bool],
    bob_bits: &[bool],
    mut kept: impl FnMut(usize) -> bool,
) -> SiftedKeyPair {
    let mut key = SiftedKeyPair::with_capacity(alice_bases.len() / 2);
    for (i, (a_basis, b_basis)) in alice_bases.iter().zip(bob_bases).enumerate() {
        if a_basis == b_basis && kept(i) {
            key.push(i, alice_bits[i], bob_bits[i]);
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complementary_bases_sift_to_nothing() {
        let alice = [false, true, false, true];
        let bob: Vec<bool> = alice.iter().map(|b| !b).collect();
        let bits = [true, false, true, true];
        let key = sift_by_basis(&alice, &bob, &bits, &bits, |_| true);
        assert!(key.is_empty());
        assert_eq!(key.errors(), 0);
    }

    #[test]
    fn sifting_keeps_matching_indices_in_order() {
        let alice = [0u8, 1, 2, 1, 0];
        let bob = [0u8, 2, 2, 1, 1];
        let a_bits = [true, false, true, false, true];
        let b_bits = [true, true, false, false, false];
        let key = sift_by_basis(&alice, &bob, &a_bits, &b_bits, |_| true);
        assert_eq!(key.indices, vec![0, 2, 3]);
        assert_eq!(key.alice, vec![true, true, false]);
        assert_eq!(key.bob, vec![true, false, false]);
        assert_eq!(key.errors(), 1);
        assert!(!key.keys_match());
    }

    #[test]
    fn predicate_filters_lost_events() {
        let bases = [true, true, true];
        let bits = [false, true, false];
        let key = sift_by_basis(&bases, &bases, &bits, &bits, |i| i != 1);
        assert_eq!(key.indices, vec![0, 2]);
    }

    #[test]
    fn correction_flips_selected_positions() {
        let mut key = SiftedKeyPair::default();
        key.push(0, false, true);
        key.push(4, true, false);
        key.push(7, true, true);
        let fixed = key.corrected(|i| i != 7);
        assert_eq!(fixed.bob, vec![false, true, true]);
        assert!(fixed.keys_match());
        assert_eq!(fixed.indices, key.indices);
    }
}
