//! The LeanIMT incremental Merkle tree.

use std::sync::Arc;

use zylith_core::{CoreError, FieldElement, PoseidonHasher};

/// Height of the commitment tree; fixed at construction for every deployment.
pub const TREE_HEIGHT: usize = 20;

/// Errors that can occur when working with the tree.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TreeError {
    /// The tree holds `2^height` leaves already.
    #[error("tree is full at {0} leaves")]
    TreeFull(u64),

    /// No leaf at the requested index.
    #[error("leaf index {index} out of bounds for {len} leaves")]
    LeafOutOfBounds {
        /// The requested index.
        index: u64,
        /// The current number of leaves.
        len: u64,
    },

    /// Hash-layer failure.
    #[error("hash: {0}")]
    Hash(#[from] CoreError),
}

/// A single-leaf authentication path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    /// Index of the proven leaf.
    pub leaf_index: u64,
    /// Sibling values, leaf level first. Zero means "no sibling".
    pub path_elements: Vec<FieldElement>,
    /// Bits of the leaf index, leaf level first.
    pub path_indices: Vec<u8>,
    /// Root the path verifies against.
    pub root: FieldElement,
}

/// Append-only incremental Merkle tree with the LeanIMT zero-propagation
/// rule.
///
/// Every level of the tree is cached, so `insert` rewrites one spine
/// (O(height)) and `root` is O(1).
#[derive(Debug, Clone)]
pub struct LeanImt {
    hasher: Arc<PoseidonHasher>,
    height: usize,
    /// `levels[0]` are the leaves; `levels[height]` holds the root.
    levels: Vec<Vec<FieldElement>>,
}

impl LeanImt {
    /// Create an empty tree of the given height.
    #[must_use]
    pub fn new(hasher: Arc<PoseidonHasher>, height: usize) -> Self {
        let levels = vec![Vec::new(); height.saturating_add(1)];
        Self {
            hasher,
            height,
            levels,
        }
    }

    /// Create an empty tree of the deployment height.
    #[must_use]
    pub fn with_default_height(hasher: Arc<PoseidonHasher>) -> Self {
        Self::new(hasher, TREE_HEIGHT)
    }

    /// Number of leaves inserted so far.
    #[must_use]
    pub fn leaf_count(&self) -> u64 {
        self.levels
            .first()
            .map_or(0, |leaves| u64::try_from(leaves.len()).unwrap_or(u64::MAX))
    }

    /// The leaf stored at `index`.
    ///
    /// # Errors
    /// Returns [`TreeError::LeafOutOfBounds`] past the end of the sequence.
    pub fn leaf(&self, index: u64) -> Result<FieldElement, TreeError> {
        let leaves = self.levels.first().ok_or(TreeError::LeafOutOfBounds {
            index,
            len: 0,
        })?;
        let i = usize::try_from(index).map_err(|_| TreeError::LeafOutOfBounds {
            index,
            len: self.leaf_count(),
        })?;
        leaves.get(i).copied().ok_or(TreeError::LeafOutOfBounds {
            index,
            len: self.leaf_count(),
        })
    }

    /// All leaves in insertion order.
    #[must_use]
    pub fn leaves(&self) -> &[FieldElement] {
        self.levels.first().map_or(&[], Vec::as_slice)
    }

    /// Append a leaf and return its index.
    ///
    /// # Errors
    /// Returns [`TreeError::TreeFull`] at `2^height` leaves and propagates
    /// hash failures.
    pub fn insert(&mut self, leaf: FieldElement) -> Result<u64, TreeError> {
        let capacity = 1u64
            .checked_shl(u32::try_from(self.height).unwrap_or(u32::MAX))
            .unwrap_or(u64::MAX);
        let index = self.leaf_count();
        if index >= capacity {
            return Err(TreeError::TreeFull(index));
        }

        if let Some(leaves) = self.levels.first_mut() {
            leaves.push(leaf);
        }
        self.rebuild_spine(index)?;
        Ok(index)
    }

    /// The current root. Zero for an empty tree.
    #[must_use]
    pub fn root(&self) -> FieldElement {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or(FieldElement::ZERO)
    }

    /// Authentication path for the leaf at `index`.
    ///
    /// Each path element is the sibling at that level under the same
    /// zero-propagation rule: an absent sibling is reported as zero.
    ///
    /// # Errors
    /// Returns [`TreeError::LeafOutOfBounds`] past the end of the sequence.
    pub fn proof(&self, index: u64) -> Result<MerkleProof, TreeError> {
        // Bounds check up front.
        let _ = self.leaf(index)?;

        let mut path_elements = Vec::with_capacity(self.height);
        let mut path_indices = Vec::with_capacity(self.height);
        let mut node = usize::try_from(index).map_err(|_| TreeError::LeafOutOfBounds {
            index,
            len: self.leaf_count(),
        })?;

        for level in 0..self.height {
            let bit = u8::try_from(node & 1).unwrap_or(0);
            let sibling_index = node ^ 1;
            let sibling = self
                .levels
                .get(level)
                .and_then(|nodes| nodes.get(sibling_index))
                .copied()
                .unwrap_or(FieldElement::ZERO);
            path_elements.push(sibling);
            path_indices.push(bit);
            node >>= 1;
        }

        Ok(MerkleProof {
            leaf_index: index,
            path_elements,
            path_indices,
            root: self.root(),
        })
    }

    /// Recompute a root from a leaf and a path and compare with the proof's
    /// root.
    ///
    /// A zero sibling skips hashing, exactly as the circuit does.
    ///
    /// # Errors
    /// Propagates hash failures.
    pub fn verify(&self, leaf: FieldElement, proof: &MerkleProof) -> Result<bool, TreeError> {
        let mut current = leaf;
        for (sibling, bit) in proof.path_elements.iter().zip(&proof.path_indices) {
            current = if *bit == 0 {
                self.combine(current, *sibling)?
            } else {
                self.combine(*sibling, current)?
            };
        }
        Ok(current == proof.root)
    }

    /// LeanIMT node rule: zero siblings propagate the other child.
    fn combine(
        &self,
        left: FieldElement,
        right: FieldElement,
    ) -> Result<FieldElement, TreeError> {
        if right.is_zero() {
            Ok(left)
        } else if left.is_zero() {
            Ok(right)
        } else {
            Ok(self.hasher.hash(&[left, right])?)
        }
    }

    /// Recompute the ancestors of the leaf at `index` after an append.
    fn rebuild_spine(&mut self, index: u64) -> Result<(), TreeError> {
        let mut node = usize::try_from(index).map_err(|_| TreeError::TreeFull(index))?;

        for level in 0..self.height {
            let parent = node >> 1;
            let left_index = parent << 1;
            let right_index = left_index | 1;

            let (left, right) = {
                let nodes = self.levels.get(level).map_or(&[][..], Vec::as_slice);
                (
                    nodes.get(left_index).copied().unwrap_or(FieldElement::ZERO),
                    nodes.get(right_index).copied().unwrap_or(FieldElement::ZERO),
                )
            };
            let value = self.combine(left, right)?;

            if let Some(parents) = self.levels.get_mut(level.saturating_add(1)) {
                if parent < parents.len() {
                    if let Some(slot) = parents.get_mut(parent) {
                        *slot = value;
                    }
                } else {
                    parents.push(value);
                }
            }
            node = parent;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Tests")]

    use super::*;

    fn tree() -> LeanImt {
        let hasher = Arc::new(PoseidonHasher::new().unwrap());
        LeanImt::with_default_height(hasher)
    }

    fn fe(s: &str) -> FieldElement {
        FieldElement::from_decimal(s).unwrap()
    }

    mod propagation {
        use super::*;

        #[test]
        fn empty_root_is_zero() {
            assert_eq!(tree().root(), FieldElement::ZERO);
        }

        #[test]
        fn single_leaf_root_is_the_leaf() {
            let mut t = tree();
            let index = t.insert(fe("12345")).unwrap();
            assert_eq!(index, 0);
            assert_eq!(t.root(), fe("12345"));
        }

        #[test]
        fn two_leaf_root_is_their_hash() {
            let mut t = tree();
            t.insert(fe("111")).unwrap();
            t.insert(fe("222")).unwrap();

            let hasher = PoseidonHasher::new().unwrap();
            let expected = hasher.hash(&[fe("111"), fe("222")]).unwrap();
            assert_eq!(t.root(), expected);
        }

        #[test]
        fn three_leaves_pair_then_propagate() {
            let mut t = tree();
            t.insert(fe("1")).unwrap();
            t.insert(fe("2")).unwrap();
            t.insert(fe("3")).unwrap();

            let hasher = PoseidonHasher::new().unwrap();
            let left = hasher.hash(&[fe("1"), fe("2")]).unwrap();
            // Leaf 3 has no sibling, so it propagates to level 1 unchanged.
            let expected = hasher.hash(&[left, fe("3")]).unwrap();
            assert_eq!(t.root(), expected);
        }
    }

    mod proofs {
        use super::*;

        #[test]
        fn single_leaf_proof_is_all_zeros() {
            let mut t = tree();
            t.insert(fe("12345")).unwrap();

            let proof = t.proof(0).unwrap();
            assert_eq!(proof.path_elements.len(), TREE_HEIGHT);
            assert_eq!(proof.path_indices.len(), TREE_HEIGHT);
            assert!(proof.path_elements.iter().all(FieldElement::is_zero));
            assert!(proof.path_indices.iter().all(|bit| *bit == 0));
            assert_eq!(proof.root, fe("12345"));
            assert!(t.verify(fe("12345"), &proof).unwrap());
        }

        #[test]
        fn second_leaf_sees_first_as_sibling() {
            let mut t = tree();
            t.insert(fe("111")).unwrap();
            t.insert(fe("222")).unwrap();

            let proof = t.proof(1).unwrap();
            assert_eq!(proof.path_elements.first().copied().unwrap(), fe("111"));
            assert_eq!(proof.path_indices.first().copied().unwrap(), 1);
            assert!(t.verify(fe("222"), &proof).unwrap());
        }

        #[test]
        fn every_leaf_verifies_as_the_tree_grows() {
            let mut t = tree();
            for i in 1..=8u64 {
                t.insert(FieldElement::from_u64(i)).unwrap();
            }
            for i in 0..8u64 {
                let proof = t.proof(i).unwrap();
                let leaf = t.leaf(i).unwrap();
                assert!(t.verify(leaf, &proof).unwrap(), "leaf {i}");
            }
        }

        #[test]
        fn wrong_leaf_fails_verification() {
            let mut t = tree();
            t.insert(fe("111")).unwrap();
            t.insert(fe("222")).unwrap();

            let proof = t.proof(1).unwrap();
            assert!(!t.verify(fe("999"), &proof).unwrap());
        }

        #[test]
        fn missing_leaf_is_an_error() {
            let t = tree();
            assert_eq!(
                t.proof(0),
                Err(TreeError::LeafOutOfBounds { index: 0, len: 0 })
            );
        }
    }

    mod capacity {
        use super::*;

        #[test]
        fn indices_are_dense_and_monotonic() {
            let mut t = tree();
            for i in 0..20u64 {
                assert_eq!(t.insert(FieldElement::from_u64(i.saturating_add(1))).unwrap(), i);
            }
            assert_eq!(t.leaf_count(), 20);
        }

        #[test]
        fn small_tree_fills_up() {
            let hasher = Arc::new(PoseidonHasher::new().unwrap());
            let mut t = LeanImt::new(hasher, 2);
            for i in 1..=4u64 {
                t.insert(FieldElement::from_u64(i)).unwrap();
            }
            assert_eq!(
                t.insert(FieldElement::from_u64(5)),
                Err(TreeError::TreeFull(4))
            );
        }
    }
}
