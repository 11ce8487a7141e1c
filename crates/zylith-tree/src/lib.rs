//! LeanIMT incremental Merkle tree and root history.
//!
//! The tree follows the LeanIMT node rule: a node whose sibling is the field
//! zero propagates the non-zero child unchanged, so a tree with a single leaf
//! has root equal to that leaf. This rule is load-bearing for circuit
//! compatibility; this is not a conventional sparse Merkle tree and must not
//! be replaced by one.

/// Ring of recently confirmed roots.
pub mod history;
/// The incremental tree.
pub mod leanimt;

pub use history::RootHistory;
pub use leanimt::{LeanImt, MerkleProof, TreeError, TREE_HEIGHT};
