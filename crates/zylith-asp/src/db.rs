//! Sled-backed ledger persistence.
//!
//! Four trees: `commitments` (big-endian leaf index → record) is the
//! append-ordered replay log; `nullifiers` (decimal hash → record) is the
//! one-way consumed set; `roots` (big-endian sequence → record) mirrors the
//! root history; `meta` holds sync bookkeeping. Recovery replays
//! `commitments` in key order; sled snapshots itself.

use std::path::Path;

use serde::{Deserialize, Serialize};
use zylith_core::{CircuitKind, FieldElement};

use crate::error::AspError;

/// Ledger record for one confirmed commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentRecord {
    /// The commitment (decimal).
    pub commitment: String,
    /// Transaction that confirmed it, when known.
    pub tx_hash: Option<String>,
}

/// Record of a consumed nullifier hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NullifierRecord {
    /// Circuit that consumed it.
    pub circuit_type: String,
    /// Transaction that consumed it.
    pub tx_hash: Option<String>,
}

/// Record of one published root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootRecord {
    /// The root (`0x`-hex).
    pub root: String,
    /// Leaf count at that root.
    pub leaf_count: u64,
    /// Submission transaction, when known.
    pub tx_hash: Option<String>,
}

/// Handle over the sled trees.
#[derive(Debug, Clone)]
pub struct AspDb {
    commitments: sled::Tree,
    nullifiers: sled::Tree,
    roots: sled::Tree,
    meta: sled::Tree,
}

const META_LAST_SYNCED_BLOCK: &[u8] = b"last_synced_block";
const META_ROOT_SEQ: &[u8] = b"root_seq";

impl AspDb {
    /// Open (or create) the ledger at `path`.
    ///
    /// # Errors
    /// Propagates sled failures.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AspError> {
        let db = sled::open(path)?;
        Self::from_sled(&db)
    }

    /// An ephemeral ledger for tests.
    ///
    /// # Errors
    /// Propagates sled failures.
    pub fn temporary() -> Result<Self, AspError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_sled(&db)
    }

    fn from_sled(db: &sled::Db) -> Result<Self, AspError> {
        Ok(Self {
            commitments: db.open_tree("commitments")?,
            nullifiers: db.open_tree("nullifiers")?,
            roots: db.open_tree("roots")?,
            meta: db.open_tree("meta")?,
        })
    }

    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, AspError> {
        serde_json::to_vec(value).map_err(|e| AspError::Internal(format!("ledger encode: {e}")))
    }

    fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, AspError> {
        serde_json::from_slice(bytes)
            .map_err(|e| AspError::Internal(format!("ledger decode: {e}")))
    }

    /// Append one confirmed commitment at `leaf_index`.
    ///
    /// # Errors
    /// Propagates sled failures.
    pub fn insert_commitment(
        &self,
        leaf_index: u64,
        commitment: &FieldElement,
        tx_hash: Option<&str>,
    ) -> Result<(), AspError> {
        let record = CommitmentRecord {
            commitment: commitment.to_decimal(),
            tx_hash: tx_hash.map(str::to_owned),
        };
        self.commitments
            .insert(leaf_index.to_be_bytes(), Self::encode(&record)?)?;
        Ok(())
    }

    /// Replay all confirmed commitments in leaf order.
    ///
    /// # Errors
    /// Propagates sled and decode failures; fails on a gap in the sequence.
    pub fn commitments_in_order(&self) -> Result<Vec<FieldElement>, AspError> {
        let mut out = Vec::new();
        for (position, entry) in self.commitments.iter().enumerate() {
            let (key, value) = entry?;
            let index = u64::from_be_bytes(
                key.as_ref()
                    .try_into()
                    .map_err(|_| AspError::Internal("ledger key width".into()))?,
            );
            if index != u64::try_from(position).unwrap_or(u64::MAX) {
                return Err(AspError::Internal(format!(
                    "ledger gap: expected index {position}, found {index}"
                )));
            }
            let record: CommitmentRecord = Self::decode(&value)?;
            let fe = FieldElement::from_decimal(&record.commitment)
                .map_err(|e| AspError::Internal(format!("ledger value: {e}")))?;
            out.push(fe);
        }
        Ok(out)
    }

    /// Record a nullifier hash as consumed. One-way: a second insert is a
    /// no-op that keeps the first record.
    ///
    /// # Errors
    /// Propagates sled failures.
    pub fn insert_nullifier(
        &self,
        nullifier_hash: &FieldElement,
        circuit: CircuitKind,
        tx_hash: Option<&str>,
    ) -> Result<(), AspError> {
        let key = nullifier_hash.to_decimal();
        if self.nullifiers.contains_key(key.as_bytes())? {
            return Ok(());
        }
        let record = NullifierRecord {
            circuit_type: circuit.as_str().to_owned(),
            tx_hash: tx_hash.map(str::to_owned),
        };
        self.nullifiers
            .insert(key.as_bytes(), Self::encode(&record)?)?;
        Ok(())
    }

    /// Look up a consumed nullifier.
    ///
    /// # Errors
    /// Propagates sled and decode failures.
    pub fn nullifier_record(
        &self,
        nullifier_hash: &FieldElement,
    ) -> Result<Option<NullifierRecord>, AspError> {
        let key = nullifier_hash.to_decimal();
        match self.nullifiers.get(key.as_bytes())? {
            Some(value) => Ok(Some(Self::decode(&value)?)),
            None => Ok(None),
        }
    }

    /// All consumed nullifier hashes (startup load).
    ///
    /// # Errors
    /// Propagates sled failures.
    pub fn nullifier_hashes(&self) -> Result<Vec<FieldElement>, AspError> {
        let mut out = Vec::new();
        for entry in self.nullifiers.iter() {
            let (key, _) = entry?;
            let text = std::str::from_utf8(&key)
                .map_err(|_| AspError::Internal("nullifier key utf8".into()))?;
            out.push(
                FieldElement::from_decimal(text)
                    .map_err(|e| AspError::Internal(format!("nullifier key: {e}")))?,
            );
        }
        Ok(out)
    }

    /// Append a published root.
    ///
    /// # Errors
    /// Propagates sled failures.
    pub fn insert_root(
        &self,
        root: &FieldElement,
        leaf_count: u64,
        tx_hash: Option<&str>,
    ) -> Result<(), AspError> {
        let seq = match self.meta.get(META_ROOT_SEQ)? {
            Some(bytes) => u64::from_be_bytes(
                bytes
                    .as_ref()
                    .try_into()
                    .map_err(|_| AspError::Internal("root seq width".into()))?,
            ),
            None => 0,
        };
        let record = RootRecord {
            root: root.to_hex(),
            leaf_count,
            tx_hash: tx_hash.map(str::to_owned),
        };
        self.roots.insert(seq.to_be_bytes(), Self::encode(&record)?)?;
        self.meta
            .insert(META_ROOT_SEQ, &seq.saturating_add(1).to_be_bytes())?;
        Ok(())
    }

    /// All recorded roots in publication order (startup load).
    ///
    /// # Errors
    /// Propagates sled and decode failures.
    pub fn roots_in_order(&self) -> Result<Vec<RootRecord>, AspError> {
        let mut out = Vec::new();
        for entry in self.roots.iter() {
            let (_, value) = entry?;
            out.push(Self::decode(&value)?);
        }
        Ok(out)
    }

    /// Persist the last chain block the sync task has observed.
    ///
    /// # Errors
    /// Propagates sled failures.
    pub fn set_last_synced_block(&self, block: u64) -> Result<(), AspError> {
        self.meta
            .insert(META_LAST_SYNCED_BLOCK, &block.to_be_bytes())?;
        Ok(())
    }

    /// Last chain block the sync task has observed.
    ///
    /// # Errors
    /// Propagates sled failures.
    pub fn last_synced_block(&self) -> Result<u64, AspError> {
        match self.meta.get(META_LAST_SYNCED_BLOCK)? {
            Some(bytes) => Ok(u64::from_be_bytes(
                bytes
                    .as_ref()
                    .try_into()
                    .map_err(|_| AspError::Internal("meta value width".into()))?,
            )),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Tests")]

    use super::*;

    fn fe(v: u64) -> FieldElement {
        FieldElement::from_u64(v)
    }

    #[test]
    fn commitments_replay_in_leaf_order() {
        let db = AspDb::temporary().unwrap();
        db.insert_commitment(0, &fe(10), Some("0xa")).unwrap();
        db.insert_commitment(1, &fe(20), None).unwrap();
        db.insert_commitment(2, &fe(30), Some("0xb")).unwrap();
        assert_eq!(db.commitments_in_order().unwrap(), vec![fe(10), fe(20), fe(30)]);
    }

    #[test]
    fn gap_in_ledger_is_detected() {
        let db = AspDb::temporary().unwrap();
        db.insert_commitment(0, &fe(10), None).unwrap();
        db.insert_commitment(2, &fe(30), None).unwrap();
        assert!(db.commitments_in_order().is_err());
    }

    #[test]
    fn nullifier_insert_is_one_way() {
        let db = AspDb::temporary().unwrap();
        db.insert_nullifier(&fe(7), CircuitKind::Swap, Some("0x1"))
            .unwrap();
        db.insert_nullifier(&fe(7), CircuitKind::Burn, Some("0x2"))
            .unwrap();
        let record = db.nullifier_record(&fe(7)).unwrap().unwrap();
        assert_eq!(record.circuit_type, "swap");
        assert_eq!(record.tx_hash.as_deref(), Some("0x1"));
        assert!(db.nullifier_record(&fe(8)).unwrap().is_none());
    }

    #[test]
    fn roots_sequence_and_meta_round_trip() {
        let db = AspDb::temporary().unwrap();
        db.insert_root(&fe(1), 1, None).unwrap();
        db.insert_root(&fe(2), 2, Some("0xr")).unwrap();
        let roots = db.roots_in_order().unwrap();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots.get(1).unwrap().leaf_count, 2);

        assert_eq!(db.last_synced_block().unwrap(), 0);
        db.set_last_synced_block(42).unwrap();
        assert_eq!(db.last_synced_block().unwrap(), 42);
    }
}
