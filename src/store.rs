//! Storage port for proposal lineages and its sled-backed implementation
use crate::error::LineageError;
use crate::proposal::{BarterProposal, ProposalSnapshot};
use sled::Batch;
use std::sync::Arc;

const RECORD_PREFIX: &str = "record/";
const SNAPSHOT_PREFIX: &str = "snap/";
const INDEX_PREFIX: &str = "idx/";

/// Read/write port over the proposal lineage storage. The engine is handed an
/// implementation of this trait; persistence mechanics stay behind it.
pub trait ProposalStore {
    /// Current latest version of a lineage.
    fn load(&self, lineage_root_id: &str) -> Result<BarterProposal, LineageError>;

    /// Persist the latest version of a lineage along with the immutable
    /// snapshots of every superseded version.
    fn save(&self, proposal: &BarterProposal) -> Result<(), LineageError>;

    /// Fetch one archived version snapshot of a lineage.
    fn load_version(
        &self,
        lineage_root_id: &str,
        version: u32,
    ) -> Result<ProposalSnapshot, LineageError>;
}

/// Sled-backed [`ProposalStore`].
///
/// Superseded version snapshots are stored content-addressed: the sha256
/// digest of the snapshot's CBOR encoding is the storage key, with an index
/// row per `(lineage root, version)` pointing at it. The current record and
/// any new snapshots go to disk in a single batch.
pub struct SledProposalStore {
    instance: Arc<sled::Db>,
}

impl SledProposalStore {
    pub fn new(instance: Arc<sled::Db>) -> Self {
        Self { instance }
    }

    fn record_key(lineage_root_id: &str) -> String {
        format!("{RECORD_PREFIX}{lineage_root_id}")
    }

    fn index_key(lineage_root_id: &str, version: u32) -> String {
        format!("{INDEX_PREFIX}{lineage_root_id}/{version:010}")
    }

    fn snapshot_key(hash: &str) -> String {
        format!("{SNAPSHOT_PREFIX}{hash}")
    }
}

impl From<sled::Error> for LineageError {
    fn from(err: sled::Error) -> Self {
        LineageError::Backend(err.to_string())
    }
}

impl ProposalStore for SledProposalStore {
    fn load(&self, lineage_root_id: &str) -> Result<BarterProposal, LineageError> {
        let bytes = self
            .instance
            .get(Self::record_key(lineage_root_id).as_bytes())?
            .ok_or_else(|| LineageError::UnknownLineage(lineage_root_id.to_string()))?;

        minicbor::decode(bytes.as_ref()).map_err(|err| LineageError::Backend(err.to_string()))
    }

    fn save(&self, proposal: &BarterProposal) -> Result<(), LineageError> {
        let record_cbor =
            minicbor::to_vec(proposal).map_err(|err| LineageError::Backend(err.to_string()))?;

        let mut batch = Batch::default();
        batch.insert(
            Self::record_key(&proposal.lineage_root_id).as_bytes(),
            record_cbor,
        );

        // Archived snapshots are immutable; only rows not yet on disk are
        // written.
        for snapshot in &proposal.version_history {
            let index_key = Self::index_key(&proposal.lineage_root_id, snapshot.version);
            if self.instance.get(index_key.as_bytes())?.is_some() {
                continue;
            }
            let snapshot_cbor = minicbor::to_vec(snapshot)
                .map_err(|err| LineageError::Backend(err.to_string()))?;
            let hash = sha256::digest(&snapshot_cbor);

            batch.insert(Self::snapshot_key(&hash).as_bytes(), snapshot_cbor);
            batch.insert(index_key.as_bytes(), hash.as_bytes());
        }

        self.instance.apply_batch(batch)?;
        Ok(())
    }

    fn load_version(
        &self,
        lineage_root_id: &str,
        version: u32,
    ) -> Result<ProposalSnapshot, LineageError> {
        let missing = || LineageError::MissingSnapshot {
            root: lineage_root_id.to_string(),
            version,
        };

        let hash_bytes = self
            .instance
            .get(Self::index_key(lineage_root_id, version).as_bytes())?
            .ok_or_else(missing)?;
        let hash = String::from_utf8(hash_bytes.to_vec())
            .map_err(|err| LineageError::Backend(err.to_string()))?;

        let snapshot_bytes = self
            .instance
            .get(Self::snapshot_key(&hash).as_bytes())?
            .ok_or_else(missing)?;

        minicbor::decode(snapshot_bytes.as_ref())
            .map_err(|err| LineageError::Backend(err.to_string()))
    }
}
