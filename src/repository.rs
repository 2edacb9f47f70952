//! Read access to feature definitions and a thread-safe store for the currently active snapshot.
//!
//! [`FeatureStore`] provides concurrent access for readers (flag evaluation) and writers (e.g., a
//! periodic fetcher living outside this crate). A [`Snapshot`] is immutable and only ever replaced
//! completely, so an evaluation that grabbed a snapshot never observes a partial update.
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use crate::{
    models::{ClientFeatures, FeatureDefinition, Segment, SegmentId},
    Result,
};

/// Lookup of feature definitions and segments. Implementations must be non-blocking.
pub trait Repository {
    /// Return the definition of the named feature, if known.
    fn get_toggle(&self, name: &str) -> Option<&FeatureDefinition>;

    /// Return the segment with the given id, if known.
    fn get_segment(&self, id: SegmentId) -> Option<&Segment>;
}

/// Immutable, indexed set of feature definitions and segments.
#[derive(Debug, Default)]
pub struct Snapshot {
    version: u32,
    features: HashMap<String, FeatureDefinition>,
    segments: HashMap<SegmentId, Segment>,
}

impl Snapshot {
    /// Index the given feature definitions. Later duplicates replace earlier ones.
    pub fn new(features: ClientFeatures) -> Snapshot {
        Snapshot {
            version: features.version,
            features: features
                .features
                .into_iter()
                .map(|feature| (feature.name.clone(), feature))
                .collect(),
            segments: features
                .segments
                .into_iter()
                .map(|segment| (segment.id, segment))
                .collect(),
        }
    }

    /// Parse a feature API response.
    pub fn from_json(json: &str) -> Result<Snapshot> {
        let features: ClientFeatures = serde_json::from_str(json)?;
        Ok(Snapshot::new(features))
    }

    /// Format version of the features payload this snapshot was built from.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Iterate over all feature definitions in no particular order.
    pub fn features(&self) -> impl Iterator<Item = &FeatureDefinition> {
        self.features.values()
    }
}

impl Repository for Snapshot {
    fn get_toggle(&self, name: &str) -> Option<&FeatureDefinition> {
        self.features.get(name)
    }

    fn get_segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(&id)
    }
}

/// `FeatureStore` provides a thread-safe (`Sync`) storage for the active [`Snapshot`] that allows
/// concurrent access for readers and writers.
#[derive(Debug, Default)]
pub struct FeatureStore {
    snapshot: RwLock<Arc<Snapshot>>,
}

impl FeatureStore {
    /// Create a store holding an empty snapshot.
    pub fn new() -> Self {
        FeatureStore::default()
    }

    /// Get the currently active snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        // self.snapshot.read() should always return Ok(). Err() is possible only if the lock is
        // poisoned (writer panicked while holding the lock), which should never happen.
        let snapshot = self
            .snapshot
            .read()
            .expect("thread holding snapshot lock should not panic");

        snapshot.clone()
    }

    /// Publish a new snapshot, returning the previous one.
    pub fn set_snapshot(&self, snapshot: impl Into<Arc<Snapshot>>) -> Arc<Snapshot> {
        // Constructing new value before requesting the lock to minimize lock span.
        let new_value = snapshot.into();

        let mut slot = self
            .snapshot
            .write()
            .expect("thread holding snapshot lock should not panic");

        std::mem::replace(&mut *slot, new_value)
    }
}
