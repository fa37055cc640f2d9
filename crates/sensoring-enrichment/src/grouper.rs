use sensoring_core::models::{BucketKey, DetectionEvent};
use std::collections::BTreeMap;

/// Detections sharing one weather bucket
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionGroup {
    pub key: BucketKey,

    /// Members in input order, never empty
    pub members: Vec<DetectionEvent>,

    /// Position of each member in the original input
    pub indices: Vec<usize>,
}

impl DetectionGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Partition detections by bucket key.
///
/// Groups come out in ascending key order, members in input order. Every input
/// detection lands in exactly one group.
pub fn group(events: Vec<DetectionEvent>) -> Vec<DetectionGroup> {
    let mut buckets: BTreeMap<BucketKey, DetectionGroup> = BTreeMap::new();

    for (index, event) in events.into_iter().enumerate() {
        let key = event.bucket_key();
        let entry = buckets.entry(key).or_insert_with(|| DetectionGroup {
            key,
            members: Vec::new(),
            indices: Vec::new(),
        });
        entry.members.push(event);
        entry.indices.push(index);
    }

    buckets.into_values().collect()
}
