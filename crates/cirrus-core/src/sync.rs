// ── Instance-state synchronizer ──
//
// One poll = one full `describe_instances` fetch, flattened into
// ordered `InstanceRecord`s, plus a status-check call per running
// instance. The new snapshot is classified against the previous one
// so the presentation layer knows whether an in-place row update is
// safe or the table must be rebuilt.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::debug;

use cirrus_api::ComputeClient;

use crate::error::RemoteError;
use crate::model::{
    InstanceRecord, PollDelta, STATUS_CHECKS_PASSED, STATUS_INITIALIZING,
};

/// Cached snapshot of the remote instance set.
///
/// Reads are cheap `Arc` loads; the snapshot is replaced wholesale by
/// `poll` and never patched field-by-field. On poll failure the
/// previous snapshot remains authoritative.
pub struct InstanceStore {
    snapshot: ArcSwap<Vec<InstanceRecord>>,
}

impl InstanceStore {
    pub(crate) fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// The current snapshot, in the gateway's response order.
    pub fn snapshot(&self) -> Arc<Vec<InstanceRecord>> {
        self.snapshot.load_full()
    }

    pub(crate) fn clear(&self) {
        self.snapshot.store(Arc::new(Vec::new()));
    }

    /// Install an initial snapshot without classification (connect-time
    /// seed from the liveness probe).
    pub(crate) fn seed(&self, records: Vec<InstanceRecord>) {
        self.snapshot.store(Arc::new(records));
    }

    /// Poll the session's own client and replace the cached snapshot.
    ///
    /// Transport failure leaves the cache untouched and returns the
    /// error for the caller to log or surface.
    pub async fn poll(&self, client: &ComputeClient) -> Result<PollDelta, RemoteError> {
        let new = fetch_records(client).await?;
        let old = self.snapshot.load_full();
        let delta = classify(&old, &new);
        debug!(instances = new.len(), ?delta, "poll complete");
        self.snapshot.store(Arc::new(new));
        Ok(delta)
    }

    /// Fetch records with an ad-hoc client, never touching the shared
    /// cache. Used for one-off validation probes.
    pub async fn probe(client: &ComputeClient) -> Result<Vec<InstanceRecord>, RemoteError> {
        fetch_records(client).await
    }
}

/// Fetch, flatten, and annotate running instances with status checks.
async fn fetch_records(client: &ComputeClient) -> Result<Vec<InstanceRecord>, RemoteError> {
    let response = client.describe_instances().await?;

    let mut records: Vec<InstanceRecord> = response
        .reservations
        .iter()
        .flat_map(|r| r.instances.iter())
        .map(InstanceRecord::from_api)
        .collect();

    // The status call is only meaningful (and only issued) for running
    // instances; everything else keeps an empty status field.
    for record in records.iter_mut().filter(|r| r.state.is_running()) {
        let status = client
            .describe_instance_status(std::slice::from_ref(&record.id))
            .await?;
        let both_ok = status
            .instance_statuses
            .iter()
            .find(|s| s.instance_id == record.id)
            .is_some_and(|s| s.instance_status.is_ok() && s.system_status.is_ok());
        record.status_check = if both_ok {
            STATUS_CHECKS_PASSED.to_owned()
        } else {
            STATUS_INITIALIZING.to_owned()
        };
    }

    Ok(records)
}

/// Classify a new snapshot against the previous one.
///
/// Equal lists: `NoChange`. Same instance ids at every position:
/// `AttributeChange` (safe to patch rows in place). Anything else --
/// added, removed, or reordered instances: `InstanceChange`.
pub(crate) fn classify(old: &[InstanceRecord], new: &[InstanceRecord]) -> PollDelta {
    if old == new {
        return PollDelta::NoChange;
    }
    let same_ids = old.len() == new.len()
        && old.iter().zip(new.iter()).all(|(a, b)| a.id == b.id);
    if same_ids {
        PollDelta::AttributeChange
    } else {
        PollDelta::InstanceChange
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InstanceState;

    fn record(id: &str, state: InstanceState) -> InstanceRecord {
        InstanceRecord {
            name: String::new(),
            id: id.to_owned(),
            state,
            instance_type: "t3.micro".into(),
            status_check: String::new(),
            availability_zone: "us-east-1a".into(),
            security_group_id: String::new(),
            security_group_name: String::new(),
            image_id: "img-1".into(),
            key_name: String::new(),
            public_dns: String::new(),
            public_ip: String::new(),
            private_dns: String::new(),
            private_ip: String::new(),
            vpc_id: String::new(),
            subnet_id: String::new(),
        }
    }

    #[test]
    fn identical_snapshots_are_no_change() {
        let old = vec![record("i-1", InstanceState::Stopped)];
        let new = vec![record("i-1", InstanceState::Stopped)];
        assert_eq!(classify(&old, &new), PollDelta::NoChange);
    }

    #[test]
    fn state_flip_is_attribute_change() {
        let old = vec![record("i-1", InstanceState::Stopped)];
        let new = vec![record("i-1", InstanceState::Running)];
        assert_eq!(classify(&old, &new), PollDelta::AttributeChange);
    }

    #[test]
    fn added_instance_is_instance_change() {
        let old = vec![record("i-1", InstanceState::Running)];
        let new = vec![
            record("i-1", InstanceState::Running),
            record("i-2", InstanceState::Pending),
        ];
        assert_eq!(classify(&old, &new), PollDelta::InstanceChange);
    }

    #[test]
    fn removed_instance_is_instance_change() {
        let old = vec![
            record("i-1", InstanceState::Running),
            record("i-2", InstanceState::Running),
        ];
        let new = vec![record("i-1", InstanceState::Running)];
        assert_eq!(classify(&old, &new), PollDelta::InstanceChange);
    }

    #[test]
    fn reorder_is_instance_change_even_with_equal_sets() {
        let old = vec![
            record("i-1", InstanceState::Running),
            record("i-2", InstanceState::Running),
        ];
        let new = vec![
            record("i-2", InstanceState::Running),
            record("i-1", InstanceState::Running),
        ];
        assert_eq!(classify(&old, &new), PollDelta::InstanceChange);
    }

    #[test]
    fn empty_to_empty_is_no_change() {
        assert_eq!(classify(&[], &[]), PollDelta::NoChange);
    }
}
