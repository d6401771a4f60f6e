// ── Domain model ──
//
// The flat record shapes the rest of the core (and the presentation
// layer) consume. Wire shapes from cirrus-api never leak past the
// synchronizer and registries.

use std::str::FromStr;

use cirrus_api::models::ApiInstance;

// ── Instance lifecycle state ─────────────────────────────────────────

/// Remote instance lifecycle state.
///
/// `Other` captures states a newer gateway may introduce without
/// breaking the poll loop; it round-trips the raw string.
#[derive(Debug, Clone, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum InstanceState {
    Pending,
    Running,
    Stopping,
    Stopped,
    ShuttingDown,
    Terminated,
    #[strum(default)]
    Other(String),
}

impl InstanceState {
    pub fn parse(raw: &str) -> Self {
        // Infallible: the derive's default variant absorbs unknowns.
        Self::from_str(raw).unwrap_or_else(|_| Self::Other(raw.to_owned()))
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

// ── Instance record ──────────────────────────────────────────────────

/// Status-check summary shown for running instances.
pub const STATUS_CHECKS_PASSED: &str = "2/2 checks passed";
/// Status-check summary while either check is still pending.
pub const STATUS_INITIALIZING: &str = "Initializing";

/// One instance, flattened from the gateway's reservation-grouped
/// response. Rebuilt wholesale on every poll; never mutated
/// field-by-field from outside the synchronizer.
///
/// Optional wire fields become empty strings: the record is a display
/// row, and "blank" is what an unset DNS name means to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRecord {
    /// From the "Name" tag; first tag as fallback; empty when untagged.
    pub name: String,
    pub id: String,
    pub state: InstanceState,
    pub instance_type: String,
    /// Computed only while running, empty otherwise.
    pub status_check: String,
    pub availability_zone: String,
    /// First security group only, matching the instance table's columns.
    pub security_group_id: String,
    pub security_group_name: String,
    pub image_id: String,
    pub key_name: String,
    pub public_dns: String,
    pub public_ip: String,
    pub private_dns: String,
    pub private_ip: String,
    pub vpc_id: String,
    pub subnet_id: String,
}

impl InstanceRecord {
    /// Flatten one wire instance. The status-check field starts empty;
    /// the synchronizer fills it for running instances.
    pub(crate) fn from_api(api: &ApiInstance) -> Self {
        let (security_group_id, security_group_name) = api
            .security_groups
            .first()
            .map(|g| (g.group_id.clone(), g.group_name.clone()))
            .unwrap_or_default();

        Self {
            name: name_from_tags(api),
            id: api.instance_id.clone(),
            state: InstanceState::parse(&api.state.name),
            instance_type: api.instance_type.clone(),
            status_check: String::new(),
            availability_zone: api.placement.availability_zone.clone(),
            security_group_id,
            security_group_name,
            image_id: api.image_id.clone(),
            key_name: api.key_name.clone().unwrap_or_default(),
            public_dns: api.public_dns_name.clone().unwrap_or_default(),
            public_ip: api.public_ip_address.clone().unwrap_or_default(),
            private_dns: api.private_dns_name.clone().unwrap_or_default(),
            private_ip: api.private_ip_address.clone().unwrap_or_default(),
            vpc_id: api.vpc_id.clone().unwrap_or_default(),
            subnet_id: api.subnet_id.clone().unwrap_or_default(),
        }
    }
}

/// The "Name" tag wins, first match; otherwise the first tag's value;
/// otherwise empty.
fn name_from_tags(api: &ApiInstance) -> String {
    api.tags
        .iter()
        .find(|t| t.key == "Name")
        .or_else(|| api.tags.first())
        .map(|t| t.value.clone())
        .unwrap_or_default()
}

// ── Poll classification ──────────────────────────────────────────────

/// How one poll's snapshot relates to the previous one.
///
/// `AttributeChange` means the instance set and its order are stable,
/// so a table can patch rows in place without disturbing the user's
/// selection; `InstanceChange` means the view must be rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDelta {
    NoChange,
    AttributeChange,
    InstanceChange,
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use cirrus_api::models::Tag;

    use super::*;

    fn api_instance(tags: Vec<Tag>) -> ApiInstance {
        serde_json::from_value(serde_json::json!({
            "instanceId": "i-1",
            "state": { "name": "running" },
            "instanceType": "t3.micro",
            "placement": { "availabilityZone": "us-east-1a" },
            "imageId": "img-1",
            "tags": tags.iter()
                .map(|t| serde_json::json!({ "key": t.key, "value": t.value }))
                .collect::<Vec<_>>(),
        }))
        .expect("valid instance fixture")
    }

    #[test]
    fn state_round_trips_kebab_case() {
        assert_eq!(InstanceState::parse("shutting-down"), InstanceState::ShuttingDown);
        assert_eq!(InstanceState::ShuttingDown.to_string(), "shutting-down");
        assert_eq!(
            InstanceState::parse("hibernated"),
            InstanceState::Other("hibernated".into())
        );
    }

    #[test]
    fn name_tag_wins_over_first_tag() {
        let api = api_instance(vec![
            Tag { key: "env".into(), value: "prod".into() },
            Tag { key: "Name".into(), value: "worker-1".into() },
        ]);
        assert_eq!(InstanceRecord::from_api(&api).name, "worker-1");
    }

    #[test]
    fn first_tag_used_when_no_name_tag() {
        let api = api_instance(vec![Tag { key: "env".into(), value: "prod".into() }]);
        assert_eq!(InstanceRecord::from_api(&api).name, "prod");
    }

    #[test]
    fn untagged_instance_has_empty_name() {
        let api = api_instance(Vec::new());
        let record = InstanceRecord::from_api(&api);
        assert_eq!(record.name, "");
        assert_eq!(record.key_name, "");
        assert_eq!(record.public_ip, "");
        assert_eq!(record.security_group_id, "");
    }
}
