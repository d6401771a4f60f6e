// Wire models for the compute control plane.
//
// These mirror the gateway's JSON shapes exactly and never leak past
// cirrus-core: the core flattens them into its own record types.

use serde::{Deserialize, Serialize};

// ── Regions ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionsResponse {
    #[serde(default)]
    pub regions: Vec<Region>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub region_name: String,
}

// ── Instances ────────────────────────────────────────────────────────

/// `GET v1/instances` — instances grouped by the reservation that
/// launched them. Consumers flatten this.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationsResponse {
    #[serde(default)]
    pub reservations: Vec<Reservation>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    #[serde(default)]
    pub instances: Vec<ApiInstance>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiInstance {
    pub instance_id: String,
    pub state: InstanceStateWire,
    pub instance_type: String,
    pub placement: Placement,
    pub image_id: String,
    #[serde(default)]
    pub security_groups: Vec<SecurityGroupRef>,
    #[serde(default)]
    pub key_name: Option<String>,
    #[serde(default)]
    pub public_dns_name: Option<String>,
    #[serde(default)]
    pub public_ip_address: Option<String>,
    #[serde(default)]
    pub private_dns_name: Option<String>,
    #[serde(default)]
    pub private_ip_address: Option<String>,
    #[serde(default)]
    pub vpc_id: Option<String>,
    #[serde(default)]
    pub subnet_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceStateWire {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub availability_zone: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupRef {
    pub group_id: String,
    pub group_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

// ── Instance status checks ───────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceStatusResponse {
    #[serde(default)]
    pub instance_statuses: Vec<ApiInstanceStatus>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiInstanceStatus {
    pub instance_id: String,
    pub instance_status: StatusSummary,
    pub system_status: StatusSummary,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    /// `"ok"` once the check passes; anything else means still initializing.
    pub status: String,
}

impl StatusSummary {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

// ── Launch ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInstancesRequest {
    pub image_id: String,
    pub instance_type: String,
    pub key_name: String,
    /// Empty means "let the gateway apply its default group".
    pub security_groups: Vec<String>,
    pub min_count: u32,
    pub max_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInstancesResponse {
    pub instances: Vec<LaunchedInstance>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchedInstance {
    pub instance_id: String,
}

// ── Key pairs ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPairsResponse {
    #[serde(default)]
    pub key_pairs: Vec<ApiKeyPair>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyPair {
    pub key_name: String,
}

/// Returned once, at creation time -- the only moment the private key
/// material is ever visible.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedKeyPair {
    pub key_name: String,
    pub key_material: String,
}

// ── Security groups / VPCs ───────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupsResponse {
    #[serde(default)]
    pub security_groups: Vec<ApiSecurityGroup>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSecurityGroup {
    pub group_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub vpc_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpcsResponse {
    #[serde(default)]
    pub vpcs: Vec<ApiVpc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiVpc {
    pub vpc_id: String,
}

// ── Images ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagesResponse {
    #[serde(default)]
    pub images: Vec<ApiImage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiImage {
    pub image_id: String,
    pub name: String,
}
