// Instance endpoints
//
// Describe, status checks, lifecycle verbs (start/stop/reboot/
// terminate), launch, and tagging.

use serde_json::json;
use tracing::debug;

use crate::client::ComputeClient;
use crate::error::Error;
use crate::models::{
    InstanceStatusResponse, ReservationsResponse, RunInstancesRequest, RunInstancesResponse, Tag,
};

impl ComputeClient {
    /// Describe every instance visible to these credentials, grouped by
    /// reservation as the gateway returns them.
    ///
    /// `GET v1/instances`
    pub async fn describe_instances(&self) -> Result<ReservationsResponse, Error> {
        debug!("describing instances");
        self.get("v1/instances").await
    }

    /// Fetch instance- and system-level status checks for the given ids.
    ///
    /// `POST v1/instances/status`
    pub async fn describe_instance_status(
        &self,
        instance_ids: &[String],
    ) -> Result<InstanceStatusResponse, Error> {
        debug!(?instance_ids, "describing instance status");
        self.post("v1/instances/status", &json!({ "instanceIds": instance_ids }))
            .await
    }

    /// Start stopped instances.
    ///
    /// `POST v1/instances/start`
    pub async fn start_instances(&self, instance_ids: &[String]) -> Result<(), Error> {
        debug!(?instance_ids, "starting instances");
        self.post_no_response("v1/instances/start", &json!({ "instanceIds": instance_ids }))
            .await
    }

    /// Stop running instances.
    ///
    /// `POST v1/instances/stop`
    pub async fn stop_instances(&self, instance_ids: &[String]) -> Result<(), Error> {
        debug!(?instance_ids, "stopping instances");
        self.post_no_response("v1/instances/stop", &json!({ "instanceIds": instance_ids }))
            .await
    }

    /// Reboot running instances.
    ///
    /// `POST v1/instances/reboot`
    pub async fn reboot_instances(&self, instance_ids: &[String]) -> Result<(), Error> {
        debug!(?instance_ids, "rebooting instances");
        self.post_no_response("v1/instances/reboot", &json!({ "instanceIds": instance_ids }))
            .await
    }

    /// Terminate instances. Irreversible on the remote side.
    ///
    /// `POST v1/instances/terminate`
    pub async fn terminate_instances(&self, instance_ids: &[String]) -> Result<(), Error> {
        debug!(?instance_ids, "terminating instances");
        self.post_no_response(
            "v1/instances/terminate",
            &json!({ "instanceIds": instance_ids }),
        )
        .await
    }

    /// Launch instances.
    ///
    /// `POST v1/instances`
    pub async fn run_instances(
        &self,
        request: &RunInstancesRequest,
    ) -> Result<RunInstancesResponse, Error> {
        debug!(image = %request.image_id, kind = %request.instance_type, "launching instance");
        self.post("v1/instances", request).await
    }

    /// Attach tags to a resource.
    ///
    /// `POST v1/tags`
    pub async fn create_tags(&self, resource_id: &str, tags: &[Tag]) -> Result<(), Error> {
        debug!(resource_id, "creating tags");
        self.post_no_response(
            "v1/tags",
            &json!({ "resources": [resource_id], "tags": tags }),
        )
        .await
    }
}
