// Security group and VPC endpoints
//
// VPCs live here because the only reason the client lists them is to
// offer a VPC id when creating a security group.

use serde_json::json;
use tracing::debug;

use crate::client::ComputeClient;
use crate::error::Error;
use crate::models::{ApiSecurityGroup, SecurityGroupsResponse, VpcsResponse};

impl ComputeClient {
    /// List security groups in this region.
    ///
    /// `GET v1/security-groups`
    pub async fn describe_security_groups(&self) -> Result<Vec<ApiSecurityGroup>, Error> {
        debug!("describing security groups");
        let resp: SecurityGroupsResponse = self.get("v1/security-groups").await?;
        Ok(resp.security_groups)
    }

    /// Create a security group. When `vpc_id` is `None` the gateway
    /// places the group in the region's default VPC.
    ///
    /// `POST v1/security-groups`
    pub async fn create_security_group(
        &self,
        name: &str,
        description: &str,
        vpc_id: Option<&str>,
    ) -> Result<(), Error> {
        debug!(name, ?vpc_id, "creating security group");
        let body = match vpc_id {
            Some(vpc) => json!({
                "groupName": name,
                "description": description,
                "vpcId": vpc,
            }),
            None => json!({
                "groupName": name,
                "description": description,
            }),
        };
        self.post_no_response("v1/security-groups", &body).await
    }

    /// Delete a security group by name.
    ///
    /// `DELETE v1/security-groups/{name}`
    pub async fn delete_security_group(&self, name: &str) -> Result<(), Error> {
        debug!(name, "deleting security group");
        self.delete(&format!("v1/security-groups/{name}")).await
    }

    /// List VPC ids in this region.
    ///
    /// `GET v1/vpcs`
    pub async fn describe_vpcs(&self) -> Result<Vec<String>, Error> {
        debug!("describing vpcs");
        let resp: VpcsResponse = self.get("v1/vpcs").await?;
        Ok(resp.vpcs.into_iter().map(|v| v.vpc_id).collect())
    }
}
