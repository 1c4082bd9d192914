pub mod cache;
pub mod client;
pub mod session;
pub mod types;

// -----------------------------------------------------------------------------

use crate::model::types::VcloudParameters;
use crate::vcloud::types::{VmOperation, VmQuery, VmRecord};
use async_trait::async_trait;
use vcloud_common::prelude::Result;

/// Remote vCloud Director operations.
///
/// Every call negotiates (or reuses) a session for the given parameters. An
/// absent result means the remote call failed at the transport or HTTP level.
///
#[async_trait]
pub trait Vcloud {
    async fn find_vms(&self, parameters: &VcloudParameters, query: &VmQuery) -> Result<Vec<VmRecord>>;
    async fn screen(&self, parameters: &VcloudParameters, vm: &str) -> Result<Vec<u8>>;
    async fn power_action(
        &self,
        parameters: &VcloudParameters,
        vm: &str,
        operation: VmOperation,
    ) -> Result<Option<String>>;
    async fn undeploy(
        &self,
        parameters: &VcloudParameters,
        vm: &str,
        operation: VmOperation,
    ) -> Result<Option<String>>;
    async fn admin_description(&self, parameters: &VcloudParameters) -> Result<Option<String>>;
    async fn last_version(&self) -> Result<Option<String>>;
    fn clear_sessions(&self) -> usize;
}
