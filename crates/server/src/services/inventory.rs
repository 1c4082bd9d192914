use crate::model::store::ParameterStore;
use crate::model::types::{PARAMETER_API, PARAMETER_VM, SubscriptionStatus, VcloudParameters};
use crate::services;
use crate::vcloud::Vcloud;
use crate::vcloud::types::{VmQuery, VmRecord};
use std::sync::Arc;
use vcloud_common::prelude::{Error, Result, ValidationError};

/// Reads the current record of the VM named by the parameters.
///
/// # Returns
///
/// The VM record, or a `vcloud-vm` validation error carrying the requested
/// identifier when vCloud does not know it.
///
pub async fn vm_details(
    vcloud: &Arc<dyn Vcloud + Send + Sync>,
    parameters: &VcloudParameters,
) -> Result<VmRecord> {
    let id = parameters.vm_id()?;
    vcloud
        .find_vms(parameters, &VmQuery::ById(id.to_owned()))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| Error::validation_with(PARAMETER_VM, ValidationError::UnknownVm, id))
}

/// Searches the VMs of a node whose name contains `criteria`.
///
/// # Arguments
///
/// * `store`: Host platform parameter store.
/// * `vcloud`: vCloud client.
/// * `node`: Identifier of the node to search.
/// * `criteria`: Part of the VM name.
/// * `login`: Caller login, the node must be visible to it.
///
/// # Returns
///
/// At most ten records sorted by name. Empty without any remote call when the
/// node is not visible.
///
#[tracing::instrument(level = "debug", target = "service", skip(store, vcloud))]
pub async fn find_all_by_name(
    store: &Arc<dyn ParameterStore + Send + Sync>,
    vcloud: &Arc<dyn Vcloud + Send + Sync>,
    node: &str,
    criteria: &str,
    login: &str,
) -> Result<Vec<VmRecord>> {
    if !store.is_node_visible(node, login).await? {
        tracing::debug!(target: "service", "Node not visible, empty search");
        return Ok(Vec::new());
    }

    let parameters = services::node_parameters(store, node).await?;
    vcloud
        .find_vms(&parameters, &VmQuery::ByName(criteria.to_owned()))
        .await
}

/// Console thumbnail of the VM, empty when unavailable.
///
pub async fn console(
    vcloud: &Arc<dyn Vcloud + Send + Sync>,
    parameters: &VcloudParameters,
) -> Result<Vec<u8>> {
    vcloud.screen(parameters, parameters.vm_id()?).await
}

/// vCloud version reported by the admin endpoint.
///
pub async fn version(
    vcloud: &Arc<dyn Vcloud + Send + Sync>,
    parameters: &VcloudParameters,
) -> Result<Option<String>> {
    vcloud.admin_description(parameters).await
}

/// Checks the credentials grant access to the admin endpoint.
///
pub async fn check_status(
    vcloud: &Arc<dyn Vcloud + Send + Sync>,
    parameters: &VcloudParameters,
) -> Result<bool> {
    match version(vcloud, parameters).await? {
        Some(version) => {
            tracing::debug!(target: "service", %version, "Admin access granted");
            Ok(true)
        }
        None => Err(Error::validation(PARAMETER_API, ValidationError::NotAdmin)),
    }
}

/// Current VM record of a subscription and its schedule count.
///
pub async fn check_subscription_status(
    store: &Arc<dyn ParameterStore + Send + Sync>,
    vcloud: &Arc<dyn Vcloud + Send + Sync>,
    subscription: i32,
) -> Result<SubscriptionStatus> {
    let parameters = services::subscription_parameters(store, subscription).await?;
    let vm = vm_details(vcloud, &parameters).await?;

    Ok(SubscriptionStatus {
        vm,
        schedules: store.count_schedules(subscription).await?,
    })
}

/// Validates the VM bound to a subscription exists.
///
pub async fn link(
    vcloud: &Arc<dyn Vcloud + Send + Sync>,
    parameters: &VcloudParameters,
) -> Result<VmRecord> {
    let vm = vm_details(vcloud, parameters).await?;
    tracing::info!(target: "service", vm = %vm.id, name = %vm.name, "Subscription linked");

    Ok(vm)
}

pub async fn last_version(vcloud: &Arc<dyn Vcloud + Send + Sync>) -> Result<Option<String>> {
    vcloud.last_version().await
}

/// Drops every cached session token.
///
pub fn clear_cache(vcloud: &Arc<dyn Vcloud + Send + Sync>) -> usize {
    vcloud.clear_sessions()
}
