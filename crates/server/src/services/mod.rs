use crate::model::store::ParameterStore;
use crate::model::types::VcloudParameters;
use std::sync::Arc;
use vcloud_common::error::Result;

pub mod execution;
pub mod failsafe;
pub mod inventory;

// -----------------------------------------------------------------------------

/// Loads the typed parameters of a node.
///
/// # Arguments
///
/// * `store`: Host platform parameter store.
/// * `node`: Identifier of the node.
///
pub async fn node_parameters(
    store: &Arc<dyn ParameterStore + Send + Sync>,
    node: &str,
) -> Result<VcloudParameters> {
    VcloudParameters::try_from(&store.node_parameters(node).await?)
}

/// Loads the typed parameters of a subscription, node parameters included.
///
/// # Arguments
///
/// * `store`: Host platform parameter store.
/// * `subscription`: Identifier of the subscription.
///
pub async fn subscription_parameters(
    store: &Arc<dyn ParameterStore + Send + Sync>,
    subscription: i32,
) -> Result<VcloudParameters> {
    VcloudParameters::try_from(&store.subscription_parameters(subscription).await?)
}
