use crate::model::store::ParameterStore;
use crate::model::types::VmExecution;
use crate::services::{self, failsafe, inventory};
use crate::vcloud::Vcloud;
use std::sync::Arc;
use vcloud_common::prelude::{BusinessError, Error, Result};

/// Executes the requested operation on the VM of a subscription.
///
/// The VM is read again, the requested operation goes through the failsafe
/// table, and only the resolved operation is sent to vCloud. The execution is
/// updated with the VM name, its previous status and the resolved operation,
/// which stays empty when nothing had to be done.
///
/// # Arguments
///
/// * `store`: Host platform parameter store.
/// * `vcloud`: vCloud client.
/// * `execution`: Execution to perform and to complete.
///
/// # Returns
///
/// An empty `Result` on success, a `vm-operation-execute` business error when
/// vCloud did not accept the operation.
///
#[tracing::instrument(level = "debug", target = "service", skip(store, vcloud))]
pub async fn execute(
    store: &Arc<dyn ParameterStore + Send + Sync>,
    vcloud: &Arc<dyn Vcloud + Send + Sync>,
    execution: &mut VmExecution,
) -> Result<()> {
    let parameters = services::subscription_parameters(store, execution.subscription).await?;
    let vm = inventory::vm_details(vcloud, &parameters).await?;

    execution.vm = Some(vm.name.clone());
    execution.previous_state = vm.status;
    execution.operation = vm
        .status
        .and_then(|status| failsafe::resolve(status, execution.requested));

    let Some(operation) = execution.operation else {
        tracing::info!(
            target: "service",
            vm = %vm.id,
            status = ?vm.status,
            requested = ?execution.requested,
            "Requested operation is useless for the current VM status, nothing to do"
        );
        return Ok(());
    };

    let task = if operation.requires_undeploy() {
        vcloud.undeploy(&parameters, &vm.id, operation).await?
    } else {
        vcloud.power_action(&parameters, &vm.id, operation).await?
    };

    match task {
        Some(task) if !task.is_empty() => {
            tracing::info!(target: "service", vm = %vm.id, ?operation, "Operation accepted by vCloud");
            Ok(())
        }
        _ => {
            tracing::error!(target: "service", vm = %vm.id, ?operation, "Operation rejected by vCloud");
            Err(Error::Business(BusinessError::VmOperationExecute))
        }
    }
}
