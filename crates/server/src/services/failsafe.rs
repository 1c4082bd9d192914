use crate::vcloud::types::{VmOperation, VmStatus};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Safe transitions: observed status, requested operation, operation to run.
///
/// A missing pair means the requested operation is useless or unsafe for the
/// observed status.
///
const TRANSITIONS: [(VmStatus, VmOperation, VmOperation); 13] = [
    (VmStatus::PoweredOff, VmOperation::On, VmOperation::On),
    (VmStatus::PoweredOff, VmOperation::Reset, VmOperation::On),
    (VmStatus::PoweredOff, VmOperation::Reboot, VmOperation::On),
    (VmStatus::PoweredOn, VmOperation::Off, VmOperation::Off),
    (VmStatus::PoweredOn, VmOperation::Shutdown, VmOperation::Shutdown),
    (VmStatus::PoweredOn, VmOperation::Suspend, VmOperation::Suspend),
    (VmStatus::PoweredOn, VmOperation::Reset, VmOperation::Reset),
    (VmStatus::PoweredOn, VmOperation::Reboot, VmOperation::Reboot),
    (VmStatus::Suspended, VmOperation::On, VmOperation::On),
    (VmStatus::Suspended, VmOperation::Off, VmOperation::Off),
    (VmStatus::Suspended, VmOperation::Shutdown, VmOperation::Off),
    (VmStatus::Suspended, VmOperation::Reset, VmOperation::Reset),
    (VmStatus::Suspended, VmOperation::Reboot, VmOperation::Reset),
];

static FAILSAFE: LazyLock<HashMap<VmStatus, HashMap<VmOperation, VmOperation>>> =
    LazyLock::new(|| {
        let mut table: HashMap<VmStatus, HashMap<VmOperation, VmOperation>> = HashMap::new();
        for (status, requested, resolved) in TRANSITIONS {
            table.entry(status).or_default().insert(requested, resolved);
        }
        table
    });

/// Returns the operation to actually run for `requested` when the VM is in
/// `status`, `None` when nothing should be done.
///
pub fn resolve(status: VmStatus, requested: VmOperation) -> Option<VmOperation> {
    FAILSAFE
        .get(&status)
        .and_then(|operations| operations.get(&requested))
        .copied()
}
