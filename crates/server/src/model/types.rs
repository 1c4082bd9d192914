use crate::vcloud::types::{VmOperation, VmRecord, VmStatus};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use vcloud_common::prelude::{Error, Result, ValidationError};

/// Raw parameters of a node or a subscription, keyed by parameter name.
///
pub type Parameters = HashMap<String, String>;

/// Plug-in key.
pub const KEY: &str = "service:vm:vcloud";

/// vCloud API base URL. Not the portal URL.
pub const PARAMETER_API: &str = "service:vm:vcloud:api";

/// Optional public portal (vCloud Director) URL.
pub const PARAMETER_URL: &str = "service:vm:vcloud:url";

/// vCloud user name.
pub const PARAMETER_USER: &str = "service:vm:vcloud:user";

/// vCloud password able to perform VM operations.
pub const PARAMETER_PASSWORD: &str = "service:vm:vcloud:password";

/// vCloud organization.
pub const PARAMETER_ORGANIZATION: &str = "service:vm:vcloud:organization";

/// The managed VM identifier.
pub const PARAMETER_VM: &str = "service:vm:vcloud:id";

/// Typed view over the parameters this connector consumes.
///
#[derive(Debug, Clone)]
pub struct VcloudParameters {
    pub api: String,
    pub url: Option<String>,
    pub user: String,
    pub password: SecretString,
    pub organization: String,
    pub vm: Option<String>,
}

impl VcloudParameters {
    /// Returns the managed VM identifier.
    ///
    pub fn vm_id(&self) -> Result<&str> {
        self.vm
            .as_deref()
            .ok_or_else(|| Error::validation(PARAMETER_VM, ValidationError::Required))
    }
}

impl TryFrom<&Parameters> for VcloudParameters {
    type Error = Error;

    fn try_from(parameters: &Parameters) -> Result<Self> {
        let value = |name: &str| {
            parameters
                .get(name)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
        };

        Ok(Self {
            api: value(PARAMETER_API)
                .ok_or_else(|| Error::validation(PARAMETER_API, ValidationError::Required))?
                .to_owned(),
            url: value(PARAMETER_URL).map(str::to_owned),
            user: parameters.get(PARAMETER_USER).cloned().unwrap_or_default(),
            password: value(PARAMETER_PASSWORD).unwrap_or_default().into(),
            organization: value(PARAMETER_ORGANIZATION).unwrap_or_default().to_owned(),
            vm: value(PARAMETER_VM).map(str::to_owned),
        })
    }
}

// -----------------------------------------------------------------------------

/// Execution of an operation on the VM of a subscription.
///
/// `requested` is what the caller asked for; the other fields are filled by
/// the execution. `operation` stays empty when the requested operation is
/// useless for the current VM status.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VmExecution {
    pub subscription: i32,
    pub requested: VmOperation,
    pub operation: Option<VmOperation>,
    pub vm: Option<String>,
    pub previous_state: Option<VmStatus>,
}

impl VmExecution {
    pub fn new(subscription: i32, requested: VmOperation) -> Self {
        Self {
            subscription,
            requested,
            operation: None,
            vm: None,
            previous_state: None,
        }
    }
}

/// Status of a subscription: its VM and the number of attached schedules.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionStatus {
    pub vm: VmRecord,
    pub schedules: i64,
}

// -----------------------------------------------------------------------------

/// Nodes and subscriptions known by the in-memory parameter store.
///
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub nodes: Vec<NodeEntry>,
    #[serde(default)]
    pub subscriptions: Vec<SubscriptionEntry>,
}

/// A vCloud node: shared parameters and the logins allowed to see it.
///
#[derive(Debug, Clone, Deserialize)]
pub struct NodeEntry {
    pub id: String,
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default)]
    pub visible_to: Vec<String>,
}

/// A subscription binding a project to one VM of a node.
///
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionEntry {
    pub id: i32,
    pub node: String,
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default)]
    pub schedules: i64,
}
