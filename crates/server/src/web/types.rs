use crate::model::types::SubscriptionStatus;
use crate::vcloud::types::{VmOperation, VmRecord};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// API response with a list of VMs inside.
///
pub type VmsResponse = Response<Vec<VmRecord>>;

/// API response with a single VM inside.
///
pub type VmResponse = Response<VmRecord>;

/// API response with a subscription status inside.
///
pub type StatusResponse = Response<SubscriptionStatus>;

/// Generic API response.
///
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Response<T> {
    pub result: T,
}

impl<T> Response<T> {
    /// Creates a new instance of the API response.
    ///
    pub fn new(result: T) -> Self {
        Self { result }
    }
}

/// Payload for executing an operation on the VM of a subscription.
///
#[derive(Debug, Deserialize, ToSchema)]
pub struct ExecutionPayload {
    pub operation: VmOperation,
}

/// Version reported by vCloud, absent when unknown.
///
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VersionPayload {
    pub version: Option<String>,
}

impl From<Option<String>> for VersionPayload {
    fn from(version: Option<String>) -> Self {
        Self { version }
    }
}

/// Number of session tokens dropped from the cache.
///
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClearedPayload {
    pub cleared: usize,
}
