use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use vcloud_common::prelude::Result;

/// Prefix of the VM URN returned by vCloud queries.
pub const VM_URN_PREFIX: &str = "urn:vcloud:vm:";

/// Prefix of the vApp URN returned by vCloud queries.
pub const VAPP_URN_PREFIX: &str = "urn:vcloud:vapp:";

/// Content type of the undeploy request body.
pub const UNDEPLOY_CONTENT_TYPE: &str = "application/vnd.vmware.vcloud.undeployVAppParams+xml";

/// Characters kept as-is when a value is embedded in a query filter.
const FILTER_VALUE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// Power status of a virtual machine, as reported by vCloud.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VmStatus {
    PoweredOn,
    PoweredOff,
    Suspended,
}

impl VmStatus {
    /// Parses the `status` attribute of a `VMRecord`. Statuses this connector
    /// does not drive (`UNRESOLVED`, `MIXED`, ...) give `None`.
    ///
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "POWERED_ON" => Some(Self::PoweredOn),
            "POWERED_OFF" => Some(Self::PoweredOff),
            "SUSPENDED" => Some(Self::Suspended),
            _ => None,
        }
    }
}

/// Operation a caller can request on a virtual machine.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VmOperation {
    On,
    Off,
    Shutdown,
    Suspend,
    Reset,
    Reboot,
}

impl VmOperation {
    pub const ALL: [VmOperation; 6] = [
        Self::On,
        Self::Off,
        Self::Shutdown,
        Self::Suspend,
        Self::Reset,
        Self::Reboot,
    ];

    /// Name of the matching vCloud power action.
    ///
    pub fn action(self) -> &'static str {
        match self {
            Self::On => "powerOn",
            Self::Off => "powerOff",
            Self::Shutdown => "shutdown",
            Self::Suspend => "suspend",
            Self::Reset => "reset",
            Self::Reboot => "reboot",
        }
    }

    /// Whether the VM has to be undeployed instead of simply power toggled.
    ///
    pub fn requires_undeploy(self) -> bool {
        matches!(self, Self::Shutdown | Self::Off)
    }
}

/// Description of a vCloud virtual machine built from a `VMRecord` entry.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VmRecord {
    /// Identifier without the `urn:vcloud:vm:` prefix.
    pub id: String,
    pub name: String,
    pub os: String,
    pub storage_profile_name: String,
    pub status: Option<VmStatus>,
    pub cpu: i32,
    /// Memory in MB.
    pub ram: i32,
    pub busy: bool,
    pub deployed: bool,
    /// Name of the owning vApp.
    pub v_app: Option<String>,
    /// Identifier of the owning vApp, without the `urn:vcloud:vapp:` prefix.
    pub v_app_id: Option<String>,
}

impl From<RawVmRecord> for VmRecord {
    fn from(raw: RawVmRecord) -> Self {
        let id = raw.id.unwrap_or_default();
        let container = raw.container.unwrap_or_default();

        Self {
            id: id.strip_prefix(VM_URN_PREFIX).unwrap_or(&id).to_owned(),
            name: raw.name.unwrap_or_default(),
            os: raw.guest_os.unwrap_or_default(),
            storage_profile_name: raw.storage_profile_name.unwrap_or_default(),
            status: raw.status.as_deref().and_then(VmStatus::parse),
            cpu: to_int(raw.number_of_cpus.as_deref()),
            ram: to_int(raw.memory_mb.as_deref()),
            busy: to_bool(raw.is_busy.as_deref()),
            deployed: to_bool(raw.is_deployed.as_deref()),
            v_app: trim_to_none(raw.container_name.as_deref()),
            v_app_id: trim_to_none(Some(
                container.strip_prefix(VAPP_URN_PREFIX).unwrap_or(&container),
            )),
        }
    }
}

fn to_int(value: Option<&str>) -> i32 {
    value.and_then(|value| value.trim().parse().ok()).unwrap_or(0)
}

fn to_bool(value: Option<&str>) -> bool {
    value.is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
}

fn trim_to_none(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

// -----------------------------------------------------------------------------

/// Raw `QueryResultRecords` document. Only `VMRecord` children are read, any
/// other element (`Link`, ...) is skipped.
///
#[derive(Debug, Default, Deserialize)]
pub struct QueryResultRecords {
    #[serde(rename = "VMRecord", default)]
    pub records: Vec<RawVmRecord>,
}

/// Raw `VMRecord` attributes. Every attribute is optional: a missing or
/// malformed value falls back to a default when converted into [`VmRecord`].
///
#[derive(Debug, Default, Deserialize)]
pub struct RawVmRecord {
    #[serde(rename = "@id", default)]
    pub id: Option<String>,
    #[serde(rename = "@name", default)]
    pub name: Option<String>,
    #[serde(rename = "@guestOs", default)]
    pub guest_os: Option<String>,
    #[serde(rename = "@storageProfileName", default)]
    pub storage_profile_name: Option<String>,
    #[serde(rename = "@status", default)]
    pub status: Option<String>,
    #[serde(rename = "@numberOfCpus", default)]
    pub number_of_cpus: Option<String>,
    #[serde(rename = "@memoryMB", default)]
    pub memory_mb: Option<String>,
    #[serde(rename = "@isBusy", default)]
    pub is_busy: Option<String>,
    #[serde(rename = "@isDeployed", default)]
    pub is_deployed: Option<String>,
    #[serde(rename = "@containerName", default)]
    pub container_name: Option<String>,
    #[serde(rename = "@container", default)]
    pub container: Option<String>,
}

/// Parses every `VMRecord` of a query result.
///
pub fn parse_vm_records(xml: &str) -> Result<Vec<VmRecord>> {
    let result: QueryResultRecords = quick_xml::de::from_str(xml)?;
    Ok(result.records.into_iter().map(VmRecord::from).collect())
}

/// Raw `/admin` document, only the `Description` elements are kept.
///
#[derive(Debug, Default, Deserialize)]
pub struct AdminDocument {
    #[serde(rename = "Description", default)]
    pub descriptions: Vec<Description>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Description {
    #[serde(rename = "$text", default)]
    pub text: String,
}

/// Extracts the trimmed text of the first `Description` element, `None` when
/// missing or blank.
///
pub fn parse_admin_description(xml: &str) -> Result<Option<String>> {
    let document: AdminDocument = quick_xml::de::from_str(xml)?;
    Ok(trim_to_none(
        document.descriptions.first().map(|description| description.text.as_str()),
    ))
}

// -----------------------------------------------------------------------------

/// Page size of a VM search by name.
pub const SEARCH_PAGE_SIZE: u32 = 10;

/// Query against the vCloud `/query` endpoint for VM records.
///
#[derive(Debug, Clone, PartialEq)]
pub enum VmQuery {
    /// Exact match on the VM identifier (without URN prefix).
    ById(String),
    /// Case-insensitive match on a part of the VM name.
    ByName(String),
}

impl VmQuery {
    /// Builds the API resource path, query string included.
    ///
    pub fn to_resource(&self) -> String {
        match self {
            Self::ById(id) => format!(
                "query?type=vm&format=idrecords&filter=id=={VM_URN_PREFIX}{}&pageSize=1",
                utf8_percent_encode(id, FILTER_VALUE)
            ),
            Self::ByName(criteria) => format!(
                "query?type=vm&format=idrecords&filter=name==*{}*&sortAsc=name&fields=name,guestOs&pageSize={SEARCH_PAGE_SIZE}",
                utf8_percent_encode(criteria, FILTER_VALUE)
            ),
        }
    }
}

/// XML body of the undeploy action for `operation`.
///
pub fn undeploy_payload(operation: VmOperation) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><UndeployVAppParams xmlns="http://www.vmware.com/vcloud/v1.5"><UndeployPowerAction>{}</UndeployPowerAction></UndeployVAppParams>"#,
        operation.action()
    )
}

/// Extracts the latest vCloud suite version from the public download index,
/// where links look like `.../vmware_vcloud_suite/6_0#...`.
///
pub fn parse_last_version(page: &str) -> Option<String> {
    const MARKER: &str = "vmware_vcloud_suite/";

    let start = page.find(MARKER)? + MARKER.len();
    let rest = &page[start..];
    let end = rest.find(|c| c == '#' || c == '"').unwrap_or(rest.len());
    trim_to_none(Some(&rest[..end]))
}
