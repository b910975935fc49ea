//! vSphere VI/JSON wire types.
//!
//! Data objects carry their type in a `_typeName` member, so polymorphic
//! values map onto internally tagged enums. Only the members this tool reads
//! or writes are modelled; everything else in a response is ignored.

use serde::{Deserialize, Serialize};

use crate::backing::{BackingDescriptor, ClientDeviceMode, ConnectState};
use crate::device::{DeviceKind, HardwareDevice};
use crate::error::VmhwError;
use crate::reconfig::{ChangeOperation, ConfigChangeRequest};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoRef {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl MoRef {
    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceContent {
    pub root_folder: MoRef,
    pub session_manager: MoRef,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub user_name: &'a str,
    pub password: &'a str,
}

// ── Devices (read) ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VmConfigInfo {
    pub hardware: VmHardware,
}

#[derive(Debug, Deserialize)]
pub struct VmHardware {
    #[serde(default)]
    pub device: Vec<WireDevice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDevice {
    #[serde(rename = "_typeName")]
    pub type_name: String,
    pub key: i32,
    pub controller_key: Option<i32>,
    pub unit_number: Option<i32>,
    pub device_info: Option<WireDescription>,
    pub connectable: Option<WireConnectable>,
    pub backing: Option<WireBacking>,
    #[serde(rename = "capacityInKB")]
    pub capacity_in_kb: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct WireDescription {
    #[serde(default)]
    pub label: String,
}

impl From<WireDevice> for HardwareDevice {
    fn from(dev: WireDevice) -> Self {
        let kind = match dev.type_name.as_str() {
            "VirtualCdrom" => DeviceKind::Cdrom {
                backing: dev.backing.and_then(WireBacking::into_descriptor),
            },
            "VirtualDisk" => DeviceKind::Disk {
                unit_number: dev.unit_number.unwrap_or_default(),
                label: dev.device_info.map(|d| d.label).unwrap_or_default(),
                capacity_kb: dev.capacity_in_kb.unwrap_or_default(),
            },
            _ => DeviceKind::Other {
                type_name: dev.type_name,
            },
        };

        HardwareDevice {
            key: dev.key,
            controller_key: dev.controller_key,
            connectable: dev.connectable.map(Into::into),
            kind,
        }
    }
}

// ── Backings and connect info (both directions) ─────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_typeName")]
pub enum WireBacking {
    #[serde(rename_all = "camelCase")]
    VirtualCdromIsoBackingInfo { file_name: String },
    #[serde(rename_all = "camelCase")]
    VirtualCdromRemoteAtapiBackingInfo { device_name: String },
    #[serde(rename_all = "camelCase")]
    VirtualCdromRemotePassthroughBackingInfo {
        device_name: String,
        #[serde(default)]
        exclusive: bool,
    },
    #[serde(other)]
    Other,
}

impl WireBacking {
    fn into_descriptor(self) -> Option<BackingDescriptor> {
        match self {
            WireBacking::VirtualCdromIsoBackingInfo { file_name } => {
                BackingDescriptor::from_file_name(&file_name)
            }
            WireBacking::VirtualCdromRemoteAtapiBackingInfo { device_name } => {
                Some(BackingDescriptor::ClientDevice {
                    device_name,
                    mode: ClientDeviceMode::Emulated,
                })
            }
            WireBacking::VirtualCdromRemotePassthroughBackingInfo { device_name, .. } => {
                Some(BackingDescriptor::ClientDevice {
                    device_name,
                    mode: ClientDeviceMode::Passthrough,
                })
            }
            WireBacking::Other => None,
        }
    }
}

impl From<&BackingDescriptor> for WireBacking {
    fn from(backing: &BackingDescriptor) -> Self {
        match backing {
            BackingDescriptor::Iso { .. } => WireBacking::VirtualCdromIsoBackingInfo {
                file_name: backing.file_name().unwrap_or_default(),
            },
            BackingDescriptor::ClientDevice {
                device_name,
                mode: ClientDeviceMode::Emulated,
            } => WireBacking::VirtualCdromRemoteAtapiBackingInfo {
                device_name: device_name.clone(),
            },
            BackingDescriptor::ClientDevice {
                device_name,
                mode: ClientDeviceMode::Passthrough,
            } => WireBacking::VirtualCdromRemotePassthroughBackingInfo {
                device_name: device_name.clone(),
                exclusive: false,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_typeName")]
pub enum WireConnectable {
    #[serde(rename_all = "camelCase")]
    VirtualDeviceConnectInfo {
        start_connected: bool,
        connected: bool,
        allow_guest_control: bool,
    },
}

impl From<WireConnectable> for ConnectState {
    fn from(info: WireConnectable) -> Self {
        let WireConnectable::VirtualDeviceConnectInfo {
            start_connected,
            connected,
            allow_guest_control,
        } = info;
        ConnectState {
            start_connected,
            connected,
            allow_guest_control,
        }
    }
}

impl From<ConnectState> for WireConnectable {
    fn from(state: ConnectState) -> Self {
        WireConnectable::VirtualDeviceConnectInfo {
            start_connected: state.start_connected,
            connected: state.connected,
            allow_guest_control: state.allow_guest_control,
        }
    }
}

// ── Reconfigure (write) ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ReconfigureRequest {
    pub spec: WireConfigSpec,
}

#[derive(Debug, Serialize)]
#[serde(tag = "_typeName")]
pub enum WireConfigSpec {
    #[serde(rename_all = "camelCase")]
    VirtualMachineConfigSpec { device_change: Vec<WireDeviceChange> },
}

#[derive(Debug, Serialize)]
#[serde(tag = "_typeName")]
pub enum WireDeviceChange {
    VirtualDeviceConfigSpec {
        operation: &'static str,
        device: WireEditedDevice,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "_typeName")]
pub enum WireEditedDevice {
    #[serde(rename_all = "camelCase")]
    VirtualCdrom {
        key: i32,
        #[serde(skip_serializing_if = "Option::is_none")]
        controller_key: Option<i32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        backing: Option<WireBacking>,
        #[serde(skip_serializing_if = "Option::is_none")]
        connectable: Option<WireConnectable>,
    },
}

fn operation_name(op: ChangeOperation) -> &'static str {
    match op {
        ChangeOperation::Add => "add",
        ChangeOperation::Edit => "edit",
        ChangeOperation::Remove => "remove",
    }
}

impl TryFrom<&ConfigChangeRequest> for ReconfigureRequest {
    type Error = VmhwError;

    fn try_from(request: &ConfigChangeRequest) -> Result<Self, VmhwError> {
        let mut device_change = Vec::with_capacity(request.changes.len());
        for change in &request.changes {
            let device = &change.device;
            let DeviceKind::Cdrom { backing } = &device.kind else {
                return Err(VmhwError::Validation {
                    message: format!(
                        "device {} is not a CD-ROM; only CD-ROM edits are supported",
                        device.key
                    ),
                });
            };
            device_change.push(WireDeviceChange::VirtualDeviceConfigSpec {
                operation: operation_name(change.operation),
                device: WireEditedDevice::VirtualCdrom {
                    key: device.key,
                    controller_key: device.controller_key,
                    backing: backing.as_ref().map(WireBacking::from),
                    connectable: device.connectable.map(WireConnectable::from),
                },
            });
        }

        Ok(ReconfigureRequest {
            spec: WireConfigSpec::VirtualMachineConfigSpec { device_change },
        })
    }
}

// ── Tasks ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TaskInfo {
    pub state: TaskState,
    pub error: Option<MethodFault>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Queued,
    Running,
    Success,
    Error,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodFault {
    pub localized_message: Option<String>,
    pub fault: Option<serde_json::Value>,
}

impl MethodFault {
    pub fn detail(&self) -> String {
        if let Some(msg) = self.localized_message.as_deref().filter(|m| !m.is_empty()) {
            return msg.to_string();
        }
        self.fault
            .as_ref()
            .and_then(|f| f.get("_typeName"))
            .and_then(|t| t.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| "task failed without detail".to_string())
    }
}

// ── Faults ──────────────────────────────────────────────────────────

/// Body of a failed VI/JSON call: the method fault itself.
#[derive(Debug, Default, Deserialize)]
pub struct FaultBody {
    #[serde(rename = "_typeName", default)]
    pub type_name: String,
    pub faultstring: Option<String>,
    pub message: Option<String>,
}

impl FaultBody {
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str::<FaultBody>(body)
            .ok()
            .filter(|f| !f.type_name.is_empty())
    }

    pub fn is_login_failure(&self) -> bool {
        matches!(self.type_name.as_str(), "InvalidLogin" | "NotAuthenticated")
    }

    pub fn detail(&self) -> String {
        match self.faultstring.as_deref().or(self.message.as_deref()) {
            Some(text) if !text.is_empty() => format!("{}: {text}", self.type_name),
            _ => self.type_name.clone(),
        }
    }
}
