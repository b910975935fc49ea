//! CD-ROM backing state.
//!
//! [`CdromRequest`] is the validated form of the `cdrom` flags. It is built
//! once, before any remote call, and cannot hold an invalid flag combination.
//! [`build_backing`] turns its operation into the backing descriptor and
//! connect state that the edit submits.

use std::fmt;

use crate::cli::CdromArgs;
use crate::error::VmhwError;

/// vSphere's device name for "no physical media".
pub const EMPTY_DEVICE_NAME: &str = "";

/// Where a removable-media device gets its bits from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackingDescriptor {
    /// An ISO image stored on a datastore.
    Iso { datastore: String, iso_path: String },
    /// No physical source: the client-side device, emulated or passed through.
    ClientDevice {
        device_name: String,
        mode: ClientDeviceMode,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClientDeviceMode {
    /// Remote ATAPI emulation.
    #[default]
    Emulated,
    /// Raw passthrough of the client device.
    Passthrough,
}

impl BackingDescriptor {
    pub fn iso(datastore: impl Into<String>, iso_path: impl Into<String>) -> Self {
        BackingDescriptor::Iso {
            datastore: datastore.into(),
            iso_path: iso_path.into(),
        }
    }

    pub fn client_device(mode: ClientDeviceMode) -> Self {
        BackingDescriptor::ClientDevice {
            device_name: EMPTY_DEVICE_NAME.to_string(),
            mode,
        }
    }

    /// Datastore file name in vSphere's composite form: `[datastore] path`.
    pub fn file_name(&self) -> Option<String> {
        match self {
            BackingDescriptor::Iso {
                datastore,
                iso_path,
            } => Some(format!("[{datastore}] {iso_path}")),
            BackingDescriptor::ClientDevice { .. } => None,
        }
    }

    /// Parse a `[datastore] path` file name back into an ISO backing.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let rest = file_name.strip_prefix('[')?;
        let (datastore, path) = rest.split_once(']')?;
        Some(BackingDescriptor::iso(datastore, path.trim_start()))
    }
}

impl fmt::Display for BackingDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackingDescriptor::Iso {
                datastore,
                iso_path,
            } => write!(f, "[{datastore}] {iso_path}"),
            BackingDescriptor::ClientDevice {
                mode: ClientDeviceMode::Emulated,
                ..
            } => f.write_str("client device (emulated)"),
            BackingDescriptor::ClientDevice {
                mode: ClientDeviceMode::Passthrough,
                ..
            } => f.write_str("client device (passthrough)"),
        }
    }
}

/// Connection flags of a virtual device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectState {
    /// Connect when the VM powers on.
    pub start_connected: bool,
    /// Connected right now.
    pub connected: bool,
    /// The guest OS may connect/disconnect the device itself.
    pub allow_guest_control: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CdromOperation {
    Attach { datastore: String, iso_path: String },
    Detach { mode: ClientDeviceMode },
}

/// Validated `cdrom` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdromRequest {
    pub vm_name: String,
    pub operation: CdromOperation,
    pub on_boot: Option<bool>,
    pub recursive: bool,
}

impl CdromRequest {
    pub fn backing(&self) -> (BackingDescriptor, ConnectState) {
        build_backing(&self.operation, self.on_boot)
    }
}

impl TryFrom<&CdromArgs> for CdromRequest {
    type Error = VmhwError;

    fn try_from(args: &CdromArgs) -> Result<Self, VmhwError> {
        let vm_name = non_empty(&args.vm_name)
            .ok_or_else(|| VmhwError::usage("You must specify a virtual machine name"))?;

        if args.attach == args.disconnect {
            return Err(VmhwError::usage(
                "You must specify one of --attach or --disconnect",
            ));
        }

        let operation = if args.attach {
            if args.client_device {
                return Err(VmhwError::usage(
                    "--client_device only applies to --disconnect",
                ));
            }
            let iso_path = non_empty(&args.iso).ok_or_else(|| {
                VmhwError::usage("You must specify the name and path of an ISO with --iso")
            })?;
            let datastore = non_empty(&args.datastore).ok_or_else(|| {
                VmhwError::usage(
                    "You must specify the datastore containing the ISO with --datastore",
                )
            })?;
            CdromOperation::Attach {
                datastore: datastore.to_string(),
                iso_path: iso_path.to_string(),
            }
        } else {
            let mode = if args.client_device {
                ClientDeviceMode::Passthrough
            } else {
                ClientDeviceMode::Emulated
            };
            CdromOperation::Detach { mode }
        };

        Ok(CdromRequest {
            vm_name: vm_name.to_string(),
            operation,
            on_boot: args.on_boot,
            recursive: args.recursive,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Derive the new backing and connect state for a CD-ROM edit.
///
/// `start_connected` follows `on_boot` (default `false`) independently of
/// the immediate `connected` state.
pub fn build_backing(
    operation: &CdromOperation,
    on_boot: Option<bool>,
) -> (BackingDescriptor, ConnectState) {
    let (backing, connected) = match operation {
        CdromOperation::Attach {
            datastore,
            iso_path,
        } => (BackingDescriptor::iso(datastore, iso_path), true),
        CdromOperation::Detach { mode } => (BackingDescriptor::client_device(*mode), false),
    };

    let state = ConnectState {
        start_connected: on_boot.unwrap_or(false),
        connected,
        allow_guest_control: true,
    };

    (backing, state)
}
