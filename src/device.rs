//! Virtual hardware devices and the device locator.

use std::fmt;

use crate::backing::{BackingDescriptor, ConnectState};
use crate::error::VmhwError;
use crate::inventory::VirtualMachine;

/// A device as read from the VM's hardware list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareDevice {
    /// Stable identifier of the device within the VM.
    pub key: i32,
    /// Key of the controller this device hangs off.
    pub controller_key: Option<i32>,
    pub connectable: Option<ConnectState>,
    pub kind: DeviceKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceKind {
    Cdrom {
        /// `None` when the current backing is of a type we don't model.
        backing: Option<BackingDescriptor>,
    },
    Disk {
        unit_number: i32,
        label: String,
        capacity_kb: u64,
    },
    /// Any other device type, identified by its remote type name.
    Other { type_name: String },
}

/// Device kinds the locator can search for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Cdrom,
    Disk,
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceClass::Cdrom => f.write_str("cd drive"),
            DeviceClass::Disk => f.write_str("disk"),
        }
    }
}

impl HardwareDevice {
    pub fn class(&self) -> Option<DeviceClass> {
        match self.kind {
            DeviceKind::Cdrom { .. } => Some(DeviceClass::Cdrom),
            DeviceKind::Disk { .. } => Some(DeviceClass::Disk),
            DeviceKind::Other { .. } => None,
        }
    }

    pub fn is(&self, class: DeviceClass) -> bool {
        self.class() == Some(class)
    }
}

/// Return the first device of `class` in the VM's device order.
pub fn find_device(vm: &VirtualMachine, class: DeviceClass) -> Result<&HardwareDevice, VmhwError> {
    vm.devices
        .iter()
        .find(|d| d.is(class))
        .ok_or_else(|| VmhwError::DeviceNotFound {
            kind: class.to_string(),
            vm: vm.name.clone(),
        })
}
