//! Disk listing.

use crate::cli::DiskListArgs;
use crate::device::DeviceKind;
use crate::error::VmhwError;
use crate::inventory::VirtualMachine;
use crate::util::pretty_size_kb;

/// Validated `disk list` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskListRequest {
    pub vm_name: String,
    pub recursive: bool,
}

impl TryFrom<&DiskListArgs> for DiskListRequest {
    type Error = VmhwError;

    fn try_from(args: &DiskListArgs) -> Result<Self, VmhwError> {
        let vm_name = args
            .vm_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| VmhwError::usage("You must specify a virtual machine name"))?;
        Ok(DiskListRequest {
            vm_name: vm_name.to_string(),
            recursive: args.recursive,
        })
    }
}

/// One line per disk, in device order: unit number (width 3), label
/// (width 20), capacity.
pub fn disk_lines(vm: &VirtualMachine) -> Vec<String> {
    vm.devices
        .iter()
        .filter_map(|device| match &device.kind {
            DeviceKind::Disk {
                unit_number,
                label,
                capacity_kb,
            } => Some(format_disk_line(*unit_number, label, *capacity_kb)),
            DeviceKind::Cdrom { .. } | DeviceKind::Other { .. } => None,
        })
        .collect()
}

pub fn format_disk_line(unit_number: i32, label: &str, capacity_kb: u64) -> String {
    format!(
        "{unit_number:>3}{label:>20} {}",
        pretty_size_kb(capacity_kb)
    )
}
