//! Subcommand bodies, written against [`Backend`] so they run unchanged
//! over the live service and the test fake.

use crate::backend::Backend;
use crate::backing::{CdromOperation, CdromRequest};
use crate::device::{DeviceClass, find_device};
use crate::disk::{self, DiskListRequest};
use crate::error::VmhwError;
use crate::inventory::{self, Scope};
use crate::reconfig;

/// Re-point the VM's first CD-ROM drive at an ISO, or at an empty client
/// device.
pub async fn cdrom<B: Backend>(
    backend: &B,
    request: &CdromRequest,
    folder: &str,
) -> Result<(), VmhwError> {
    let scope = Scope::new(request.recursive, folder);
    let vm = inventory::resolve(backend, &request.vm_name, &scope).await?;
    let drive = find_device(&vm, DeviceClass::Cdrom)?;

    let (backing, state) = request.backing();
    match &request.operation {
        CdromOperation::Attach { .. } => {
            tracing::info!(vm = %vm.path, backing = %backing, "attaching ISO");
        }
        CdromOperation::Detach { mode } => {
            tracing::info!(vm = %vm.path, ?mode, "disconnecting CD-ROM");
        }
    }

    reconfig::apply(backend, &vm, drive, backing, state).await
}

/// Lines describing each disk of the VM, in device order.
pub async fn disk_list<B: Backend>(
    backend: &B,
    request: &DiskListRequest,
    folder: &str,
) -> Result<Vec<String>, VmhwError> {
    let scope = Scope::new(request.recursive, folder);
    let vm = inventory::resolve(backend, &request.vm_name, &scope).await?;
    Ok(disk::disk_lines(&vm))
}
