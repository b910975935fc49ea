//! Building and submitting a device edit.

use crate::backend::{Backend, TaskOutcome};
use crate::backing::{BackingDescriptor, ConnectState};
use crate::device::{DeviceKind, HardwareDevice};
use crate::error::VmhwError;
use crate::inventory::VirtualMachine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOperation {
    Add,
    Edit,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceChange {
    pub operation: ChangeOperation,
    pub device: HardwareDevice,
}

/// Device changes applied by the remote service as one update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigChangeRequest {
    pub changes: Vec<DeviceChange>,
}

impl ConfigChangeRequest {
    /// A single `Edit` of `device` that swaps in a new backing and connect
    /// state. `key` and `controller_key` are carried over as-is; the service
    /// rejects edits that change a device's identity.
    pub fn edit_backing(
        device: &HardwareDevice,
        backing: BackingDescriptor,
        state: ConnectState,
    ) -> Self {
        let edited = HardwareDevice {
            key: device.key,
            controller_key: device.controller_key,
            connectable: Some(state),
            kind: DeviceKind::Cdrom {
                backing: Some(backing),
            },
        };

        ConfigChangeRequest {
            changes: vec![DeviceChange {
                operation: ChangeOperation::Edit,
                device: edited,
            }],
        }
    }
}

/// Submit the edit and wait for the remote task to finish.
///
/// There is no timeout: a task that never completes blocks the command.
pub async fn apply<B: Backend>(
    backend: &B,
    vm: &VirtualMachine,
    device: &HardwareDevice,
    backing: BackingDescriptor,
    state: ConnectState,
) -> Result<(), VmhwError> {
    let change = ConfigChangeRequest::edit_backing(device, backing, state);

    let task = backend.reconfigure(vm, &change).await?;
    tracing::info!(vm = %vm.name, task = %task.id, "reconfigure task submitted");

    match backend.wait_for_task(&task).await? {
        TaskOutcome::Succeeded => {
            tracing::info!(vm = %vm.name, task = %task.id, "reconfigure task succeeded");
            Ok(())
        }
        TaskOutcome::Failed(detail) => Err(VmhwError::Reconfig {
            vm: vm.name.clone(),
            detail,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::{Call, FakeBackend};
    use crate::backing::ClientDeviceMode;
    use crate::device::tests::cdrom;

    fn connected() -> ConnectState {
        ConnectState {
            start_connected: false,
            connected: true,
            allow_guest_control: true,
        }
    }

    #[test]
    fn edit_copies_identity_and_substitutes_backing() {
        let mut located = cdrom(3000, 200);
        located.kind = DeviceKind::Cdrom {
            backing: Some(BackingDescriptor::iso("OLD", "old.iso")),
        };

        let change = ConfigChangeRequest::edit_backing(
            &located,
            BackingDescriptor::iso("DS1", "os/install.iso"),
            connected(),
        );

        assert_eq!(change.changes.len(), 1);
        let entry = &change.changes[0];
        assert_eq!(entry.operation, ChangeOperation::Edit);
        assert_eq!(entry.device.key, 3000);
        assert_eq!(entry.device.controller_key, Some(200));
        assert_eq!(entry.device.connectable, Some(connected()));
        assert_eq!(
            entry.device.kind,
            DeviceKind::Cdrom {
                backing: Some(BackingDescriptor::iso("DS1", "os/install.iso"))
            }
        );
    }

    #[test]
    fn same_inputs_build_same_request() {
        let located = cdrom(3000, 200);
        let backing = BackingDescriptor::iso("DS1", "os/install.iso");
        let first = ConfigChangeRequest::edit_backing(&located, backing.clone(), connected());
        let second = ConfigChangeRequest::edit_backing(&located, backing, connected());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn apply_submits_and_waits() {
        let backend = FakeBackend::new().with_vm("DC1/vm/web01", vec![cdrom(3000, 200)]);
        let vm = backend.vm("DC1/vm/web01");
        let backing = BackingDescriptor::client_device(ClientDeviceMode::Emulated);
        let state = ConnectState {
            start_connected: true,
            connected: false,
            allow_guest_control: true,
        };

        apply(&backend, &vm, &vm.devices[0], backing.clone(), state)
            .await
            .unwrap();

        let expected = ConfigChangeRequest::edit_backing(&vm.devices[0], backing, state);
        assert_eq!(
            backend.calls(),
            vec![
                Call::Reconfigure(vm.id.clone(), expected),
                Call::WaitForTask("task-1".into()),
            ]
        );
    }

    #[tokio::test]
    async fn failed_task_propagates_detail() {
        let backend = FakeBackend::new()
            .with_vm("DC1/vm/web01", vec![cdrom(3000, 200)])
            .with_task_outcome(TaskOutcome::Failed(
                "Connection control operation failed for disk 'ide0:0'.".into(),
            ));
        let vm = backend.vm("DC1/vm/web01");

        let err = apply(
            &backend,
            &vm,
            &vm.devices[0],
            BackingDescriptor::iso("DS1", "missing.iso"),
            connected(),
        )
        .await
        .unwrap_err();

        let VmhwError::Reconfig { ref vm, ref detail } = err else {
            panic!("expected reconfig error, got {err:?}");
        };
        assert_eq!(vm, "web01");
        assert!(detail.contains("ide0:0"));
    }
}
