//! In-memory backend for tests. Records every call it receives.

use std::sync::Mutex;

use super::{Backend, TaskOutcome, TaskRef};
use crate::device::HardwareDevice;
use crate::error::VmhwError;
use crate::inventory::{Folder, VirtualMachine, VmRef};
use crate::reconfig::ConfigChangeRequest;

/// Inventory path of the fake datacenter's VM folder.
pub const VM_ROOT: &str = "DC1/vm";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FindFolder(String),
    FindInFolder(String, String),
    FindAll(String),
    LoadVm(String),
    Reconfigure(String, ConfigChangeRequest),
    WaitForTask(String),
}

pub struct FakeBackend {
    vms: Vec<VirtualMachine>,
    outcome: TaskOutcome,
    calls: Mutex<Vec<Call>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            vms: Vec::new(),
            outcome: TaskOutcome::Succeeded,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Add a VM at a full inventory path such as `DC1/vm/prod/web01`.
    pub fn with_vm(mut self, path: &str, devices: Vec<HardwareDevice>) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        self.vms.push(VirtualMachine {
            id: format!("vm-{}", self.vms.len() + 1),
            name,
            path: path.to_string(),
            devices,
        });
        self
    }

    pub fn with_task_outcome(mut self, outcome: TaskOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn vm(&self, path: &str) -> VirtualMachine {
        self.vms
            .iter()
            .find(|vm| vm.path == path)
            .cloned()
            .unwrap_or_else(|| panic!("no fake VM at {path}"))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn to_ref(vm: &VirtualMachine) -> VmRef {
        VmRef {
            id: vm.id.clone(),
            name: vm.name.clone(),
            path: vm.path.clone(),
        }
    }
}

fn parent(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}

impl Backend for FakeBackend {
    async fn find_folder(&self, path: &str) -> Result<Folder, VmhwError> {
        self.record(Call::FindFolder(path.to_string()));
        let full = if path.is_empty() {
            VM_ROOT.to_string()
        } else {
            format!("{VM_ROOT}/{}", path.trim_matches('/'))
        };
        let exists = full == VM_ROOT
            || self
                .vms
                .iter()
                .any(|vm| vm.path.starts_with(&format!("{full}/")));
        if !exists {
            return Err(VmhwError::FolderNotFound {
                path: path.to_string(),
            });
        }
        Ok(Folder {
            id: format!("group-{full}"),
            path: full,
        })
    }

    async fn find_in_folder(
        &self,
        folder: &Folder,
        name: &str,
    ) -> Result<Option<VmRef>, VmhwError> {
        self.record(Call::FindInFolder(folder.path.clone(), name.to_string()));
        Ok(self
            .vms
            .iter()
            .find(|vm| vm.name == name && parent(&vm.path) == folder.path)
            .map(Self::to_ref))
    }

    async fn find_all(&self, name: &str) -> Result<Vec<VmRef>, VmhwError> {
        self.record(Call::FindAll(name.to_string()));
        Ok(self
            .vms
            .iter()
            .filter(|vm| vm.name == name)
            .map(Self::to_ref)
            .collect())
    }

    async fn load_vm(&self, vm: &VmRef) -> Result<VirtualMachine, VmhwError> {
        self.record(Call::LoadVm(vm.id.clone()));
        Ok(self.vm(&vm.path))
    }

    async fn reconfigure(
        &self,
        vm: &VirtualMachine,
        change: &ConfigChangeRequest,
    ) -> Result<TaskRef, VmhwError> {
        self.record(Call::Reconfigure(vm.id.clone(), change.clone()));
        Ok(TaskRef {
            id: "task-1".into(),
        })
    }

    async fn wait_for_task(&self, task: &TaskRef) -> Result<TaskOutcome, VmhwError> {
        self.record(Call::WaitForTask(task.id.clone()));
        Ok(self.outcome.clone())
    }
}
