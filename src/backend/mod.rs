//! The remote side of the workflow.
//!
//! Core code only talks to the virtualization service through [`Backend`],
//! which is passed explicitly so it can be swapped for an in-memory fake.

mod session;
pub mod vim;
mod wire;

#[cfg(test)]
pub(crate) mod fake;

use crate::error::VmhwError;
use crate::inventory::{Folder, VirtualMachine, VmRef};
use crate::reconfig::ConfigChangeRequest;

/// Handle of an in-flight remote task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRef {
    pub id: String,
}

/// Terminal state of a remote task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded,
    /// Failure detail as reported by the service.
    Failed(String),
}

#[allow(async_fn_in_trait)] // trait is internal-only
pub trait Backend {
    /// Look up a folder by path relative to the datacenter's VM folder.
    async fn find_folder(&self, path: &str) -> Result<Folder, VmhwError>;

    /// Direct child VM of `folder` named exactly `name`.
    async fn find_in_folder(&self, folder: &Folder, name: &str)
    -> Result<Option<VmRef>, VmhwError>;

    /// Every VM named `name` anywhere in the datacenter, in discovery order.
    async fn find_all(&self, name: &str) -> Result<Vec<VmRef>, VmhwError>;

    /// Read the VM's hardware list.
    async fn load_vm(&self, vm: &VmRef) -> Result<VirtualMachine, VmhwError>;

    /// Submit a configuration change; returns the task tracking it.
    async fn reconfigure(
        &self,
        vm: &VirtualMachine,
        change: &ConfigChangeRequest,
    ) -> Result<TaskRef, VmhwError>;

    /// Block until `task` succeeds or fails.
    async fn wait_for_task(&self, task: &TaskRef) -> Result<TaskOutcome, VmhwError>;
}
