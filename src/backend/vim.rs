//! [`Backend`] over the vSphere VI/JSON API.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use indicatif::ProgressBar;

use super::session::{ManagedObjects, VimSession};
use super::wire::{MoRef, ReconfigureRequest, TaskInfo, TaskState, VmConfigInfo};
use super::{Backend, TaskOutcome, TaskRef};
use crate::config::VsphereConfig;
use crate::error::VmhwError;
use crate::inventory::{Folder, VirtualMachine, VmRef};
use crate::reconfig::ConfigChangeRequest;

const FOLDER: &str = "Folder";
const DATACENTER: &str = "Datacenter";
const VIRTUAL_MACHINE: &str = "VirtualMachine";
const TASK: &str = "Task";

const TASK_POLL_INTERVAL: Duration = Duration::from_secs(1);

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

pub struct VimBackend<S = VimSession> {
    session: S,
    session_manager: MoRef,
    vm_folder: MoRef,
    /// Inventory path of `vm_folder`, e.g. `DC1/vm`.
    vm_root: String,
    poll_interval: Duration,
}

impl VimBackend<VimSession> {
    /// Log in and locate the datacenter's VM folder.
    pub async fn connect(config: &VsphereConfig) -> Result<Self, VmhwError> {
        let mut session = VimSession::new(config)?;
        let content = session.service_content().await?;
        session
            .login(&content.session_manager, &config.user, &config.password)
            .await?;

        match locate_vm_folder(&session, &content.root_folder, config.datacenter.as_deref()).await
        {
            Ok((vm_folder, vm_root)) => {
                tracing::debug!(root = %vm_root, "using VM folder");
                Ok(Self {
                    session,
                    session_manager: content.session_manager,
                    vm_folder,
                    vm_root,
                    poll_interval: TASK_POLL_INTERVAL,
                })
            }
            Err(e) => {
                session.logout(&content.session_manager).await;
                Err(e)
            }
        }
    }

    pub async fn logout(mut self) {
        self.session.logout(&self.session_manager).await;
    }
}

impl<S: ManagedObjects> VimBackend<S> {
    async fn name_of(&self, object: &MoRef) -> Result<String, VmhwError> {
        self.session.get(object, "name").await
    }

    async fn children(&self, folder: &MoRef) -> Result<Vec<MoRef>, VmhwError> {
        children(&self.session, folder).await
    }

    /// Pre-order walk collecting every VM named `name` below `folder`.
    fn collect_named<'a>(
        &'a self,
        folder: MoRef,
        path: String,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Vec<VmRef>, VmhwError>> {
        Box::pin(async move {
            let mut found = Vec::new();
            for child in self.children(&folder).await? {
                if child.is(VIRTUAL_MACHINE) {
                    let child_name = self.name_of(&child).await?;
                    if child_name == name {
                        found.push(VmRef {
                            path: format!("{path}/{child_name}"),
                            id: child.value,
                            name: child_name,
                        });
                    }
                } else if child.is(FOLDER) {
                    let child_name = self.name_of(&child).await?;
                    let child_path = format!("{path}/{child_name}");
                    found.extend(self.collect_named(child, child_path, name).await?);
                }
            }
            Ok(found)
        })
    }
}

async fn children<S: ManagedObjects>(
    session: &S,
    folder: &MoRef,
) -> Result<Vec<MoRef>, VmhwError> {
    let children: Option<Vec<MoRef>> = session.get(folder, "childEntity").await?;
    Ok(children.unwrap_or_default())
}

/// Find the datacenter (the named one, or the first) and return its VM
/// folder together with that folder's inventory path.
async fn locate_vm_folder<S: ManagedObjects>(
    session: &S,
    root_folder: &MoRef,
    wanted: Option<&str>,
) -> Result<(MoRef, String), VmhwError> {
    let (datacenter, dc_name) = find_datacenter(session, root_folder.clone(), wanted)
        .await?
        .ok_or_else(|| VmhwError::DatacenterNotFound {
            name: wanted.unwrap_or("(any)").to_string(),
        })?;

    let vm_folder: MoRef = session.get(&datacenter, "vmFolder").await?;
    let folder_name: String = session.get(&vm_folder, "name").await?;
    Ok((vm_folder, format!("{dc_name}/{folder_name}")))
}

fn find_datacenter<'a, S: ManagedObjects>(
    session: &'a S,
    folder: MoRef,
    wanted: Option<&'a str>,
) -> BoxFuture<'a, Result<Option<(MoRef, String)>, VmhwError>> {
    Box::pin(async move {
        for child in children(session, &folder).await? {
            if child.is(DATACENTER) {
                let name: String = session.get(&child, "name").await?;
                if wanted.is_none_or(|w| w == name) {
                    return Ok(Some((child, name)));
                }
            } else if child.is(FOLDER) {
                if let Some(found) = find_datacenter(session, child, wanted).await? {
                    return Ok(Some(found));
                }
            }
        }
        Ok(None)
    })
}

impl<S: ManagedObjects> Backend for VimBackend<S> {
    async fn find_folder(&self, path: &str) -> Result<Folder, VmhwError> {
        let mut current = self.vm_folder.clone();
        let mut full_path = self.vm_root.clone();

        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let mut next = None;
            for child in self.children(&current).await? {
                if child.is(FOLDER) && self.name_of(&child).await? == segment {
                    next = Some(child);
                    break;
                }
            }
            current = next.ok_or_else(|| VmhwError::FolderNotFound {
                path: path.to_string(),
            })?;
            full_path.push('/');
            full_path.push_str(segment);
        }

        Ok(Folder {
            id: current.value,
            path: full_path,
        })
    }

    async fn find_in_folder(
        &self,
        folder: &Folder,
        name: &str,
    ) -> Result<Option<VmRef>, VmhwError> {
        let folder_ref = MoRef {
            kind: FOLDER.into(),
            value: folder.id.clone(),
        };
        for child in self.children(&folder_ref).await? {
            if child.is(VIRTUAL_MACHINE) && self.name_of(&child).await? == name {
                return Ok(Some(VmRef {
                    id: child.value,
                    name: name.to_string(),
                    path: format!("{}/{name}", folder.path),
                }));
            }
        }
        Ok(None)
    }

    async fn find_all(&self, name: &str) -> Result<Vec<VmRef>, VmhwError> {
        self.collect_named(self.vm_folder.clone(), self.vm_root.clone(), name)
            .await
    }

    async fn load_vm(&self, vm: &VmRef) -> Result<VirtualMachine, VmhwError> {
        let object = MoRef {
            kind: VIRTUAL_MACHINE.into(),
            value: vm.id.clone(),
        };
        let config: Option<VmConfigInfo> = self.session.get(&object, "config").await?;
        let config = config.ok_or_else(|| VmhwError::Parse {
            context: format!("VirtualMachine.config of {}", vm.path),
            message: "VM has no configuration (is it still being created?)".into(),
        })?;

        Ok(VirtualMachine {
            id: vm.id.clone(),
            name: vm.name.clone(),
            path: vm.path.clone(),
            devices: config.hardware.device.into_iter().map(Into::into).collect(),
        })
    }

    async fn reconfigure(
        &self,
        vm: &VirtualMachine,
        change: &ConfigChangeRequest,
    ) -> Result<TaskRef, VmhwError> {
        let object = MoRef {
            kind: VIRTUAL_MACHINE.into(),
            value: vm.id.clone(),
        };
        let body = ReconfigureRequest::try_from(change)?;
        let task: MoRef = self
            .session
            .invoke(&object, "ReconfigVM_Task", &body)
            .await?;
        Ok(TaskRef { id: task.value })
    }

    async fn wait_for_task(&self, task: &TaskRef) -> Result<TaskOutcome, VmhwError> {
        let object = MoRef {
            kind: TASK.into(),
            value: task.id.clone(),
        };

        let spinner = ProgressBar::new_spinner();
        spinner.set_message(format!("Waiting for task {}...", task.id));
        spinner.enable_steady_tick(Duration::from_millis(120));

        loop {
            let info: TaskInfo = match self.session.get(&object, "info").await {
                Ok(info) => info,
                Err(e) => {
                    spinner.finish_and_clear();
                    return Err(e);
                }
            };
            match info.state {
                TaskState::Success => {
                    spinner.finish_and_clear();
                    return Ok(TaskOutcome::Succeeded);
                }
                TaskState::Error => {
                    spinner.finish_and_clear();
                    let detail = info
                        .error
                        .map(|fault| fault.detail())
                        .unwrap_or_else(|| "task failed without detail".to_string());
                    return Ok(TaskOutcome::Failed(detail));
                }
                TaskState::Queued | TaskState::Running => {
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }
}
