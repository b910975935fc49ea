//! Locating a VM by name in the inventory.
//!
//! A folder scope looks at the direct children of one folder. A recursive
//! scope walks the whole datacenter and refuses to choose when the name is
//! not unique.

use std::fmt;

use crate::backend::Backend;
use crate::device::HardwareDevice;
use crate::error::VmhwError;

/// A VM found by an inventory search, before its hardware is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmRef {
    /// Managed object id, e.g. `vm-42`.
    pub id: String,
    pub name: String,
    /// Full inventory path, e.g. `DC1/vm/prod/web01`.
    pub path: String,
}

/// A resolved VM with its hardware list in service order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualMachine {
    pub id: String,
    pub name: String,
    pub path: String,
    pub devices: Vec<HardwareDevice>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    pub id: String,
    /// Full inventory path, e.g. `DC1/vm/prod`.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Direct children of the folder at this path, relative to the VM folder.
    Folder(String),
    /// Every folder of the datacenter.
    Recursive,
}

impl Scope {
    pub fn new(recursive: bool, folder: &str) -> Self {
        if recursive {
            Scope::Recursive
        } else {
            Scope::Folder(folder.to_string())
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Folder(path) if path.is_empty() => f.write_str("the root VM folder"),
            Scope::Folder(path) => write!(f, "folder '{path}'"),
            Scope::Recursive => f.write_str("any folder"),
        }
    }
}

/// Resolve `name` to exactly one VM in `scope` and load its hardware.
pub async fn resolve<B: Backend>(
    backend: &B,
    name: &str,
    scope: &Scope,
) -> Result<VirtualMachine, VmhwError> {
    let not_found = || VmhwError::NotFound {
        name: name.to_string(),
        scope: scope.to_string(),
    };

    let vm_ref = match scope {
        Scope::Folder(path) => {
            let folder = backend.find_folder(path).await?;
            backend
                .find_in_folder(&folder, name)
                .await?
                .ok_or_else(not_found)?
        }
        Scope::Recursive => {
            let mut matches = backend.find_all(name).await?;
            if matches.len() > 1 {
                return Err(VmhwError::Ambiguous {
                    name: name.to_string(),
                    paths: matches.into_iter().map(|vm| vm.path).collect(),
                });
            }
            matches.pop().ok_or_else(not_found)?
        }
    };

    tracing::debug!(vm = %vm_ref.name, path = %vm_ref.path, id = %vm_ref.id, "resolved VM");
    backend.load_vm(&vm_ref).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::{Call, FakeBackend};

    #[tokio::test]
    async fn folder_scope_finds_vm() {
        let backend = FakeBackend::new()
            .with_vm("DC1/vm/prod/web01", vec![])
            .with_vm("DC1/vm/web01", vec![]);

        let vm = resolve(&backend, "web01", &Scope::Folder("prod".into()))
            .await
            .unwrap();
        assert_eq!(vm.path, "DC1/vm/prod/web01");
        assert_eq!(
            backend.calls(),
            vec![
                Call::FindFolder("prod".into()),
                Call::FindInFolder("DC1/vm/prod".into(), "web01".into()),
                Call::LoadVm(vm.id.clone()),
            ]
        );
    }

    #[tokio::test]
    async fn folder_scope_is_not_recursive() {
        let backend = FakeBackend::new().with_vm("DC1/vm/prod/web01", vec![]);

        let err = resolve(&backend, "web01", &Scope::Folder(String::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, VmhwError::NotFound { .. }));
        assert_eq!(err.to_string(), "VM web01 not found in the root VM folder");
    }

    #[tokio::test]
    async fn unknown_folder_fails() {
        let backend = FakeBackend::new().with_vm("DC1/vm/prod/web01", vec![]);

        let err = resolve(&backend, "web01", &Scope::Folder("staging".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, VmhwError::FolderNotFound { .. }));
    }

    #[tokio::test]
    async fn recursive_zero_matches_is_not_found() {
        let backend = FakeBackend::new().with_vm("DC1/vm/prod/db01", vec![]);

        let err = resolve(&backend, "web01", &Scope::Recursive)
            .await
            .unwrap_err();
        assert!(matches!(err, VmhwError::NotFound { .. }));
        assert!(err.to_string().contains("web01"));
        assert!(!backend.calls().iter().any(|c| matches!(c, Call::LoadVm(_))));
    }

    #[tokio::test]
    async fn recursive_single_match_resolves() {
        let backend = FakeBackend::new()
            .with_vm("DC1/vm/prod/db01", vec![])
            .with_vm("DC1/vm/dev/web01", vec![]);

        let vm = resolve(&backend, "web01", &Scope::Recursive).await.unwrap();
        assert_eq!(vm.path, "DC1/vm/dev/web01");
    }

    #[tokio::test]
    async fn recursive_multiple_matches_is_ambiguous() {
        let backend = FakeBackend::new()
            .with_vm("DC1/vm/prod/web01", vec![])
            .with_vm("DC1/vm/db01", vec![])
            .with_vm("DC1/vm/dev/web01", vec![])
            .with_vm("DC1/vm/web01", vec![]);

        let err = resolve(&backend, "web01", &Scope::Recursive)
            .await
            .unwrap_err();
        let VmhwError::Ambiguous { ref paths, .. } = err else {
            panic!("expected ambiguous, got {err:?}");
        };
        assert_eq!(
            paths,
            &["DC1/vm/prod/web01", "DC1/vm/dev/web01", "DC1/vm/web01"]
        );
        assert_eq!(
            err.to_string(),
            "More than one VM with name web01 found:\n\
             DC1/vm/prod/web01\nDC1/vm/dev/web01\nDC1/vm/web01"
        );
        assert!(!backend.calls().iter().any(|c| matches!(c, Call::LoadVm(_))));
    }

    #[test]
    fn scope_from_flags() {
        assert_eq!(Scope::new(true, "prod"), Scope::Recursive);
        assert_eq!(Scope::new(false, "prod"), Scope::Folder("prod".into()));
    }
}
