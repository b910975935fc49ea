use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum VmhwError {
    #[error("{message}")]
    #[diagnostic(code(vmhw::usage))]
    Usage { message: String },

    #[error("VM {name} not found in {scope}")]
    #[diagnostic(code(vmhw::not_found))]
    NotFound { name: String, scope: String },

    #[error("datacenter {name} not found")]
    #[diagnostic(code(vmhw::datacenter_not_found), help("check vsphere.datacenter / --vsphere-dc"))]
    DatacenterNotFound { name: String },

    #[error("folder '{path}' not found")]
    #[diagnostic(code(vmhw::folder_not_found))]
    FolderNotFound { path: String },

    #[error("More than one VM with name {name} found:\n{}", .paths.join("\n"))]
    #[diagnostic(
        code(vmhw::ambiguous),
        help("pass --folder instead of --recursive to pick one")
    )]
    Ambiguous { name: String, paths: Vec<String> },

    #[error("Could not find a {kind} on VM {vm}")]
    #[diagnostic(code(vmhw::device_not_found))]
    DeviceNotFound { kind: String, vm: String },

    #[error("reconfiguration of VM {vm} failed: {detail}")]
    #[diagnostic(code(vmhw::reconfig))]
    Reconfig { vm: String, detail: String },

    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config from {path}: {message}")]
    ConfigParse { path: String, message: String },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("connection to {host} failed: {message}")]
    #[diagnostic(help("check vsphere.host / vsphere.port and that the endpoint speaks the VI/JSON API"))]
    Connection { host: String, message: String },

    #[error("authentication failed: {message}")]
    #[diagnostic(help("check vsphere.user and vsphere.password"))]
    Authentication { message: String },

    #[error("vSphere API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response from {context}: {message}")]
    Parse { context: String, message: String },
}

impl VmhwError {
    pub(crate) fn usage(message: impl Into<String>) -> Self {
        VmhwError::Usage {
            message: message.into(),
        }
    }

    pub fn is_usage(&self) -> bool {
        matches!(self, VmhwError::Usage { .. })
    }
}
