use std::path::{Path, PathBuf};

use facet::Facet;

use crate::cli::ConnectionArgs;
use crate::error::VmhwError;
use crate::paths;

#[derive(Debug, Clone, Default, Facet)]
#[facet(default)]
pub struct Config {
    #[facet(default)]
    pub vsphere: VsphereConfig,
    #[facet(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Facet)]
#[facet(default)]
pub struct VsphereConfig {
    #[facet(default)]
    pub host: String,
    #[facet(default = 443)]
    pub port: u16,
    #[facet(default)]
    pub user: String,
    #[facet(default)]
    pub password: String,
    #[facet(default)]
    pub insecure: bool,
    /// Datacenter to search; the first one found when unset.
    pub datacenter: Option<String>,
    /// Default folder scope, relative to the datacenter's VM folder.
    #[facet(default)]
    pub folder: String,
    /// Release segment of the VI/JSON base path (`/sdk/vim25/<release>`).
    #[facet(default = "8.0.1.0")]
    pub api_release: String,
    #[facet(default = 30)]
    pub timeout_secs: u64,
}

impl Default for VsphereConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 443,
            user: String::new(),
            password: String::new(),
            insecure: false,
            datacenter: None,
            folder: String::new(),
            api_release: "8.0.1.0".into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Facet)]
#[facet(default)]
pub struct LoggingConfig {
    /// Append debug logs to this file.
    pub file: Option<String>,
}

impl Config {
    /// Apply command-line connection options on top of the file values.
    pub fn with_overrides(mut self, args: &ConnectionArgs) -> Self {
        let vs = &mut self.vsphere;
        if let Some(ref host) = args.vsphere_host {
            vs.host = host.clone();
        }
        if let Some(port) = args.vsphere_port {
            vs.port = port;
        }
        if let Some(ref user) = args.vsphere_user {
            vs.user = user.clone();
        }
        if let Some(ref pass) = args.vsphere_pass {
            vs.password = pass.clone();
        }
        if args.vsphere_insecure {
            vs.insecure = true;
        }
        if let Some(ref dc) = args.vsphere_dc {
            vs.datacenter = Some(dc.clone());
        }
        if let Some(ref folder) = args.folder {
            vs.folder = folder.clone();
        }
        self
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.logging.file.as_deref().map(PathBuf::from)
    }
}

// ── validation ────────────────────────────────────────────

pub fn validate_config(config: &Config) -> Result<(), VmhwError> {
    let vs = &config.vsphere;
    let required = [
        ("vsphere.host", &vs.host, "--vsphere-host"),
        ("vsphere.user", &vs.user, "--vsphere-user"),
        ("vsphere.password", &vs.password, "--vsphere-pass"),
    ];
    for (field, value, flag) in required {
        if value.trim().is_empty() {
            return Err(VmhwError::Validation {
                message: format!("{field} must be set (in the config file or with {flag})"),
            });
        }
    }
    if vs.port == 0 {
        return Err(VmhwError::Validation {
            message: "vsphere.port must not be 0".into(),
        });
    }
    if vs.timeout_secs == 0 {
        return Err(VmhwError::Validation {
            message: "vsphere.timeout_secs must be at least 1".into(),
        });
    }
    if vs.api_release.trim().is_empty() || vs.api_release.contains('/') {
        return Err(VmhwError::Validation {
            message: format!(
                "vsphere.api_release must be a release like 8.0.1.0 (got '{}')",
                vs.api_release
            ),
        });
    }
    if vs.datacenter.as_deref().is_some_and(str::is_empty) {
        return Err(VmhwError::Validation {
            message: "vsphere.datacenter must not be empty when set".into(),
        });
    }
    Ok(())
}

// ── public API ────────────────────────────────────────────

/// Parse a config file.
pub fn parse_config(path: &Path) -> Result<Config, VmhwError> {
    let contents = std::fs::read_to_string(path).map_err(|source| VmhwError::ConfigLoad {
        path: path.display().to_string(),
        source,
    })?;

    facet_toml::from_str(&contents).map_err(|e| VmhwError::ConfigParse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Load the config: the explicit `--config` path if given (it must exist),
/// otherwise the first default location that exists, otherwise defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, VmhwError> {
    if let Some(path) = explicit {
        return parse_config(path);
    }

    match paths::default_config_files().into_iter().find(|p| p.is_file()) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "using config file");
            parse_config(&path)
        }
        None => {
            tracing::debug!("no config file found, using defaults");
            Ok(Config::default())
        }
    }
}
