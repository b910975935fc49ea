use std::path::PathBuf;

/// Config file looked up in the working directory: `./vmhw.toml`
pub fn local_config_file() -> PathBuf {
    PathBuf::from("vmhw.toml")
}

/// Per-user config file: `~/.config/vmhw/config.toml`
pub fn user_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("vmhw").join("config.toml"))
}

/// Config locations tried, in order, when `--config` is not given.
pub fn default_config_files() -> Vec<PathBuf> {
    let mut files = vec![local_config_file()];
    files.extend(user_config_file());
    files
}
