use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "vmhw",
    about = "Reconfigure vSphere VM hardware: CD-ROM backing and disk inventory"
)]
pub struct Cli {
    /// Path to config file (default: ./vmhw.toml, then ~/.config/vmhw/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection options; each overrides the matching `[vsphere]` config value.
#[derive(Args, Debug, Default, Clone)]
pub struct ConnectionArgs {
    /// vCenter / ESXi host name
    #[arg(long, global = true, value_name = "HOST")]
    pub vsphere_host: Option<String>,

    /// HTTPS port
    #[arg(long, global = true, value_name = "PORT")]
    pub vsphere_port: Option<u16>,

    /// User name
    #[arg(long, global = true, value_name = "USER")]
    pub vsphere_user: Option<String>,

    /// Password
    #[arg(long, global = true, value_name = "PASS")]
    pub vsphere_pass: Option<String>,

    /// Accept invalid TLS certificates
    #[arg(long, global = true)]
    pub vsphere_insecure: bool,

    /// Datacenter to search
    #[arg(long, global = true, value_name = "NAME")]
    pub vsphere_dc: Option<String>,

    /// Folder to search, relative to the datacenter's VM folder
    #[arg(long, global = true, value_name = "PATH")]
    pub folder: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Attach an ISO to a VM's CD-ROM drive, or disconnect it
    Cdrom(CdromArgs),

    /// Inspect a VM's disks
    Disk {
        #[command(subcommand)]
        action: DiskCommand,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct CdromArgs {
    /// Name of the virtual machine
    #[arg(value_name = "VMNAME")]
    pub vm_name: Option<String>,

    /// The datastore for an iso source
    #[arg(long, value_name = "STORE")]
    pub datastore: Option<String>,

    /// The name and path of the ISO to attach
    #[arg(long, value_name = "ISO")]
    pub iso: Option<String>,

    /// Attach the virtual cdrom to the VM
    #[arg(short, long)]
    pub attach: bool,

    /// Disconnect the virtual cdrom from the VM
    #[arg(long)]
    pub disconnect: bool,

    /// false for detached on boot or true for attached on boot
    #[arg(long = "on_boot", visible_alias = "on-boot", value_name = "ONBOOT")]
    pub on_boot: Option<bool>,

    /// Set the backing store to client-device passthrough (with --disconnect)
    #[arg(long = "client_device", visible_alias = "client-device")]
    pub client_device: bool,

    /// Search all folders
    #[arg(short, long)]
    pub recursive: bool,
}

#[derive(Subcommand, Debug)]
pub enum DiskCommand {
    /// List the disks attached to a VM
    List(DiskListArgs),
}

#[derive(Args, Debug, Default, Clone)]
pub struct DiskListArgs {
    /// Name of the virtual machine
    #[arg(value_name = "VMNAME")]
    pub vm_name: Option<String>,

    /// Search all folders
    #[arg(short, long)]
    pub recursive: bool,
}
