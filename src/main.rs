use clap::{CommandFactory, Parser};

use vmhw::backend::vim::VimBackend;
use vmhw::backing::CdromRequest;
use vmhw::cli::{Cli, Command, DiskCommand};
use vmhw::commands;
use vmhw::config;
use vmhw::disk::DiskListRequest;
use vmhw::error::VmhwError;
use vmhw::logging;

enum Request {
    Cdrom(CdromRequest),
    DiskList(DiskListRequest),
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    let log_file = logging::init(cli.verbose);

    // Flag problems are reported before any config is read or any
    // connection is made.
    let request = match validate(&cli.command) {
        Ok(request) => request,
        Err(e) => {
            if e.is_usage() {
                print_usage(&cli.command);
            }
            return Err(e.into());
        }
    };

    let config = config::load_config(cli.config.as_deref())?.with_overrides(&cli.connection);
    config::validate_config(&config)?;

    if let Some(path) = config.log_file() {
        if let Err(e) = log_file.open(&path) {
            tracing::warn!(path = %path.display(), error = %e, "cannot open log file");
        }
    }

    let backend = VimBackend::connect(&config.vsphere).await?;
    let folder = config.vsphere.folder.as_str();

    let result = match &request {
        Request::Cdrom(request) => commands::cdrom(&backend, request, folder)
            .await
            .map(|()| Vec::new()),
        Request::DiskList(request) => commands::disk_list(&backend, request, folder).await,
    };
    backend.logout().await;

    for line in result? {
        println!("{line}");
    }
    Ok(())
}

fn validate(command: &Command) -> Result<Request, VmhwError> {
    match command {
        Command::Cdrom(args) => CdromRequest::try_from(args).map(Request::Cdrom),
        Command::Disk {
            action: DiskCommand::List(args),
        } => DiskListRequest::try_from(args).map(Request::DiskList),
    }
}

fn print_usage(command: &Command) {
    let mut cli = Cli::command();
    cli.build();
    let usage = match command {
        Command::Cdrom(_) => cli.find_subcommand_mut("cdrom").map(|c| c.render_usage()),
        Command::Disk { .. } => cli
            .find_subcommand_mut("disk")
            .and_then(|c| c.find_subcommand_mut("list"))
            .map(|c| c.render_usage()),
    };
    if let Some(usage) = usage {
        eprintln!("{usage}");
    }
}
