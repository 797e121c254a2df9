use std::{error::Error, path::PathBuf};

use clap::Parser;
use livestatus::pipe::{self, EndpointOptions};

#[derive(Debug, Parser)]
#[command(version, about = "Send an external command to a monitoring daemon", long_about = None)]
struct Cli {
    /// Host running the daemon; the local command pipe is used when unset
    #[arg(long, env = "ICINGA_CMD_HOST")]
    host: Option<String>,
    /// SSH port of the remote host [default: 22]
    #[arg(long, env = "ICINGA_CMD_PORT")]
    port: Option<u16>,
    /// User to log in as on the remote host
    #[arg(long, env = "ICINGA_CMD_USER")]
    user: Option<String>,
    /// Path of the command pipe [default: /usr/local/icinga/var/rw/icinga.cmd]
    #[arg(long, env = "ICINGA_CMD_PATH")]
    path: Option<PathBuf>,
    /// External command, e.g. `SCHEDULE_FORCED_HOST_CHECK;web01;1700000000`
    command: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let cli = Cli::parse();
    let transport = pipe::select(&EndpointOptions {
        host: cli.host,
        port: cli.port,
        user: cli.user,
        path: cli.path,
    });

    transport.send(&cli.command)?;
    Ok(())
}
