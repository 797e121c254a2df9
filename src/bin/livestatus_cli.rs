use std::{
    error::Error,
    io,
    process,
    sync::{Arc, Mutex},
    time::Duration,
};

use clap::Parser;
use livestatus::{
    Command, Connection, Timeouts,
    cli::{print_rows, prompt},
    protocol::{AbortHandle, TABLES},
};
use log::warn;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Livestatus endpoint, a socket path or tcp://host:port
    #[arg(
        short,
        long,
        env = "LIVESTATUS_SOCKET",
        default_value = "/var/lib/icinga/rw/live"
    )]
    socket: String,
    /// Connect, read and write timeout in seconds; 0 waits forever
    #[arg(long, env = "LIVESTATUS_TIMEOUT", default_value_t = 30)]
    timeout: u64,
}

type Pending = Arc<Mutex<Option<AbortHandle>>>;

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize env_logger; For logging to STDOUT/STDERR
    env_logger::init();

    let cli = Cli::parse();
    let timeouts = match cli.timeout {
        0 => Timeouts::default(),
        secs => Timeouts::uniform(Duration::from_secs(secs)),
    };
    let mut conn = Connection::new(&cli.socket)?.with_timeouts(timeouts);

    // Ctrl-C aborts the running query, or leaves when idle
    let pending = Pending::default();
    let handler = Arc::clone(&pending);
    ctrlc::set_handler(move || {
        let aborted = match handler.lock() {
            Ok(guard) => guard.as_ref().map(|handle| handle.abort()),
            Err(_) => None,
        };
        match aborted {
            Some(Ok(())) => {}
            Some(Err(e)) => warn!("failed to abort query: {e}"),
            None => process::exit(130),
        }
    })?;

    let stdin = io::stdin();
    let stdout = io::stdout();

    loop {
        let Some(line) = prompt(stdin.lock(), stdout.lock())? else {
            break;
        };
        if line.is_empty() {
            continue;
        }

        let cmd = match Command::try_from(line.as_str()) {
            Ok(cmd) => cmd,
            Err(e) => {
                eprintln!("error: {e}");
                continue;
            }
        };
        if cmd == Command::Exit {
            break;
        }

        if let Err(e) = execute(&mut conn, cmd, &pending) {
            eprintln!("query error: {e}");
        }
    }

    conn.disconnect();
    Ok(())
}

fn execute(conn: &mut Connection, cmd: Command, pending: &Pending) -> Result<(), Box<dyn Error>> {
    match cmd {
        Command::Exit => Ok(()),
        Command::Tables => {
            for table in TABLES {
                println!("{table}");
            }
            Ok(())
        }
        Command::Get(query) => {
            let rows = guarded(conn, pending, |conn| conn.fetch_all(&query))?;
            print_rows(io::stdout().lock(), rows)?;
            Ok(())
        }
        Command::Count(query) => {
            let count = guarded(conn, pending, |conn| conn.count(&query))?;
            println!("{count}");
            Ok(())
        }
        Command::Pairs(query) => {
            let pairs = guarded(conn, pending, |conn| conn.fetch_pairs(&query))?;
            for (key, value) in pairs {
                println!("{key}\t{value}");
            }
            Ok(())
        }
    }
}

/// Runs `f` with an abort handle for the connection published to the
/// Ctrl-C handler.
fn guarded<T>(
    conn: &mut Connection,
    pending: &Pending,
    f: impl FnOnce(&mut Connection) -> livestatus::Result<T>,
) -> livestatus::Result<T> {
    conn.connect()?;
    let handle = conn.abort_handle()?;
    if let Ok(mut guard) = pending.lock() {
        *guard = handle;
    }

    let result = f(conn);

    if let Ok(mut guard) = pending.lock() {
        *guard = None;
    }
    result
}
