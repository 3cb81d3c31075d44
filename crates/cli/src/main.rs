//! ARMv6-M simulator CLI.
//!
//! This binary is the single entry point for debug sessions. It performs:
//! 1. **Setup:** Parses flags, reads the optional JSON config, and installs logging.
//! 2. **Loading:** Builds the memory map and loads the ELF or raw image.
//! 3. **Session:** Serves GDB over TCP or a serial line until the program exits or GDB leaves.

mod args;

use std::error::Error;
use std::process;
use std::time::Duration;

use clap::{CommandFactory, Parser, error::ErrorKind};
use tracing_subscriber::EnvFilter;

use pinkysim_core::Simulator;
use pinkysim_core::config::Config;
use pinkysim_core::gdb::{Comm, GdbStub, SessionEnd, TcpComm};

use crate::args::{COPYRIGHT, Cli};

fn main() {
    let cli = Cli::try_parse().unwrap_or_else(|err| {
        if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
            err.exit();
        }
        eprintln!("{err}");
        eprintln!("{}", Cli::command().render_usage());
        eprintln!();
        eprintln!("{COPYRIGHT}");
        process::exit(1);
    });

    init_logging(cli.trace);

    match run(&cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("\n[!] FATAL: {e}");
            process::exit(1);
        }
    }
}

/// Installs the `tracing` subscriber; `RUST_LOG` overrides the default filter.
fn init_logging(trace: bool) {
    let default = if trace {
        "info,pinkysim_core::sim=trace"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the image and serves one debug session.
///
/// # Returns
///
/// The process exit code: the program's semihosting exit code, or 0 when
/// GDB killed, detached, or disconnected.
fn run(cli: &Cli) -> Result<i32, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    cli.apply(&mut config);

    let mut sim = Simulator::from_config(&config)?.with_command_line(cli.command_line());
    let _ = sim.load_file(&cli.image)?;
    tracing::info!(
        regions = config.memory.regions.len(),
        pc = format_args!("{:#010x}", sim.context.pc),
        sp = format_args!("{:#010x}", sim.context.sp),
        "simulator ready"
    );

    let timeout = config.gdb.receive_timeout_ms.map(Duration::from_millis);
    if let Some(serial) = &config.gdb.serial {
        #[cfg(unix)]
        {
            let comm = pinkysim_core::gdb::SerialComm::open(
                std::path::Path::new(&serial.device),
                serial.baud,
                timeout,
            )?;
            tracing::info!(device = %serial.device, baud = serial.baud, "serial transport open");
            return serve(sim, comm, &config);
        }
        #[cfg(not(unix))]
        return Err(format!("serial transport to {} needs a unix host", serial.device).into());
    }

    let comm = TcpComm::bind(config.gdb.port)?
        .with_read_timeout(timeout)
        .with_wait_callback(|port| tracing::info!("waiting for GDB on port {port}"));
    serve(sim, comm, &config)
}

fn serve<C: Comm>(
    sim: Simulator,
    comm: C,
    config: &Config,
) -> Result<i32, Box<dyn Error>> {
    let mut stub = GdbStub::new(sim, comm, config.gdb.packet_size)
        .break_on_start(config.general.break_on_start);
    let end = stub.run()?;
    tracing::info!(
        ?end,
        checksum_failures = stub.engine().checksum_failures,
        retransmits = stub.engine().retransmits,
        "session ended"
    );
    if config.general.print_stats {
        stub.simulator().stats.print();
        println!();
        stub.simulator().context.dump();
    }
    Ok(match end {
        SessionEnd::Exited(code) => code,
        SessionEnd::Killed | SessionEnd::Detached | SessionEnd::Disconnected => 0,
    })
}
