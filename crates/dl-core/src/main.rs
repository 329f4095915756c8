//! data-logger: receive data samples over HTTP and log them to a data file.

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use dl_config::{resolve_config, ConfigOverrides, LoggerConfig};
use dl_core::link::{descriptor_for, link_code};
use dl_core::logging::{init_logging, LogFormat};
use dl_core::{IngestServer, IngestService, Result};
use dl_linkcode::{ConnectionDescriptor, SystemAddressSource};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "data-logger")]
#[command(author, version, about = "Log data samples posted over HTTP", long_about = None)]
struct Cli {
    /// Configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Data file to append samples to
    #[arg(long, global = true)]
    file: Option<PathBuf>,

    /// Cell separator (single character, or "tab")
    #[arg(long, global = true)]
    separator: Option<String>,

    /// Path the ingestion endpoint answers on
    #[arg(long, global = true)]
    path: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the link code and serve samples (default)
    Serve,

    /// Print the link code and exit
    LinkCode,

    /// Decode a link code and print it as JSON
    Decode {
        /// Base64 link code
        code: String,
    },
}

impl Cli {
    fn verbosity(&self) -> i8 {
        if self.quiet {
            -1
        } else {
            self.verbose.min(i8::MAX as u8) as i8
        }
    }

    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_file: self.config.clone(),
            port: self.port,
            data_file: self.file.clone(),
            separator: self.separator.clone(),
            ingest_path: self.path.clone(),
        }
    }
}

fn main() -> process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.verbosity());

    let result = match &cli.command {
        None | Some(Commands::Serve) => run_serve(&cli),
        Some(Commands::LinkCode) => run_link_code(&cli),
        Some(Commands::Decode { code }) => run_decode(code),
    };

    match result {
        Ok(()) => dl_core::ExitCode::Clean.into(),
        Err(e) => {
            error!(error = %e, code = e.code(), "data-logger failed");
            eprintln!("data-logger: {e}");
            e.exit_code().into()
        }
    }
}

fn advertise(config: &LoggerConfig) -> Result<ConnectionDescriptor> {
    let descriptor = descriptor_for(config, &SystemAddressSource);
    let code = link_code(config, &descriptor)?;
    println!("Link code: {code}");
    for addr in &descriptor.addresses {
        info!(%addr, port = descriptor.port, path = %descriptor.path, "listening on");
    }
    Ok(descriptor)
}

fn run_serve(cli: &Cli) -> Result<()> {
    let config = resolve_config(&cli.overrides())?;

    println!("Sprout Data Logger v{}", env!("CARGO_PKG_VERSION"));
    advertise(&config)?;
    info!(file = %config.data_file.display(), "saving data to");

    let service = IngestService::open(
        &config.data_file,
        config.separator,
        config.strict_values,
        config.ingest_path.clone(),
    )?;
    let server = IngestServer::bind(&format!("0.0.0.0:{}", config.port), service)?;
    server.run()
}

fn run_link_code(cli: &Cli) -> Result<()> {
    let config = resolve_config(&cli.overrides())?;
    advertise(&config)?;
    Ok(())
}

fn run_decode(code: &str) -> Result<()> {
    let descriptor = ConnectionDescriptor::from_text(code.trim())?;
    println!("{}", serde_json::to_string_pretty(&descriptor)?);
    Ok(())
}
