//! # cpp-delegate-cli
//!
//! Command-line tool for cpp-delegate projects.
//!
//! ## Commands
//!
//! - `cppd catalog` - List the attributes and functions exposed by an AST
//! - `cppd search` - Find catalog entries by name
//! - `cppd generate remote` - Write `AddressOf.h` and `MemberHeader.h`
//! - `cppd generate host` - Write the Rust bindings module
//! - `cppd get`, `cppd set`, `cppd call` - Talk to a device through a TCP byte bridge
//!
//! See `cppd --help` for the full command reference.

use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process;

mod commands;
mod config;
mod telemetry;
mod ui;

#[derive(Parser)]
#[command(name = "cppd")]
#[command(about = "cpp-delegate CLI - Inspect, generate and drive remote C++ contexts", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to cpp-delegate.toml configuration file
    #[arg(short, long, global = true, default_value = "cpp-delegate.toml")]
    config: String,

    /// Path to the AST dump (overrides project.ast)
    #[arg(long, global = true, env = "CPPD_AST")]
    ast: Option<PathBuf>,

    /// Namespace to expose (overrides project.namespace)
    #[arg(short, long, global = true)]
    namespace: Option<String>,

    /// Enable verbose output
    #[arg(long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List attribute and function descriptors with their opcodes
    Catalog {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find attributes and functions whose name contains QUERY
    Search {
        query: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Code generation commands
    #[command(subcommand)]
    Generate(GenerateCommands),

    /// Read an attribute from the device
    Get {
        name: String,

        #[command(flatten)]
        connection: ConnectArgs,
    },

    /// Write an attribute on the device
    Set {
        name: String,

        /// One value for scalars, one per element for arrays
        #[arg(required = true, allow_hyphen_values = true)]
        values: Vec<String>,

        #[command(flatten)]
        connection: ConnectArgs,
    },

    /// Call a function on the device
    Call {
        name: String,

        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,

        #[command(flatten)]
        connection: ConnectArgs,
    },
}

#[derive(Subcommand)]
enum GenerateCommands {
    /// Write the remote C++ headers
    Remote {
        /// Output directory (overrides remote.output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the host Rust bindings
    Host {
        /// Output file (overrides host.output)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct ConnectArgs {
    /// host:port of the TCP byte bridge (overrides connection.address)
    #[arg(long, env = "CPPD_CONNECT")]
    connect: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    telemetry::init(telemetry::TelemetryConfig::new(cli.verbose).with_json_logs(cli.json_logs))?;

    let mut config = config::CppDelegateConfig::load_optional(&cli.config)?.unwrap_or_default();
    if let Some(ast) = cli.ast {
        config.project.ast = Some(ast);
    }
    if let Some(namespace) = cli.namespace {
        config.project.namespace = namespace;
    }
    config.validate()?;

    let project = commands::Project::load(config)?;
    match command {
        Commands::Catalog { json } => commands::catalog::show(&project, json),
        Commands::Search { query, json } => commands::catalog::search(&project, &query, json),
        Commands::Generate(GenerateCommands::Remote { output }) => {
            commands::generate::remote(&project, output)
        }
        Commands::Generate(GenerateCommands::Host { output }) => {
            commands::generate::host(&project, output)
        }
        Commands::Get { name, connection } => {
            commands::remote::get(&project, connection.connect, &name)
        }
        Commands::Set {
            name,
            values,
            connection,
        } => commands::remote::set(&project, connection.connect, &name, &values),
        Commands::Call {
            name,
            args,
            connection,
        } => commands::remote::call(&project, connection.connect, &name, &args),
    }
}
