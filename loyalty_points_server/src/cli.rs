use std::{env, env::VarError};

use clap::Parser;

/// Loyalty points gateway server.
///
/// Every option can also be supplied through the environment (or a `.env` file). Flags given on the command line win.
#[derive(Parser, Debug, Default)]
#[command(version, about)]
pub struct Arguments {
    /// The address the HTTP server binds to, as host:port [env: RUN_ADDRESS]
    #[arg(short = 'a', long = "address")]
    pub run_address: Option<String>,
    /// The database connection string [env: DATABASE_URI]
    #[arg(short = 'd', long = "database")]
    pub database_uri: Option<String>,
    /// The base address of the accrual service [env: ACCRUAL_SYSTEM_ADDRESS]
    #[arg(short = 'r', long = "accrual")]
    pub accrual_address: Option<String>,
    /// Print the current configuration environment and exit
    #[arg(long = "show-env")]
    pub show_env: bool,
}

/// Parses the command line. Returns `None` if the process should exit without starting the server.
pub fn handle_command_line_args() -> Option<Arguments> {
    let args = Arguments::parse();
    if args.show_env {
        display_envs();
        return None;
    }
    Some(args)
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 7] = [
        "RUST_LOG",
        "RUN_ADDRESS",
        "DATABASE_URI",
        "ACCRUAL_SYSTEM_ADDRESS",
        "ACCRUAL_WORKERS",
        "ACCRUAL_POLL_INTERVAL",
        "ACCRUAL_REQUEST_TIMEOUT",
    ];

    println!("Current environment values:");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
