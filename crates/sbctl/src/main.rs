mod cmd;
mod exit;
mod logging;
mod output;

use std::time::Duration;

use clap::Parser;
use sbctl::transport::DEFAULT_PORT;

use crate::cmd::{parse_duration, Command, ConnectOptions};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "sbctl", version, about = "LG soundbar control")]
struct Cli {
    /// Soundbar address.
    #[arg(long, env = "SBCTL_HOST", global = true)]
    host: Option<String>,

    /// Soundbar control port.
    #[arg(long, env = "SBCTL_PORT", default_value_t = DEFAULT_PORT, global = true)]
    port: u16,

    /// How long to wait for each response (e.g. 5s, 500ms).
    #[arg(long, value_parser = parse_duration, default_value = "5s", global = true)]
    timeout: Duration,

    /// Give up on a single TCP connect attempt after this long. Keep it below
    /// --timeout so an unreachable soundbar is retried before the request
    /// itself gives up.
    #[arg(long, value_parser = parse_duration, default_value = "2s", global = true)]
    connect_timeout: Duration,

    /// Close the connection after this long without traffic.
    #[arg(long, value_parser = parse_duration, default_value = "5000ms", global = true)]
    idle_timeout: Duration,

    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            host: self.host.clone(),
            port: self.port,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            idle_timeout: self.idle_timeout,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let options = cli.connect_options();
    let result = cmd::run(cli.command, &options, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
