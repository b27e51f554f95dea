use std::future::Future;
use std::time::Duration;

use clap::{Args, Subcommand};
use sbctl::catalog::{self, Setting, VolumeChange};
use sbctl::session::{Session, SessionConfig};
use sbctl::{Soundbar, SoundbarError};

use crate::exit::{io_error, soundbar_error, CliError, CliResult};
use crate::output::OutputFormat;

pub mod device;
pub mod info;
pub mod select;
pub mod version;
pub mod volume;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read a whole category, e.g. PLAY_INFO.
    Get(GetArgs),
    /// Write fields of a category from a JSON object.
    Set(SetArgs),
    /// Show the volume, or change it (absolute N, relative +N / -N).
    Volume(VolumeArgs),
    /// Show or change mute.
    Mute(MuteArgs),
    /// Show or select the input.
    Input(SelectArgs),
    /// Show or select the sound mode.
    Eq(SelectArgs),
    /// Change a device setting.
    Setting(SettingArgs),
    /// Play the speaker test tone.
    Tone,
    /// Summarise name, address, volume and input.
    Info,
    /// Show version information.
    Version(VersionArgs),
}

/// Where and how to reach the soundbar.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub host: Option<String>,
    pub port: u16,
    /// Per-request wait.
    pub timeout: Duration,
    /// Per-attempt TCP connect bound.
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
}

impl ConnectOptions {
    fn session_config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_idle_timeout(self.idle_timeout)
            .with_connect_timeout(self.connect_timeout)
    }
}

pub fn run(command: Command, options: &ConnectOptions, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Get(args) => device::get(args, options, format),
        Command::Set(args) => device::set(args, options, format),
        Command::Volume(args) => volume::volume(args, options, format),
        Command::Mute(args) => volume::mute(args, options, format),
        Command::Input(args) => select::input(args, options, format),
        Command::Eq(args) => select::equalizer(args, options, format),
        Command::Setting(args) => device::setting(args, options, format),
        Command::Tone => device::tone(options, format),
        Command::Info => info::run(options, format),
        Command::Version(args) => version::run(args),
    }
}

/// Open a session, run `op` against it and shut the session down.
pub(crate) fn with_soundbar<T, F, Fut>(
    options: &ConnectOptions,
    context: &str,
    op: F,
) -> CliResult<T>
where
    F: FnOnce(Soundbar) -> Fut,
    Fut: Future<Output = Result<T, SoundbarError>>,
{
    let host = options.host.clone().ok_or_else(|| {
        CliError::usage("no soundbar address: pass --host or set SBCTL_HOST")
    })?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| io_error("failed starting runtime", err))?;

    runtime.block_on(async {
        let session = Session::connect(host, options.port, options.session_config());
        let soundbar = Soundbar::new(session.clone()).with_timeout(options.timeout);
        let result = op(soundbar).await;
        let state = session.state();
        let _ = session.shutdown().await;
        result.map_err(|err| soundbar_error(context, err, state))
    })
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Category name (case-insensitive).
    pub category: String,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Category name (case-insensitive).
    pub category: String,
    /// Fields to write, as a JSON object.
    #[arg(long)]
    pub json: String,
}

#[derive(Args, Debug)]
pub struct VolumeArgs {
    /// New level: N, +N or -N.
    #[arg(allow_hyphen_values = true)]
    pub value: Option<VolumeChange>,
}

#[derive(Args, Debug)]
pub struct MuteArgs {
    /// on or off.
    #[arg(value_parser = parse_switch)]
    pub state: Option<bool>,
}

#[derive(Args, Debug)]
pub struct SelectArgs {
    /// Name to select (case-insensitive).
    pub name: Option<String>,
    /// List known names and exit.
    #[arg(long, conflicts_with = "name")]
    pub list: bool,
}

#[derive(Args, Debug)]
pub struct SettingArgs {
    pub setting: Setting,
    /// on/off for switches, an integer for levels, text for name.
    #[arg(allow_hyphen_values = true)]
    pub value: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn parse_switch(input: &str) -> Result<bool, String> {
    catalog::parse_switch(input).ok_or_else(|| format!("expected on or off, got {input:?}"))
}

/// Parse durations like `5s`, `500ms` or a bare number of seconds.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("duration must not be empty".to_string());
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration value: {input}"))?;
    if value == 0 {
        return Err("duration must be greater than zero".to_string());
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
