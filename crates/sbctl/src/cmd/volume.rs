use serde_json::Value;

use crate::cmd::{with_soundbar, ConnectOptions, MuteArgs, VolumeArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_field, OutputFormat};

pub fn volume(args: VolumeArgs, options: &ConnectOptions, format: OutputFormat) -> CliResult<i32> {
    let level = match args.value {
        None => with_soundbar(options, "volume failed", |soundbar| async move {
            soundbar.volume().await
        })?,
        Some(change) => with_soundbar(options, "volume failed", |soundbar| async move {
            soundbar.set_volume(change).await.map(u64::from)
        })?,
    };
    print_field("volume", &Value::from(level), format);
    Ok(SUCCESS)
}

pub fn mute(args: MuteArgs, options: &ConnectOptions, format: OutputFormat) -> CliResult<i32> {
    let muted = match args.state {
        None => with_soundbar(options, "mute failed", |soundbar| async move {
            soundbar.mute().await
        })?,
        Some(muted) => with_soundbar(options, "mute failed", |soundbar| async move {
            soundbar.set_mute(muted).await.map(|_| muted)
        })?,
    };
    print_field("mute", &Value::Bool(muted), format);
    Ok(SUCCESS)
}
