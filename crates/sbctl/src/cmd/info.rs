use crate::cmd::{with_soundbar, ConnectOptions};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_summary, OutputFormat};

pub fn run(options: &ConnectOptions, format: OutputFormat) -> CliResult<i32> {
    let info = with_soundbar(options, "info failed", |soundbar| async move {
        soundbar.basic_info().await
    })?;
    print_summary(&info, format);
    Ok(SUCCESS)
}
