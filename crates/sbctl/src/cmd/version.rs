use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("sbctl {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: sbctl");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("SBCTL_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "profile: {}",
        option_env!("SBCTL_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("default_port: {}", sbctl::transport::DEFAULT_PORT);
    println!(
        "idle_timeout_ms: {}",
        sbctl::session::DEFAULT_IDLE_TIMEOUT.as_millis()
    );

    Ok(SUCCESS)
}
