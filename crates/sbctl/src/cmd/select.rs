use sbctl::catalog::{self, EQUALIZERS, INPUTS};
use serde_json::Value;

use crate::cmd::{with_soundbar, ConnectOptions, SelectArgs};
use crate::exit::{catalog_error, CliResult, SUCCESS};
use crate::output::{print_field, print_list, OutputFormat};

pub fn input(args: SelectArgs, options: &ConnectOptions, format: OutputFormat) -> CliResult<i32> {
    if args.list {
        print_list(INPUTS, format);
        return Ok(SUCCESS);
    }

    let name = match args.name {
        None => with_soundbar(options, "input failed", |soundbar| async move {
            soundbar.input().await
        })?,
        Some(name) => {
            // Resolve before connecting so a typo never reaches the device.
            let index = catalog::input_index(&name).map_err(catalog_error)?;
            with_soundbar(options, "input failed", |soundbar| async move {
                soundbar.set_input(&name).await.map(|_| INPUTS[index])
            })?
        }
    };
    print_field("input", &Value::from(name), format);
    Ok(SUCCESS)
}

pub fn equalizer(
    args: SelectArgs,
    options: &ConnectOptions,
    format: OutputFormat,
) -> CliResult<i32> {
    if args.list {
        print_list(EQUALIZERS, format);
        return Ok(SUCCESS);
    }

    let name = match args.name {
        None => with_soundbar(options, "eq failed", |soundbar| async move {
            soundbar.equalizer().await
        })?,
        Some(name) => {
            let index = catalog::equalizer_index(&name).map_err(catalog_error)?;
            with_soundbar(options, "eq failed", |soundbar| async move {
                soundbar.set_equalizer(&name).await.map(|_| EQUALIZERS[index])
            })?
        }
    };
    print_field("equalizer", &Value::from(name), format);
    Ok(SUCCESS)
}
