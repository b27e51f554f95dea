use sbctl::catalog::READABLE;
use sbctl::frame::Response;
use sbctl::SoundbarError;
use serde_json::{Map, Value};
use tracing::warn;

use crate::cmd::{with_soundbar, ConnectOptions, GetArgs, SetArgs, SettingArgs};
use crate::exit::{catalog_error, CliError, CliResult, SUCCESS};
use crate::output::{print_response, OutputFormat};

pub fn get(args: GetArgs, options: &ConnectOptions, format: OutputFormat) -> CliResult<i32> {
    let category = args.category.to_ascii_uppercase();
    if !READABLE.contains(&category.as_str()) {
        warn!(%category, "not a known readable category; sending anyway");
    }
    let response = with_soundbar(options, "get failed", |soundbar| async move {
        soundbar.get(&category).await
    })?;
    print_response(response.as_value(), format);
    Ok(SUCCESS)
}

pub fn set(args: SetArgs, options: &ConnectOptions, format: OutputFormat) -> CliResult<i32> {
    let category = args.category.to_ascii_uppercase();
    let data = parse_object(&args.json)?;
    let response = with_soundbar(options, "set failed", |soundbar| async move {
        let response = soundbar.set(&category, data).await?;
        answered(&category, response)
    })?;
    print_response(response.as_value(), format);
    Ok(SUCCESS)
}

pub fn setting(args: SettingArgs, options: &ConnectOptions, format: OutputFormat) -> CliResult<i32> {
    let value = args.setting.parse_value(&args.value).map_err(catalog_error)?;
    let response = with_soundbar(options, "setting failed", |soundbar| async move {
        let response = soundbar.set_setting(args.setting, value).await?;
        answered(args.setting.field(), response)
    })?;
    print_response(response.as_value(), format);
    Ok(SUCCESS)
}

pub fn tone(options: &ConnectOptions, format: OutputFormat) -> CliResult<i32> {
    let response = with_soundbar(options, "test tone failed", |soundbar| async move {
        let response = soundbar.test_tone().await?;
        answered(sbctl::catalog::TEST_TONE_REQ, response)
    })?;
    print_response(response.as_value(), format);
    Ok(SUCCESS)
}

fn answered(what: &str, response: Option<Response>) -> Result<Response, SoundbarError> {
    response.ok_or_else(|| SoundbarError::NoResponse(what.to_string()))
}

fn parse_object(json: &str) -> CliResult<Map<String, Value>> {
    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(CliError::usage("--json must be a JSON object")),
        Err(err) => Err(CliError::usage(format!("--json is not valid JSON: {err}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_object_accepts_objects_only() {
        let map = parse_object(r#"{"i_vol": 5}"#).unwrap();
        assert_eq!(map["i_vol"], 5);
        assert!(parse_object("[1, 2]").is_err());
        assert!(parse_object("{nope").is_err());
    }
}
