use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Print a device response.
///
/// `json` and `raw` print the response as received, `pretty` indents it, and
/// `table` lists the fields of its `data` object.
pub fn print_response(value: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Raw => println!("{value}"),
        OutputFormat::Pretty => println!("{}", pretty(value)),
        OutputFormat::Table => {
            let fields = value
                .get("data")
                .and_then(Value::as_object)
                .or_else(|| value.as_object());
            match fields {
                Some(fields) => println!("{}", field_table(fields)),
                None => println!("{value}"),
            }
        }
    }
}

/// Print a single named value, e.g. the current volume.
pub fn print_field(name: &str, value: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let mut out = Map::new();
            out.insert(name.to_string(), value.clone());
            println!("{}", Value::Object(out));
        }
        OutputFormat::Table => {
            let mut out = Map::new();
            out.insert(name.to_string(), value.clone());
            println!("{}", field_table(&out));
        }
        OutputFormat::Pretty => println!("{name}: {}", scalar(value)),
        OutputFormat::Raw => println!("{}", scalar(value)),
    }
}

/// Print any serializable summary.
pub fn print_summary<T: Serialize>(summary: &T, format: OutputFormat) {
    let value = serde_json::to_value(summary).unwrap_or(Value::Null);
    match format {
        OutputFormat::Json | OutputFormat::Raw => println!("{value}"),
        OutputFormat::Pretty => println!("{}", pretty(&value)),
        OutputFormat::Table => match value.as_object() {
            Some(fields) => println!("{}", field_table(fields)),
            None => println!("{value}"),
        },
    }
}

/// Print a lookup table with the index the device uses for each name.
pub fn print_list(names: &[&str], format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", Value::from(names.to_vec())),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["INDEX", "NAME"]);
            for (index, name) in names.iter().enumerate() {
                table.add_row(vec![index.to_string(), (*name).to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for (index, name) in names.iter().enumerate() {
                println!("{index:>3}  {name}");
            }
        }
    }
}

fn field_table(fields: &Map<String, Value>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["FIELD", "VALUE"]);
    for (key, value) in fields {
        table.add_row(vec![key.clone(), scalar(value)]);
    }
    table
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Strings without quotes, `-` for null, everything else as JSON.
fn scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
