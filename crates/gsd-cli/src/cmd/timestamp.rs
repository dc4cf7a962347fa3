use crate::output::print_json;
use chrono::{Local, SecondsFormat, Utc};
use serde_json::json;

pub fn run(mode: Option<&str>) -> anyhow::Result<()> {
    match mode {
        Some("date") => print_json(&json!({
            "date": Local::now().format("%Y-%m-%d").to_string(),
        })),
        _ => print_json(&json!({
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })),
    }
}
