//! `detect`: list placeholder parameters, no network access

use anyhow::Result;
use serde::Serialize;
use ssm_inject_agent::{extract_placeholders, merge_parameters, RunningBuild};
use ssm_inject_core::Settings;
use tabled::{settings::Style, Table, Tabled};

use crate::cli::DetectArgs;
use crate::local_build::destination_label;
use crate::output;

use super::load_build;

#[derive(Tabled, Serialize)]
struct PlaceholderRow {
    key: String,
    identifier: String,
    destination: String,
}

pub fn run(args: DetectArgs, settings: &Settings) -> Result<()> {
    let mut build = load_build(&args.params)?;
    let parameters = merge_parameters(
        build.shared_config_parameters(),
        build.shared_build_parameters(),
    );
    let identifiers = extract_placeholders(&parameters, &settings.placeholder, &mut build);

    let rows: Vec<PlaceholderRow> = identifiers
        .into_iter()
        .map(|(key, identifier)| PlaceholderRow {
            destination: destination_label(&key),
            key,
            identifier,
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        output::info("No placeholder parameters found");
        return Ok(());
    }

    output::header(&format!("{} placeholder parameters", rows.len()));
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);

    Ok(())
}
