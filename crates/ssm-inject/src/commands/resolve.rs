//! `resolve`: run a resolution cycle and show what was written

use anyhow::{bail, Result};
use ssm_inject_agent::{ParameterReplacer, ResolutionOutcome};
use ssm_inject_core::security::MASK;
use ssm_inject_core::Settings;

use crate::cli::{OutputFormat, ResolveArgs};
use crate::local_build::{Assignment, LocalBuild};
use crate::output;

use super::load_build;

pub async fn run(args: ResolveArgs, settings: Settings, quiet: bool) -> Result<()> {
    let mut build = load_build(&args.params)?.with_echo(!quiet);

    let replacer = ParameterReplacer::new(settings);
    let outcome = replacer.update_build_parameters(&mut build).await;

    if let ResolutionOutcome::Failed(kind) = outcome {
        if args.strict {
            bail!("Parameter resolution failed: {}", kind);
        }
        // Partial writes are not reported in any format
        output::warning(&format!("Parameter resolution failed ({}), continuing", kind));
        return Ok(());
    }

    match args.format {
        OutputFormat::Text => print_text(&build, outcome, args.show_values),
        OutputFormat::Json => println!("{}", render_json(&build, args.show_values)?),
        OutputFormat::Shell => print!("{}", render_shell(&build)),
    }

    Ok(())
}

fn displayed(assignment: &Assignment, show_values: bool) -> String {
    if show_values {
        assignment.value.clone()
    } else {
        MASK.to_string()
    }
}

fn print_text(build: &LocalBuild, outcome: ResolutionOutcome, show_values: bool) {
    match outcome {
        ResolutionOutcome::NoPlaceholders => {
            output::info("No placeholder parameters found");
            return;
        }
        ResolutionOutcome::Applied(count) => {
            output::success(&format!("Resolved {} parameters", count));
        }
        ResolutionOutcome::Failed(_) => return,
    }

    let assignments = build.assignments();
    let mut current = "";
    for assignment in &assignments {
        if assignment.category != current {
            current = assignment.category;
            output::header(current);
        }
        output::kv(&assignment.name, &displayed(assignment, show_values));
    }
}

fn render_json(build: &LocalBuild, show_values: bool) -> Result<String> {
    let assignments: Vec<Assignment> = build
        .assignments()
        .into_iter()
        .map(|mut a| {
            a.value = displayed(&a, show_values);
            a
        })
        .collect();
    Ok(serde_json::to_string_pretty(&assignments)?)
}

fn render_shell(build: &LocalBuild) -> String {
    build
        .environment()
        .iter()
        .map(|(name, value)| format!("export {}={}\n", name, shell_quote(value)))
        .collect()
}

/// Single-quote `value` for POSIX shells
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
