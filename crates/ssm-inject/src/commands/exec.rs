//! `exec`: run a command with resolved environment variables
//!
//! The child's stdout and stderr are read line by line and passed through the
//! build's output masker before they reach the terminal. Output that is not
//! valid UTF-8 is forwarded lossily rather than cut off.

use anyhow::{bail, Context, Result};
use ssm_inject_agent::{ParameterReplacer, ResolutionOutcome};
use ssm_inject_core::{OutputMasker, Settings};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::cli::ExecArgs;
use crate::output;

use super::load_build;

pub async fn run(args: ExecArgs, settings: Settings, quiet: bool) -> Result<()> {
    let mut build = load_build(&args.params)?.with_echo(!quiet);

    let replacer = ParameterReplacer::new(settings);
    let outcome = replacer.update_build_parameters(&mut build).await;

    if let ResolutionOutcome::Failed(kind) = outcome {
        if args.strict {
            bail!("Parameter resolution failed: {}, not running command", kind);
        }
        output::warning(&format!("Parameter resolution failed ({}), running anyway", kind));
    }

    let environment = build.environment().clone();
    let masker = build.into_masker();

    let (program, program_args) = args
        .command
        .split_first()
        .context("No command given")?;

    debug!("Spawning {} with {} resolved variables", program, environment.len());
    let mut child = Command::new(program)
        .args(program_args)
        .envs(&environment)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to start '{}'", program))?;

    let stdout = child.stdout.take().context("Child stdout not captured")?;
    let stderr = child.stderr.take().context("Child stderr not captured")?;

    let out_task = tokio::spawn(forward_masked(stdout, tokio::io::stdout(), masker.clone()));
    let err_task = tokio::spawn(forward_masked(stderr, tokio::io::stderr(), masker));

    let status = child.wait().await.context("Failed waiting for command")?;
    for (stream, task) in [("stdout", out_task), ("stderr", err_task)] {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Forwarding child {} failed: {:#}", stream, e),
            Err(e) => warn!("Forwarding task for child {} did not complete: {}", stream, e),
        }
    }

    let code = status.code().unwrap_or(1);
    debug!("Command exited with {}", code);
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// Copy `reader` to `writer` line by line with registered values masked
async fn forward_masked<R, W>(reader: R, mut writer: W, masker: Arc<OutputMasker>) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: tokio::io::AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let masked = masker.mask(&String::from_utf8_lossy(&buf));
        writer.write_all(masked.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}
