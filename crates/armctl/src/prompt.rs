//! Interactive overwrite confirmation on the terminal

use armctl_cloud::{CloudError, ConfirmationChannel};
use async_trait::async_trait;
use colored::Colorize;
use std::io::{BufRead, Write};

/// Asks on stderr and reads one line from stdin
///
/// End of input counts as "no", so piping nothing into a run never overwrites.
pub struct StdinConfirmation;

#[async_trait]
impl ConfirmationChannel for StdinConfirmation {
    async fn prompt(&self, message: &str, resource_name: &str) -> armctl_cloud::Result<bool> {
        let message = message.to_string();
        let resource_name = resource_name.to_string();
        tokio::task::spawn_blocking(move || {
            let stdin = std::io::stdin();
            ask(&mut stdin.lock(), &mut std::io::stderr(), &message, &resource_name)
        })
        .await
        .map_err(|e| CloudError::Prompt(e.to_string()))?
    }
}

fn ask<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    message: &str,
    resource_name: &str,
) -> armctl_cloud::Result<bool> {
    write!(out, "{} {} [y/N]: ", "?".yellow().bold(), message)?;
    out.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        writeln!(out)?;
        tracing::info!(resource = resource_name, "no answer on stdin, not overwriting");
        return Ok(false);
    }

    let answer = answer.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}
