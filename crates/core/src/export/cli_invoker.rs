use async_trait::async_trait;
use log::{info, warn};
use std::time::Duration;
use tokio::process::Command;

use super::export_errors::ExportError;
use crate::Result;

const DEFAULT_CLI_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Trait defining the contract for handing a transaction file to the
/// external portfolio accounting CLI.
#[async_trait]
pub trait CliInvokerTrait: Send + Sync {
    async fn invoke(&self, file_name: &str) -> Result<()>;
}

/// Runs the configured CLI command with a bounded timeout.
///
/// The command template recognizes `{filename}` and `{output_dir}`
/// placeholders; `{home}` is expanded once at construction time. Combined
/// stdout/stderr is captured and returned in the failure message on non-zero
/// exit.
pub struct CliInvoker {
    command_template: String,
    output_dir: String,
    timeout: Duration,
}

impl CliInvoker {
    pub fn new(command_template: &str, output_dir: &str) -> Self {
        let command_template = match std::env::var("HOME") {
            Ok(home) if command_template.contains("{home}") => {
                command_template.replace("{home}", &home)
            }
            _ => command_template.to_string(),
        };

        Self {
            command_template,
            output_dir: output_dir.to_string(),
            timeout: DEFAULT_CLI_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Startup-time sanity check of the configured template.
    pub fn validate_command(&self) -> Result<()> {
        if self.command_template.is_empty() {
            return Err(ExportError::CommandNotConfigured.into());
        }
        if !self.command_template.contains("portfolio") {
            warn!(
                "CLI command may not be a portfolio accounting command: {}",
                self.command_template
            );
        }
        Ok(())
    }

    async fn execute(&self, command: &str) -> std::result::Result<(), ExportError> {
        let mut cmd = if is_container_run(command) {
            // Container invocations keep their full argument string and go
            // through the shell.
            let mut shell = Command::new("sh");
            shell.arg("-c").arg(command);
            shell
        } else {
            let parts = split_command(command);
            let Some((program, args)) = parts.split_first() else {
                return Err(ExportError::CommandNotConfigured);
            };
            let mut direct = Command::new(program);
            direct.args(args);
            direct
        };
        cmd.kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| ExportError::CliTimeout(self.timeout.as_secs()))?
            .map_err(|err| ExportError::Io(err.to_string()))?;

        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(ExportError::CliFailed {
                status: output.status.code().unwrap_or(-1),
                output: combined,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl CliInvokerTrait for CliInvoker {
    async fn invoke(&self, file_name: &str) -> Result<()> {
        if self.command_template.is_empty() {
            return Err(ExportError::CommandNotConfigured.into());
        }

        let command = self
            .command_template
            .replace("{filename}", file_name)
            .replace("{output_dir}", &self.output_dir);

        info!("invoking portfolio accounting CLI: {}", command);

        self.execute(&command).await?;

        info!("portfolio accounting CLI completed for {}", file_name);
        Ok(())
    }
}

fn is_container_run(command: &str) -> bool {
    command.starts_with("docker run") || command.starts_with("podman run")
}

/// Splits a command string into argv, keeping double-quoted substrings
/// together. Quotes are delimiters only; they are not part of the argument.
fn split_command(command: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in command.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ' ' if !in_quotes => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }

    parts
}
