//! Validate-then-reload of the managed process.
//!
//! # Responsibilities
//! - Run the configuration self-check and the live reload as external commands
//! - Capture combined output for the operator log
//! - Treat a failure of either step as failure of the whole apply

use std::fmt;
use std::future::Future;
use std::io;
use std::process::ExitStatus;

use thiserror::Error;
use tokio::process::Command;

/// Which half of an apply ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Validate,
    Reload,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Validate => f.write_str("validate"),
            Step::Reload => f.write_str("reload"),
        }
    }
}

/// Captured result of a successful step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// stdout followed by stderr.
    pub combined: String,
}

#[derive(Debug, Error)]
pub enum ControllerError {
    /// Command could not be started at all.
    #[error("{step} command `{command}` could not be started: {source}")]
    Spawn {
        step: Step,
        command: String,
        #[source]
        source: io::Error,
    },

    /// Command ran and reported failure.
    #[error("{step} failed ({status}): {output}")]
    Failed {
        step: Step,
        status: String,
        output: String,
    },
}

impl ControllerError {
    pub fn step(&self) -> Step {
        match self {
            ControllerError::Spawn { step, .. } | ControllerError::Failed { step, .. } => *step,
        }
    }
}

/// Something that can check and reload the proxy.
pub trait ProcessController: Send + Sync {
    /// Run the configuration self-check.
    fn validate(&self) -> impl Future<Output = Result<CommandOutput, ControllerError>> + Send;

    /// Signal the running process to reload.
    fn reload(&self) -> impl Future<Output = Result<CommandOutput, ControllerError>> + Send;
}

/// Outputs of a successful apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub validate: CommandOutput,
    pub reload: CommandOutput,
}

/// Validate, then reload. Reload is skipped when validation fails.
pub async fn apply<P: ProcessController + ?Sized>(controller: &P) -> Result<ApplyReport, ControllerError> {
    let validate = controller.validate().await?;
    tracing::info!(output = %validate.combined.trim_end(), "Configuration check passed");

    let reload = controller.reload().await?;
    tracing::info!(output = %reload.combined.trim_end(), "Reload signal delivered");

    Ok(ApplyReport { validate, reload })
}

/// Program plus fixed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Controller backed by external commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandController {
    validate: CommandSpec,
    reload: CommandSpec,
}

impl CommandController {
    pub fn new(validate: CommandSpec, reload: CommandSpec) -> Self {
        Self { validate, reload }
    }

    /// `nginx -t` and `nginx -s reload`.
    pub fn nginx() -> Self {
        Self::new(
            CommandSpec::new("nginx", &["-t"]),
            CommandSpec::new("nginx", &["-s", "reload"]),
        )
    }

    async fn run(step: Step, spec: &CommandSpec) -> Result<CommandOutput, ControllerError> {
        let output = Command::new(&spec.program)
            .args(&spec.args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ControllerError::Spawn {
                step,
                command: spec.to_string(),
                source,
            })?;

        let combined = combine(&output.stdout, &output.stderr);
        if !output.status.success() {
            tracing::warn!(%step, command = %spec, output = %combined.trim_end(), "Command failed");
            return Err(ControllerError::Failed {
                step,
                status: describe_status(output.status),
                output: combined,
            });
        }

        Ok(CommandOutput { combined })
    }
}

impl Default for CommandController {
    fn default() -> Self {
        Self::nginx()
    }
}

impl ProcessController for CommandController {
    fn validate(&self) -> impl Future<Output = Result<CommandOutput, ControllerError>> + Send {
        Self::run(Step::Validate, &self.validate)
    }

    fn reload(&self) -> impl Future<Output = Result<CommandOutput, ControllerError>> + Send {
        Self::run(Step::Reload, &self.reload)
    }
}

fn combine(stdout: &[u8], stderr: &[u8]) -> String {
    let mut combined = String::from_utf8_lossy(stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(stderr));
    combined
}

fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("sh", &["-c", script])
    }

    #[test]
    fn test_nginx_commands() {
        let controller = CommandController::nginx();
        assert_eq!(controller.validate.to_string(), "nginx -t");
        assert_eq!(controller.reload.to_string(), "nginx -s reload");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_apply_success_captures_output() {
        let controller = CommandController::new(
            sh("echo 'syntax is ok' >&2"),
            sh("echo reloaded"),
        );

        let report = apply(&controller).await.unwrap();

        assert_eq!(report.validate.combined, "syntax is ok\n");
        assert_eq!(report.reload.combined, "reloaded\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_validate_failure_skips_reload() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("reloaded");
        let controller = CommandController::new(
            sh("echo 'unexpected \"}\"' >&2; exit 1"),
            sh(&format!("touch {}", marker.display())),
        );

        let err = apply(&controller).await.unwrap_err();

        assert_eq!(err.step(), Step::Validate);
        match err {
            ControllerError::Failed { status, output, .. } => {
                assert_eq!(status, "exit code 1");
                assert!(output.contains("unexpected"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!marker.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_reload_failure() {
        let controller = CommandController::new(sh("true"), sh("exit 2"));
        let err = apply(&controller).await.unwrap_err();
        assert_eq!(err.step(), Step::Reload);
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let controller = CommandController::new(
            CommandSpec::new("definitely-not-a-real-binary-4f2a", &[]),
            CommandSpec::new("true", &[]),
        );
        let err = apply(&controller).await.unwrap_err();
        assert!(matches!(err, ControllerError::Spawn { step: Step::Validate, .. }));
    }
}
