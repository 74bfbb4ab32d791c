//! CLI Subprocess Runner
//!
//! Shells out to the `pay-testbed` binary so the dashboard can reuse the CLI
//! instead of reimplementing its operations. Prefers a pre-built binary and
//! falls back to `cargo run` when none is found.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;

/// Exit code reported when the executable cannot be spawned.
pub const NOT_FOUND_CODE: i32 = 127;

/// Sentinel exit code reported when the subprocess exceeds its timeout.
pub const TIMEOUT_CODE: i32 = -1;

/// Environment override for the CLI binary location.
pub const BINARY_ENV: &str = "PAY_TESTBED_BIN";

const BINARY_NAME: &str = "pay-testbed";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Captured outcome of one subprocess invocation.
///
/// A non-zero `returncode` is not an error at this level; `error` is set
/// only when the process could not be spawned or timed out. The caller
/// decides whether a non-zero exit is fatal.
#[derive(Clone, Debug)]
pub struct CommandResult {
    pub argv: Vec<String>,
    pub stdout: String,
    pub stderr: String,
    pub returncode: i32,
    pub error: Option<String>,
}

impl CommandResult {
    /// The invocation as a single display string.
    pub fn command_line(&self) -> String {
        self.argv.join(" ")
    }
}

/// Spawns the testbed CLI and captures its output.
pub struct CliRunner {
    project_dir: PathBuf,
    config_path: PathBuf,
    timeout: Duration,
    binary: Option<PathBuf>,
}

impl CliRunner {
    pub fn new(project_dir: impl Into<PathBuf>, config_path: impl Into<PathBuf>) -> Self {
        let project_dir = project_dir.into();
        let binary = Self::resolve_binary(&project_dir);
        Self {
            project_dir,
            config_path: config_path.into(),
            timeout: DEFAULT_TIMEOUT,
            binary,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Prefer an existing compiled binary; `None` means `cargo run`.
    fn resolve_binary(project_dir: &Path) -> Option<PathBuf> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Ok(env_path) = std::env::var(BINARY_ENV) {
            candidates.push(PathBuf::from(env_path));
        }
        candidates.push(project_dir.join("target/release").join(BINARY_NAME));
        candidates.push(project_dir.join("target/debug").join(BINARY_NAME));

        candidates.into_iter().find(|path| path.is_file())
    }

    fn build_argv(&self, operation: &str, extra: &[String]) -> Vec<String> {
        let mut args = vec![
            "--config".to_string(),
            self.config_path.display().to_string(),
            operation.to_string(),
        ];
        args.extend(extra.iter().cloned());

        match &self.binary {
            Some(binary) => {
                let mut argv = vec![binary.display().to_string()];
                argv.extend(args);
                argv
            }
            None => {
                let manifest = self.project_dir.join("crates/testbed-cli/Cargo.toml");
                let mut argv = vec![
                    "cargo".to_string(),
                    "run".to_string(),
                    "--quiet".to_string(),
                    "--manifest-path".to_string(),
                    manifest.display().to_string(),
                    "--".to_string(),
                ];
                argv.extend(args);
                argv
            }
        }
    }

    /// Run one CLI operation with its extra flags.
    pub async fn run(&self, operation: &str, extra: &[String]) -> CommandResult {
        self.execute(self.build_argv(operation, extra)).await
    }

    pub(crate) async fn execute(&self, argv: Vec<String>) -> CommandResult {
        tracing::debug!(command = %argv.join(" "), "spawning testbed CLI");

        let mut command = Command::new(&argv[0]);
        command
            .args(&argv[1..])
            .current_dir(&self.project_dir)
            .kill_on_drop(true);

        match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => CommandResult {
                argv,
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                returncode: output.status.code().unwrap_or(TIMEOUT_CODE),
                error: None,
            },
            Ok(Err(err)) => CommandResult {
                argv,
                stdout: String::new(),
                stderr: String::new(),
                returncode: NOT_FOUND_CODE,
                error: Some(format!("Unable to execute command: {}", err)),
            },
            Err(_) => CommandResult {
                argv,
                stdout: String::new(),
                stderr: String::new(),
                returncode: TIMEOUT_CODE,
                error: Some(format!(
                    "Command timed out after {} seconds",
                    self.timeout.as_secs()
                )),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner() -> CliRunner {
        CliRunner::new(".", "conf/config.json")
    }

    #[tokio::test]
    async fn test_not_found_reports_127() {
        let result = runner()
            .execute(vec!["/definitely/not/a/binary".to_string()])
            .await;

        assert_eq!(result.returncode, NOT_FOUND_CODE);
        assert!(result.error.is_some());
        assert!(result.stdout.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_reports_sentinel() {
        let result = runner()
            .with_timeout(Duration::from_millis(100))
            .execute(vec![
                "sh".to_string(),
                "-c".to_string(),
                "sleep 5".to_string(),
            ])
            .await;

        assert_eq!(result.returncode, TIMEOUT_CODE);
        let error = result.error.expect("timeout error populated");
        assert!(error.contains("timed out"));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_not_an_adapter_error() {
        let result = runner()
            .execute(vec![
                "sh".to_string(),
                "-c".to_string(),
                "echo out; echo oops >&2; exit 3".to_string(),
            ])
            .await;

        assert_eq!(result.returncode, 3);
        assert!(result.error.is_none());
        assert_eq!(result.stdout, "out\n");
        assert_eq!(result.stderr, "oops\n");
    }

    #[tokio::test]
    async fn test_binary_resolution_prefers_release() {
        let dir = tempfile::tempdir().unwrap();
        let release = dir.path().join("target/release");
        std::fs::create_dir_all(&release).unwrap();
        std::fs::write(release.join(BINARY_NAME), "").unwrap();

        let resolved = CliRunner::resolve_binary(dir.path());
        assert_eq!(resolved, Some(release.join(BINARY_NAME)));
    }

    #[test]
    fn test_cargo_run_fallback_argv() {
        let dir = tempfile::tempdir().unwrap();
        let runner = CliRunner::new(dir.path(), "conf/config.json");
        let argv = runner.build_argv("get", &[]);

        assert_eq!(argv[0], "cargo");
        assert!(argv.contains(&"--quiet".to_string()));
        assert!(argv.contains(&"get".to_string()));
        assert!(argv.contains(&"--config".to_string()));
    }
}
