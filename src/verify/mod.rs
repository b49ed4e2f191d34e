//! Verification stage: does the merged candidate tree actually build?
//!
//! Every decision's content is materialized into a fresh temporary workspace
//! (unique per invocation, never reused across attempts), then the context's
//! verify commands run in sequence inside it. Any command failure retries
//! the *entire* sequence, up to the attempt ceiling. Cleanup of the
//! workspace is best-effort via `TempDir` drop, regardless of outcome.
//!
//! Verification is opt-in infrastructure, not a universal gate: when it is
//! disabled or no commands are configured, the stage optimistically reports
//! success.

pub mod runner;

use std::path::{Component, Path};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::types::{MergeContext, MergeDecision, MergeVerification};

pub use runner::{CommandOutput, CommandRunner, RunnerError, ShellRunner};

/// Floor for the per-command timeout, enforced regardless of configuration.
pub const MIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout used when the context does not specify one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// The verification stage.
pub struct Verifier {
    runner: Arc<dyn CommandRunner>,
    enabled: bool,
}

impl Verifier {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Verifier {
            runner,
            enabled: true,
        }
    }

    /// A verifier that always reports optimistic success without running
    /// anything.
    pub fn disabled() -> Self {
        Verifier {
            runner: Arc::new(ShellRunner),
            enabled: false,
        }
    }

    /// Verifies the decision set for the given context.
    ///
    /// Never returns an error: infrastructure failures (workspace creation,
    /// file writes) are reported as a failing verification with the cause
    /// captured as a warning.
    pub async fn verify(
        &self,
        context: &MergeContext,
        decisions: &[MergeDecision],
        cancel: &CancellationToken,
    ) -> MergeVerification {
        if !self.enabled || context.verify_commands.is_empty() {
            return MergeVerification::passing();
        }

        let workspace = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(error) => {
                return MergeVerification::failing(format!(
                    "could not create verification workspace: {error}"
                ));
            }
        };

        let mut warnings = Vec::new();
        if let Err(error) = materialize(workspace.path(), decisions, &mut warnings) {
            warnings.push(format!("could not materialize merged tree: {error}"));
            return MergeVerification {
                compiled: false,
                tests_passed: false,
                warnings,
            };
        }

        let attempts = context.verify_attempts.unwrap_or(1).max(1);
        let timeout = context.verify_timeout.unwrap_or(DEFAULT_TIMEOUT).max(MIN_TIMEOUT);

        let mut last_error = String::new();
        for attempt in 1..=attempts {
            if cancel.is_cancelled() {
                warnings.push("verification cancelled".to_string());
                return MergeVerification {
                    compiled: false,
                    tests_passed: false,
                    warnings,
                };
            }

            match self
                .run_sequence(&context.verify_commands, workspace.path(), timeout)
                .await
            {
                Ok(()) => {
                    if attempt > 1 {
                        warnings.push(format!(
                            "verification succeeded on attempt {attempt} of {attempts}"
                        ));
                    }
                    return MergeVerification {
                        compiled: true,
                        tests_passed: true,
                        warnings,
                    };
                }
                Err(error) => {
                    tracing::warn!(attempt, attempts, %error, "verification attempt failed");
                    last_error = error;
                }
            }
        }

        warnings.push(format!(
            "verification failed after {attempts} attempt(s): {last_error}"
        ));
        MergeVerification {
            compiled: false,
            tests_passed: false,
            warnings,
        }
    }

    /// Runs the full command sequence once; the first failure aborts the
    /// sequence and is returned as a description.
    async fn run_sequence(
        &self,
        commands: &[String],
        dir: &Path,
        timeout: Duration,
    ) -> Result<(), String> {
        for command in commands {
            match self.runner.run(command, dir, timeout).await {
                Ok(output) if output.success => {}
                Ok(output) => {
                    return Err(format!(
                        "command `{command}` failed: {}",
                        output.failure_summary()
                    ));
                }
                Err(error) => {
                    return Err(format!("command `{command}` errored: {error}"));
                }
            }
        }
        Ok(())
    }
}

/// Writes each decision's content into the workspace.
///
/// Paths are repository-relative; absolute paths and paths escaping the
/// workspace via `..` are skipped with a warning rather than written.
fn materialize(
    workspace: &Path,
    decisions: &[MergeDecision],
    warnings: &mut Vec<String>,
) -> std::io::Result<()> {
    for decision in decisions {
        let relative = Path::new(&decision.path);
        let unsafe_path = relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, Component::ParentDir));
        if unsafe_path {
            tracing::warn!(path = %decision.path, "skipping unsafe decision path");
            warnings.push(format!("skipped unsafe path: {}", decision.path));
            continue;
        }

        let target = workspace.join(relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, &decision.content)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Language, RepoId, ResolutionStrategy};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn context(commands: &[&str], attempts: Option<u32>) -> MergeContext {
        MergeContext {
            repo: RepoId::new("acme", "widgets"),
            base_revision: "b".into(),
            left_revision: "l".into(),
            right_revision: "r".into(),
            primary_language: Language::Ts,
            files: vec![],
            verify_commands: commands.iter().map(|c| c.to_string()).collect(),
            verify_attempts: attempts,
            verify_timeout: None,
        }
    }

    fn decision(path: &str, content: &str) -> MergeDecision {
        MergeDecision {
            path: path.into(),
            content: content.into(),
            strategy: ResolutionStrategy::Ast,
            diagnostics: vec![],
        }
    }

    /// Fails the first `fail_count` sequence runs, then succeeds.
    struct FlakyRunner {
        fail_count: u32,
        runs: AtomicU32,
    }

    #[async_trait]
    impl CommandRunner for FlakyRunner {
        async fn run(
            &self,
            _command: &str,
            _dir: &Path,
            _timeout: Duration,
        ) -> Result<CommandOutput, RunnerError> {
            let run = self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(CommandOutput {
                success: run >= self.fail_count,
                stdout: String::new(),
                stderr: "simulated failure".into(),
            })
        }
    }

    /// Records every command and the timeout it was given.
    struct RecordingRunner {
        calls: Mutex<Vec<(String, Duration)>>,
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(
            &self,
            command: &str,
            _dir: &Path,
            timeout: Duration,
        ) -> Result<CommandOutput, RunnerError> {
            self.calls.lock().unwrap().push((command.to_string(), timeout));
            Ok(CommandOutput {
                success: true,
                stdout: String::new(),
                stderr: String::new(),
            })
        }
    }

    #[tokio::test]
    async fn disabled_verifier_is_optimistic() {
        let verifier = Verifier::disabled();
        let ctx = context(&["false"], None);
        let verification = verifier
            .verify(&ctx, &[], &CancellationToken::new())
            .await;
        assert!(verification.passed());
    }

    #[tokio::test]
    async fn no_commands_is_optimistic() {
        let verifier = Verifier::new(Arc::new(FlakyRunner {
            fail_count: 99,
            runs: AtomicU32::new(0),
        }));
        let ctx = context(&[], None);
        let verification = verifier
            .verify(&ctx, &[], &CancellationToken::new())
            .await;
        assert!(verification.passed());
        assert!(verification.warnings.is_empty());
    }

    #[tokio::test]
    async fn retry_success_is_recorded_as_warning() {
        let verifier = Verifier::new(Arc::new(FlakyRunner {
            fail_count: 2,
            runs: AtomicU32::new(0),
        }));
        let ctx = context(&["make test"], Some(3));

        let verification = verifier
            .verify(&ctx, &[], &CancellationToken::new())
            .await;

        assert!(verification.passed());
        assert_eq!(verification.warnings.len(), 1);
        assert!(verification.warnings[0].contains("attempt 3"));
    }

    #[tokio::test]
    async fn exhausted_retries_fail_with_last_error() {
        let verifier = Verifier::new(Arc::new(FlakyRunner {
            fail_count: 99,
            runs: AtomicU32::new(0),
        }));
        let ctx = context(&["make test"], Some(2));

        let verification = verifier
            .verify(&ctx, &[], &CancellationToken::new())
            .await;

        assert!(!verification.compiled);
        assert!(!verification.tests_passed);
        assert!(verification.warnings.last().unwrap().contains("2 attempt(s)"));
        assert!(verification.warnings.last().unwrap().contains("simulated failure"));
    }

    #[tokio::test]
    async fn zero_attempts_is_clamped_to_one() {
        let runner = Arc::new(FlakyRunner {
            fail_count: 99,
            runs: AtomicU32::new(0),
        });
        let verifier = Verifier::new(runner.clone());
        let ctx = context(&["make test"], Some(0));

        let verification = verifier
            .verify(&ctx, &[], &CancellationToken::new())
            .await;

        assert!(!verification.passed());
        assert_eq!(runner.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn timeout_floor_is_enforced() {
        let runner = Arc::new(RecordingRunner {
            calls: Mutex::new(vec![]),
        });
        let verifier = Verifier::new(runner.clone());
        let mut ctx = context(&["make build", "make test"], None);
        ctx.verify_timeout = Some(Duration::from_secs(1));

        verifier.verify(&ctx, &[], &CancellationToken::new()).await;

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|(_, t)| *t == MIN_TIMEOUT));
    }

    #[tokio::test]
    async fn decisions_are_materialized_for_commands() {
        let verifier = Verifier::new(Arc::new(ShellRunner));
        let ctx = context(&["test -f src/app.ts && grep -q merged src/app.ts"], None);
        let decisions = vec![decision("src/app.ts", "merged content\n")];

        let verification = verifier
            .verify(&ctx, &decisions, &CancellationToken::new())
            .await;

        assert!(verification.passed());
    }

    #[tokio::test]
    async fn unsafe_paths_are_skipped_with_warning() {
        let verifier = Verifier::new(Arc::new(ShellRunner));
        let ctx = context(&["true"], None);
        let decisions = vec![
            decision("../escape.txt", "nope"),
            decision("/etc/owned", "nope"),
            decision("ok.txt", "fine"),
        ];

        let verification = verifier
            .verify(&ctx, &decisions, &CancellationToken::new())
            .await;

        assert!(verification.passed());
        assert_eq!(verification.warnings.len(), 2);
        assert!(verification.warnings[0].contains("../escape.txt"));
    }

    #[tokio::test]
    async fn cancelled_verification_fails_without_running() {
        let runner = Arc::new(FlakyRunner {
            fail_count: 0,
            runs: AtomicU32::new(0),
        });
        let verifier = Verifier::new(runner.clone());
        let ctx = context(&["make test"], None);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let verification = verifier.verify(&ctx, &[], &cancel).await;

        assert!(!verification.passed());
        assert_eq!(runner.runs.load(Ordering::SeqCst), 0);
    }
}
