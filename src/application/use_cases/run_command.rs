use chrono::Utc;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::services::result_aggregator::{aggregate, CompletedTask};
use crate::application::use_cases::status_check::StatusClassifier;
use crate::domain::entities::execution::{ExecutionResult, RunReport};
use crate::domain::entities::repository::Repository;
use crate::domain::value_objects::command_spec::{CommandSpec, Operation};
use crate::domain::value_objects::concurrency_policy::ConcurrencyPolicy;
use crate::infrastructure::process::{ExecutionConfig, ExecutionContext, ProcessRunner, RunOutcome};

/// リポジトリ名を子プロセスに渡す環境変数
pub const REPO_NAME_ENV: &str = "GITGROUP_REPO_NAME";

/// リポジトリパスを子プロセスに渡す環境変数
pub const REPO_PATH_ENV: &str = "GITGROUP_REPO_PATH";

/// 一括実行の設定
#[derive(Debug, Clone, Default)]
pub struct RunCommandConfig {
    /// 呼び出し全体で共有するタイムアウト（Noneの場合は無制限）
    pub timeout: Option<Duration>,

    /// 同時に実行するプロセス数の上限
    pub concurrency: ConcurrencyPolicy,

    /// 追加の環境変数
    pub environment_variables: HashMap<String, String>,

    /// 確定した結果を完了順に通知する送信側
    pub progress: Option<mpsc::UnboundedSender<ExecutionResult>>,
}

impl RunCommandConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// タイムアウトを設定
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// 並列度を設定
    pub fn with_concurrency(mut self, concurrency: ConcurrencyPolicy) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// 環境変数を追加
    pub fn with_environment_variable(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.environment_variables.insert(key.into(), value.into());
        self
    }

    /// 進捗通知先を設定
    pub fn with_progress(mut self, progress: mpsc::UnboundedSender<ExecutionResult>) -> Self {
        self.progress = Some(progress);
        self
    }
}

/// 複数リポジトリへの一括実行のユースケース
///
/// 対象ごとに1タスクを起動し、セマフォで同時実行数を制限する。
/// 各タスクの失敗は他のタスクに影響しない。
pub struct RunCommandUseCase {
    runner: Arc<dyn ProcessRunner>,
    config: RunCommandConfig,
}

impl RunCommandUseCase {
    pub fn new(runner: Arc<dyn ProcessRunner>, config: RunCommandConfig) -> Self {
        Self { runner, config }
    }

    /// 全対象で操作を実行し、全タスクが終端状態になってから返す
    ///
    /// 結果は完了順ではなく `targets` の順に並ぶ。
    pub async fn execute(
        &self,
        targets: Vec<Repository>,
        operation: &Operation,
        cancel: &CancellationToken,
    ) -> RunReport {
        let started_at = Instant::now();
        let started_wall = Utc::now();
        let command_text = operation.command_text();

        let mut scope = ExecutionContext::child_of(cancel);
        if let Some(timeout) = self.config.timeout {
            scope = scope.with_deadline(started_at + timeout);
        }

        let permits = self.config.concurrency.permits_for(targets.len());
        let semaphore = Arc::new(Semaphore::new(permits));

        info!(
            command = %command_text,
            targets = targets.len(),
            permits,
            timeout_secs = ?self.config.timeout.map(|t| t.as_secs_f64()),
            "starting run"
        );

        let handles: Vec<_> = targets
            .iter()
            .cloned()
            .map(|repository| {
                let task = RepositoryTask {
                    runner: self.runner.clone(),
                    operation: operation.clone(),
                    command_text: command_text.clone(),
                    base_config: self.base_config(&repository),
                    context: scope.clone(),
                    semaphore: semaphore.clone(),
                    progress: self.config.progress.clone(),
                };
                tokio::spawn(task.run(repository))
            })
            .collect();

        let joined = join_all(handles).await;

        let mut repositories = Vec::with_capacity(joined.len());
        let mut completed = Vec::with_capacity(joined.len());
        for (target, join_result) in targets.into_iter().zip(joined) {
            match join_result {
                Ok((repository, task)) => {
                    repositories.push(repository);
                    completed.push(task);
                }
                Err(e) => {
                    warn!(repository = %target.name, error = %e, "task aborted");
                    let result = ExecutionResult::failure(
                        target.name.clone(),
                        command_text.clone(),
                        -1,
                        format!("task aborted: {}", e),
                        started_at.elapsed(),
                    );
                    if let Some(progress) = &self.config.progress {
                        let _ = progress.send(result.clone());
                    }
                    let mut target = target;
                    target.mark_error();
                    repositories.push(target);
                    completed.push(CompletedTask {
                        result,
                        finished_at: Instant::now(),
                    });
                }
            }
        }

        let summary = aggregate(started_at, started_wall, completed);
        info!(
            total = summary.total_count,
            successful = summary.successful_count,
            failed = summary.failed_count,
            cancelled = summary.cancelled_count,
            elapsed_ms = summary.total_duration.as_millis() as u64,
            "run finished"
        );

        RunReport {
            summary,
            repositories,
        }
    }

    fn base_config(&self, repository: &Repository) -> ExecutionConfig {
        let mut config = ExecutionConfig::new()
            .with_working_directory(&repository.path)
            .with_environment_variable(REPO_NAME_ENV, repository.name.clone())
            .with_environment_variable(REPO_PATH_ENV, repository.path.display().to_string());
        for (key, value) in &self.config.environment_variables {
            config = config.with_environment_variable(key.clone(), value.clone());
        }
        config
    }
}

/// 1リポジトリ分のタスクが持つ状態
struct RepositoryTask {
    runner: Arc<dyn ProcessRunner>,
    operation: Operation,
    command_text: String,
    base_config: ExecutionConfig,
    context: ExecutionContext,
    semaphore: Arc<Semaphore>,
    progress: Option<mpsc::UnboundedSender<ExecutionResult>>,
}

impl RepositoryTask {
    async fn run(self, repository: Repository) -> (Repository, CompletedTask) {
        let queued_at = Instant::now();

        // 待機中にキャンセル・期限切れになったタスクはプロセスを起動しない
        let permit = tokio::select! {
            biased;

            _ = self.context.token().cancelled() => None,
            _ = self.context.expired() => None,
            permit = self.semaphore.clone().acquire_owned() => permit.ok(),
        };

        let (repository, result) = match permit {
            Some(_permit) => self.run_with_permit(repository).await,
            None => {
                let result = self.unstarted_result(&repository, queued_at.elapsed());
                let mut repository = repository;
                if matches!(self.operation, Operation::Status) {
                    repository.mark_error();
                }
                (repository, result)
            }
        };

        debug!(
            repository = %result.repository,
            state = ?result.state,
            exit_code = result.exit_code,
            duration_ms = result.duration.as_millis() as u64,
            "task finished"
        );
        if let Some(progress) = &self.progress {
            let _ = progress.send(result.clone());
        }

        let finished_at = Instant::now();
        (repository, CompletedTask { result, finished_at })
    }

    async fn run_with_permit(&self, repository: Repository) -> (Repository, ExecutionResult) {
        match &self.operation {
            Operation::Status => {
                StatusClassifier::new(self.runner.clone())
                    .classify(repository, &self.base_config, &self.context)
                    .await
            }
            Operation::Execute(spec) => {
                let result = self.execute_in(&repository, spec).await;
                (repository, result)
            }
        }
    }

    async fn execute_in(&self, repository: &Repository, spec: &CommandSpec) -> ExecutionResult {
        let name = repository.name.clone();
        let command = self.command_text.clone();

        if !repository.is_valid {
            return ExecutionResult::failure(
                name,
                command,
                -1,
                format!(
                    "not a git repository or path does not exist: {}",
                    repository.path.display()
                ),
                Duration::ZERO,
            );
        }

        match self.runner.run(spec, &self.base_config, &self.context).await {
            Ok(RunOutcome::Completed(output)) if output.success() => {
                ExecutionResult::success(name, command, output.output, output.duration)
            }
            Ok(RunOutcome::Completed(output)) => ExecutionResult::failure(
                name,
                command,
                output.exit_code,
                format!("exited with status {}", output.exit_code),
                output.duration,
            )
            .with_output(output.output),
            Ok(RunOutcome::Cancelled { output, duration }) => {
                ExecutionResult::cancelled(name, command, duration).with_output(output)
            }
            Ok(RunOutcome::TimedOut { output, duration }) => {
                ExecutionResult::timeout(name, command, duration).with_output(output)
            }
            Err(e) => {
                warn!(repository = %name, error = %e, "failed to run command");
                ExecutionResult::failure(name, command, -1, e.to_string(), Duration::ZERO)
            }
        }
    }

    /// セマフォ待機中に中断されたタスクの結果
    fn unstarted_result(&self, repository: &Repository, waited: Duration) -> ExecutionResult {
        let name = repository.name.clone();
        let command = self.command_text.clone();
        if self.context.is_cancelled() {
            ExecutionResult::cancelled(name, command, waited)
        } else if self.context.is_expired() {
            ExecutionResult::timeout(name, command, waited)
        } else {
            ExecutionResult::failure(name, command, -1, "concurrency limiter closed", waited)
        }
    }
}
