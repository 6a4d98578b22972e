use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::entities::execution::ExecutionResult;
use crate::domain::entities::repository::Repository;
use crate::domain::value_objects::command_spec::CommandSpec;
use crate::infrastructure::process::{ExecutionConfig, ExecutionContext, ProcessRunner, RunOutcome};

/// 作業ツリーの状態取得コマンド
pub const STATUS_COMMAND: [&str; 3] = ["git", "status", "--porcelain"];

/// 現在のブランチ名の取得コマンド
pub const BRANCH_COMMAND: [&str; 4] = ["git", "rev-parse", "--abbrev-ref", "HEAD"];

/// porcelain出力から数えたファイル変更数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileChangeCounts {
    pub created: usize,
    pub modified: usize,
    pub deleted: usize,
}

impl FileChangeCounts {
    pub fn is_clean(&self) -> bool {
        self.created == 0 && self.modified == 0 && self.deleted == 0
    }
}

/// `git status --porcelain` の出力を分類する
///
/// 各行の先頭2桁（インデックス側・作業ツリー側）で判定する。
/// - `??` または `A` を含む: 追加
/// - `D` を含む: 削除
/// - `M` `R` `C` `T` `U` を含む: 変更
///
/// `!!`（無視ファイル）と空行は数えない。
pub fn parse_porcelain(text: &str) -> FileChangeCounts {
    let mut counts = FileChangeCounts::default();

    for line in text.lines() {
        // 先頭の空白は作業ツリー側の変更を表すのでtrimしない
        if line.trim().is_empty() {
            continue;
        }
        let code = line.get(..2).unwrap_or(line);

        if code == "!!" {
            continue;
        }
        if code == "??" || code.contains('A') {
            counts.created += 1;
        } else if code.contains('D') {
            counts.deleted += 1;
        } else if code.contains(&['M', 'R', 'C', 'T', 'U'][..]) {
            counts.modified += 1;
        }
    }

    counts
}

/// リポジトリ1件のステータスを取得する
pub struct StatusClassifier {
    runner: Arc<dyn ProcessRunner>,
}

impl StatusClassifier {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    /// ステータスを取得し、更新後のリポジトリと実行結果を返す
    ///
    /// `config` の作業ディレクトリはリポジトリのパスに置き換える。
    pub async fn classify(
        &self,
        repository: Repository,
        config: &ExecutionConfig,
        context: &ExecutionContext,
    ) -> (Repository, ExecutionResult) {
        let status_spec = CommandSpec::git(&STATUS_COMMAND[1..]);
        let command_text = status_spec.to_string();

        if !repository.is_valid {
            let message = format!(
                "not a git repository or path does not exist: {}",
                repository.path.display()
            );
            let result = ExecutionResult::failure(
                repository.name.clone(),
                command_text,
                -1,
                message,
                Duration::ZERO,
            );
            return (repository, result);
        }

        let config = config.clone().with_working_directory(&repository.path);
        let mut repository = repository;

        let outcome = self.runner.run(&status_spec, &config, context).await;
        let output = match outcome {
            Ok(RunOutcome::Completed(output)) if output.success() => output,
            Ok(RunOutcome::Completed(output)) => {
                repository.mark_error();
                let message = format!("{} exited with status {}", command_text, output.exit_code);
                let result = ExecutionResult::failure(
                    repository.name.clone(),
                    command_text,
                    output.exit_code,
                    message,
                    output.duration,
                )
                .with_output(output.output);
                return (repository, result);
            }
            Ok(RunOutcome::Cancelled { output, duration }) => {
                repository.mark_error();
                let result =
                    ExecutionResult::cancelled(repository.name.clone(), command_text, duration)
                        .with_output(output);
                return (repository, result);
            }
            Ok(RunOutcome::TimedOut { output, duration }) => {
                repository.mark_error();
                let result =
                    ExecutionResult::timeout(repository.name.clone(), command_text, duration)
                        .with_output(output);
                return (repository, result);
            }
            Err(e) => {
                warn!(repository = %repository.name, error = %e, "status check failed");
                repository.mark_error();
                let result = ExecutionResult::failure(
                    repository.name.clone(),
                    command_text,
                    -1,
                    e.to_string(),
                    Duration::ZERO,
                );
                return (repository, result);
            }
        };

        let counts = parse_porcelain(&output.output);
        let branch = self.query_branch(&repository.name, &config, context).await;
        debug!(
            repository = %repository.name,
            branch = %branch,
            created = counts.created,
            modified = counts.modified,
            deleted = counts.deleted,
            "classified working tree"
        );

        let repository = repository
            .with_file_changes(counts.created, counts.modified, counts.deleted)
            .with_branch(branch);
        let result = ExecutionResult::success(
            repository.name.clone(),
            command_text,
            output.output,
            output.duration,
        );
        (repository, result)
    }

    /// ブランチ名を取得（失敗時は空文字）
    async fn query_branch(
        &self,
        repository: &str,
        config: &ExecutionConfig,
        context: &ExecutionContext,
    ) -> String {
        let spec = CommandSpec::git(&BRANCH_COMMAND[1..]);
        match self.runner.run(&spec, config, context).await {
            Ok(RunOutcome::Completed(output)) if output.success() => output.output.trim().to_string(),
            Ok(other) => {
                debug!(repository = %repository, outcome = ?other, "branch query did not succeed");
                String::new()
            }
            Err(e) => {
                warn!(repository = %repository, error = %e, "branch query failed");
                String::new()
            }
        }
    }
}
