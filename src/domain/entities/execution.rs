use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::repository::Repository;

/// 1リポジトリでの実行の終端状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionState {
    /// 終了コード0で完了
    Success,
    /// 非0終了、無効なパス、起動失敗
    Failed,
    /// 呼び出し元による中断
    Cancelled,
    /// 共有デッドライン超過
    Timeout,
}

/// 単一リポジトリでのコマンド実行結果
///
/// 確定後は変更しない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// リポジトリ名
    pub repository: String,

    /// 実行したコマンド文字列
    pub command: String,

    /// 標準出力と標準エラー出力（到着順に結合）
    pub output: String,

    /// エラーメッセージ（失敗時）
    pub error_message: Option<String>,

    /// 終了コード（プロセスが終了コードを返さなかった場合は -1）
    pub exit_code: i32,

    /// 実行時間
    #[serde(rename = "durationMs", with = "duration_ms")]
    pub duration: Duration,

    /// 終端状態
    pub state: ExecutionState,
}

impl ExecutionResult {
    /// 成功結果を作成
    pub fn success(
        repository: impl Into<String>,
        command: impl Into<String>,
        output: String,
        duration: Duration,
    ) -> Self {
        Self {
            repository: repository.into(),
            command: command.into(),
            output,
            error_message: None,
            exit_code: 0,
            duration,
            state: ExecutionState::Success,
        }
    }

    /// 失敗結果を作成
    pub fn failure(
        repository: impl Into<String>,
        command: impl Into<String>,
        exit_code: i32,
        error: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            repository: repository.into(),
            command: command.into(),
            output: String::new(),
            error_message: Some(error.into()),
            exit_code,
            duration,
            state: ExecutionState::Failed,
        }
    }

    /// タイムアウト結果を作成
    pub fn timeout(
        repository: impl Into<String>,
        command: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            repository: repository.into(),
            command: command.into(),
            output: String::new(),
            error_message: Some("Command timed out".to_string()),
            exit_code: -1,
            duration,
            state: ExecutionState::Timeout,
        }
    }

    /// キャンセル結果を作成
    pub fn cancelled(
        repository: impl Into<String>,
        command: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            repository: repository.into(),
            command: command.into(),
            output: String::new(),
            error_message: Some("Command cancelled".to_string()),
            exit_code: -1,
            duration,
            state: ExecutionState::Cancelled,
        }
    }

    /// 捕捉済みの出力を設定
    pub fn with_output(mut self, output: String) -> Self {
        self.output = output;
        self
    }

    pub fn is_success(&self) -> bool {
        self.state == ExecutionState::Success
    }

    /// 失敗したかチェック（タイムアウトを含む）
    pub fn is_failure(&self) -> bool {
        matches!(self.state, ExecutionState::Failed | ExecutionState::Timeout)
    }

    pub fn is_cancelled(&self) -> bool {
        self.state == ExecutionState::Cancelled
    }
}

/// 全体の実行結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// 解決済みターゲット順の実行結果
    pub results: Vec<ExecutionResult>,

    pub total_count: usize,

    pub successful_count: usize,

    /// 失敗数（タイムアウトを含む）
    pub failed_count: usize,

    pub cancelled_count: usize,

    /// 開始から最後のタスク完了までの実時間
    #[serde(rename = "totalDurationMs", with = "duration_ms")]
    pub total_duration: Duration,

    /// 実行開始時刻
    pub started_at: DateTime<Utc>,
}

impl Summary {
    /// 全タスクが成功したか
    pub fn is_success(&self) -> bool {
        self.failed_count == 0 && self.cancelled_count == 0
    }

    /// タイムアウトした件数（`failed_count` の内数）
    pub fn timed_out_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.state == ExecutionState::Timeout)
            .count()
    }

    /// プロセス全体を失敗として終了すべきか
    pub fn should_fail(&self, allow_failure: bool) -> bool {
        !allow_failure && !self.is_success()
    }
}

/// コーディネータの戻り値
///
/// `repositories` は `summary.results` と同じ順序で、実行後のリポジトリ状態を持つ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub summary: Summary,
    pub repositories: Vec<Repository>,
}

impl RunReport {
    /// リポジトリと結果の組を順に返す
    pub fn entries(&self) -> impl Iterator<Item = (&Repository, &ExecutionResult)> {
        self.repositories.iter().zip(self.summary.results.iter())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_result_states() {
        let ok = ExecutionResult::success("web", "git pull", "done".to_string(), Duration::from_millis(5));
        assert!(ok.is_success());
        assert!(!ok.is_failure());
        assert_eq!(ok.exit_code, 0);

        let failed = ExecutionResult::failure("web", "false", 1, "exited with status 1", Duration::ZERO);
        assert!(failed.is_failure());
        assert_eq!(failed.exit_code, 1);

        let timed_out = ExecutionResult::timeout("web", "sleep 5", Duration::from_secs(1));
        assert!(timed_out.is_failure());
        assert_eq!(timed_out.state, ExecutionState::Timeout);
        assert_eq!(timed_out.exit_code, -1);

        let cancelled = ExecutionResult::cancelled("web", "sleep 5", Duration::ZERO);
        assert!(cancelled.is_cancelled());
        assert!(!cancelled.is_failure());
    }

    #[test]
    fn test_execution_result_wire_shape() {
        let result = ExecutionResult::failure("api", "make", 2, "exited with status 2", Duration::from_millis(1500))
            .with_output("boom\n".to_string());
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["repository"], "api");
        assert_eq!(value["command"], "make");
        assert_eq!(value["output"], "boom\n");
        assert_eq!(value["errorMessage"], "exited with status 2");
        assert_eq!(value["exitCode"], 2);
        assert_eq!(value["durationMs"], 1500);
        assert_eq!(value["state"], "failed");
    }

    #[test]
    fn test_summary_should_fail_respects_allow_failure() {
        let summary = Summary {
            results: vec![ExecutionResult::failure("a", "x", 1, "e", Duration::ZERO)],
            total_count: 1,
            successful_count: 0,
            failed_count: 1,
            cancelled_count: 0,
            total_duration: Duration::ZERO,
            started_at: Utc::now(),
        };

        assert!(summary.should_fail(false));
        assert!(!summary.should_fail(true));
        assert_eq!(summary.timed_out_count(), 0);
    }
}
