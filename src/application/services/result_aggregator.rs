use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::domain::entities::execution::{ExecutionResult, ExecutionState, Summary};

/// A finalized task, as handed to the aggregator after the join
#[derive(Debug, Clone)]
pub struct CompletedTask {
    pub result: ExecutionResult,
    pub finished_at: Instant,
}

/// Fold per-target results into a [`Summary`].
///
/// `tasks` must already be in target order. `total_duration` is measured from
/// `started_at` to the latest `finished_at`, not summed.
pub fn aggregate(
    started_at: Instant,
    started_wall: DateTime<Utc>,
    tasks: Vec<CompletedTask>,
) -> Summary {
    let last_finish = tasks
        .iter()
        .map(|task| task.finished_at)
        .max()
        .unwrap_or(started_at);
    let total_duration = last_finish.saturating_duration_since(started_at);

    let mut successful_count = 0;
    let mut failed_count = 0;
    let mut cancelled_count = 0;
    let results: Vec<ExecutionResult> = tasks
        .into_iter()
        .map(|task| {
            match task.result.state {
                ExecutionState::Success => successful_count += 1,
                ExecutionState::Failed | ExecutionState::Timeout => failed_count += 1,
                ExecutionState::Cancelled => cancelled_count += 1,
            }
            task.result
        })
        .collect();

    Summary {
        total_count: results.len(),
        results,
        successful_count,
        failed_count,
        cancelled_count,
        total_duration,
        started_at: started_wall,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn task(result: ExecutionResult, start: Instant, offset_ms: u64) -> CompletedTask {
        CompletedTask {
            result,
            finished_at: start + Duration::from_millis(offset_ms),
        }
    }

    #[test]
    fn test_counts_add_up() {
        let start = Instant::now();
        let tasks = vec![
            task(ExecutionResult::success("a", "x", String::new(), Duration::from_millis(10)), start, 10),
            task(ExecutionResult::failure("b", "x", 1, "exit 1", Duration::from_millis(20)), start, 20),
            task(ExecutionResult::timeout("c", "x", Duration::from_millis(30)), start, 30),
            task(ExecutionResult::cancelled("d", "x", Duration::from_millis(5)), start, 5),
        ];

        let summary = aggregate(start, Utc::now(), tasks);

        assert_eq!(summary.total_count, 4);
        assert_eq!(summary.successful_count, 1);
        assert_eq!(summary.failed_count, 2);
        assert_eq!(summary.cancelled_count, 1);
        assert_eq!(summary.timed_out_count(), 1);
        assert_eq!(
            summary.successful_count + summary.failed_count + summary.cancelled_count,
            summary.total_count
        );
    }

    #[test]
    fn test_total_duration_is_wall_clock() {
        let start = Instant::now();
        let tasks = vec![
            task(ExecutionResult::success("a", "x", String::new(), Duration::from_millis(90)), start, 100),
            task(ExecutionResult::success("b", "x", String::new(), Duration::from_millis(95)), start, 100),
        ];

        let summary = aggregate(start, Utc::now(), tasks);

        assert_eq!(summary.total_duration, Duration::from_millis(100));
        let summed: Duration = summary.results.iter().map(|r| r.duration).sum();
        assert_eq!(summed, Duration::from_millis(185));
    }

    #[test]
    fn test_order_is_preserved() {
        let start = Instant::now();
        let tasks = vec![
            task(ExecutionResult::success("z", "x", String::new(), Duration::ZERO), start, 50),
            task(ExecutionResult::success("a", "x", String::new(), Duration::ZERO), start, 1),
        ];

        let summary = aggregate(start, Utc::now(), tasks);
        let names: Vec<_> = summary.results.iter().map(|r| r.repository.as_str()).collect();
        assert_eq!(names, vec!["z", "a"]);
    }

    #[test]
    fn test_empty_input() {
        let start = Instant::now();
        let summary = aggregate(start, Utc::now(), Vec::new());
        assert_eq!(summary.total_count, 0);
        assert_eq!(summary.total_duration, Duration::ZERO);
        assert!(summary.is_success());
    }
}
