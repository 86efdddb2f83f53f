// src/ranking.rs

use chrono::{DateTime, Utc};

/// Sentinel rank for attempts that are eligible but not a participant's first
/// perfect attempt. Surfaced as-is in API responses.
pub const UNRANKED: i64 = -1;

/// One eligible (perfect) attempt as read from the attempt log.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct EligibleAttempt {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub elapsed_seconds: i64,
    pub submitted_at: DateTime<Utc>,
}

/// Per-submission ranking feedback.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RankResult {
    pub eligible: bool,
    pub rank: i64,
    pub total_perfect: i64,
    pub is_first_perfect: bool,
}

impl RankResult {
    /// Result for a non-perfect attempt: never a ranking candidate.
    pub fn ineligible(total_perfect: i64) -> Self {
        Self {
            eligible: false,
            rank: UNRANKED,
            total_perfect,
            is_first_perfect: false,
        }
    }
}

/// Aggregate view over the full, undeduplicated attempt log.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Stats {
    pub total_submissions: i64,
    pub perfect_count: i64,
    pub avg_score: f64,
    pub avg_elapsed_seconds: f64,
    pub fastest_perfect_elapsed: Option<i64>,
}

/// Minimal projection of a logged attempt, enough for `statistics`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LoggedAttempt {
    pub score: i32,
    pub perfect: bool,
    pub elapsed_seconds: i64,
}

/// Collapses eligible attempts to one per participant, keeping the
/// earliest-submitted attempt for each email (ties on the timestamp fall back
/// to the lower row id, i.e. insertion order). Later perfect attempts by the
/// same participant never replace the first one, even when faster.
///
/// Email comparison is exact-string; any normalization must happen before
/// records enter the log.
pub fn first_attempts(mut rows: Vec<EligibleAttempt>) -> Vec<EligibleAttempt> {
    rows.sort_by(|a, b| {
        a.submitted_at
            .cmp(&b.submitted_at)
            .then(a.id.cmp(&b.id))
    });

    let mut seen = std::collections::HashSet::new();
    rows.retain(|row| seen.insert(row.email.clone()));
    rows
}

/// Builds the leaderboard: one entry per participant (their first perfect
/// attempt), sorted by elapsed time ascending with submission timestamp
/// ascending as the tie-break, truncated to `limit`.
pub fn leaderboard(rows: Vec<EligibleAttempt>, limit: usize) -> Vec<EligibleAttempt> {
    let mut firsts = first_attempts(rows);
    firsts.sort_by(|a, b| {
        a.elapsed_seconds
            .cmp(&b.elapsed_seconds)
            .then(a.submitted_at.cmp(&b.submitted_at))
            .then(a.id.cmp(&b.id))
    });
    firsts.truncate(limit);
    firsts
}

/// Computes ranking feedback for the eligible attempt with id `attempt_id`.
///
/// `rows` must contain every eligible attempt in the log, including the one
/// being ranked. Returns `None` if the attempt is missing from `rows`, which
/// signals an internal-consistency problem to the caller.
pub fn rank(rows: Vec<EligibleAttempt>, attempt_id: i64) -> Option<RankResult> {
    let attempt = rows.iter().find(|r| r.id == attempt_id)?.clone();
    let firsts = first_attempts(rows);
    let total_perfect = firsts.len() as i64;

    let is_first = firsts.iter().any(|f| f.id == attempt.id);
    if !is_first {
        return Some(RankResult {
            eligible: true,
            rank: UNRANKED,
            total_perfect,
            is_first_perfect: false,
        });
    }

    // 1 + distinct participants whose first perfect attempt is strictly
    // faster. Dedup already happened, so a plain count suffices.
    let faster = firsts
        .iter()
        .filter(|f| f.email != attempt.email && f.elapsed_seconds < attempt.elapsed_seconds)
        .count() as i64;

    Some(RankResult {
        eligible: true,
        rank: faster + 1,
        total_perfect,
        is_first_perfect: true,
    })
}

/// Descriptive rollup over every logged attempt. No dedup: repeat submissions
/// all count. Empty log yields zeroed averages and no fastest time.
pub fn statistics(rows: &[LoggedAttempt]) -> Stats {
    let total = rows.len() as i64;
    if total == 0 {
        return Stats {
            total_submissions: 0,
            perfect_count: 0,
            avg_score: 0.0,
            avg_elapsed_seconds: 0.0,
            fastest_perfect_elapsed: None,
        };
    }

    let perfect_count = rows.iter().filter(|r| r.perfect).count() as i64;
    let score_sum: i64 = rows.iter().map(|r| i64::from(r.score)).sum();
    let elapsed_sum: i64 = rows.iter().map(|r| r.elapsed_seconds).sum();
    let fastest_perfect_elapsed = rows
        .iter()
        .filter(|r| r.perfect)
        .map(|r| r.elapsed_seconds)
        .min();

    Stats {
        total_submissions: total,
        perfect_count,
        avg_score: score_sum as f64 / total as f64,
        avg_elapsed_seconds: elapsed_sum as f64 / total as f64,
        fastest_perfect_elapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn attempt(id: i64, email: &str, elapsed: i64, ts: i64) -> EligibleAttempt {
        EligibleAttempt {
            id,
            name: email.split('@').next().unwrap().to_string(),
            email: email.to_string(),
            elapsed_seconds: elapsed,
            submitted_at: at(ts),
        }
    }

    #[test]
    fn leaderboard_sorts_by_elapsed_then_timestamp() {
        let rows = vec![
            attempt(1, "a@x.com", 50, 1),
            attempt(2, "b@x.com", 30, 2),
            attempt(3, "c@x.com", 30, 3),
        ];
        let board = leaderboard(rows, 10);
        let emails: Vec<_> = board.iter().map(|e| e.email.as_str()).collect();
        // b and c tie on elapsed; b submitted earlier.
        assert_eq!(emails, vec!["b@x.com", "c@x.com", "a@x.com"]);
    }

    #[test]
    fn each_participant_appears_at_most_once() {
        let rows = vec![
            attempt(1, "a@x.com", 50, 1),
            attempt(2, "a@x.com", 40, 2),
            attempt(3, "b@x.com", 60, 3),
            attempt(4, "a@x.com", 10, 4),
        ];
        let board = leaderboard(rows, 10);
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].email, "a@x.com");
    }

    #[test]
    fn later_faster_attempt_does_not_replace_first() {
        // First perfect at 100s, later perfect at 80s.
        let rows = vec![
            attempt(1, "a@x.com", 100, 1),
            attempt(2, "a@x.com", 80, 2),
        ];
        let board = leaderboard(rows, 10);
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].id, 1);
        assert_eq!(board[0].elapsed_seconds, 100);
    }

    #[test]
    fn faster_retry_does_not_reorder_board() {
        // A(x, 45s, t=1), B(y, 30s, t=2), C(x, 20s, t=3).
        let rows = vec![
            attempt(1, "x@q.com", 45, 1),
            attempt(2, "y@q.com", 30, 2),
            attempt(3, "x@q.com", 20, 3),
        ];
        let board = leaderboard(rows, 10);
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].email, "y@q.com");
        assert_eq!(board[0].elapsed_seconds, 30);
        assert_eq!(board[1].email, "x@q.com");
        assert_eq!(board[1].elapsed_seconds, 45);
    }

    #[test]
    fn leaderboard_is_deterministic_and_truncates() {
        let rows: Vec<_> = (0..20)
            .map(|i| attempt(i, &format!("u{}@x.com", i), 100 - i, i))
            .collect();
        let a = leaderboard(rows.clone(), 10);
        let b = leaderboard(rows, 10);
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
        assert_eq!(a[0].elapsed_seconds, 81);
    }

    #[test]
    fn empty_log_leaderboard_is_empty() {
        assert!(leaderboard(Vec::new(), 10).is_empty());
    }

    #[test]
    fn first_perfect_ever_ranks_first() {
        let rows = vec![attempt(1, "a@x.com", 45, 1)];
        let result = rank(rows, 1).unwrap();
        assert_eq!(result.rank, 1);
        assert!(result.is_first_perfect);
        assert!(result.eligible);
        assert_eq!(result.total_perfect, 1);
    }

    #[test]
    fn rank_counts_distinct_faster_participants_only() {
        // b has two attempts faster than a's; they count once.
        let rows = vec![
            attempt(1, "b@x.com", 20, 1),
            attempt(2, "b@x.com", 10, 2),
            attempt(3, "a@x.com", 45, 3),
        ];
        let result = rank(rows, 3).unwrap();
        assert_eq!(result.rank, 2);
        assert_eq!(result.total_perfect, 2);
    }

    #[test]
    fn repeat_perfect_attempt_is_unranked_but_counted() {
        let rows = vec![
            attempt(1, "a@x.com", 100, 1),
            attempt(2, "a@x.com", 80, 2),
        ];
        let result = rank(rows, 2).unwrap();
        assert!(result.eligible);
        assert!(!result.is_first_perfect);
        assert_eq!(result.rank, UNRANKED);
        assert_eq!(result.total_perfect, 1);
    }

    #[test]
    fn equal_elapsed_ranks_by_submission_order() {
        let rows = vec![
            attempt(1, "a@x.com", 30, 1),
            attempt(2, "b@x.com", 30, 2),
        ];
        // Strictly-smaller comparison: a does not outrank b by time, so both
        // report rank 1, but the board orders a first.
        assert_eq!(rank(rows.clone(), 2).unwrap().rank, 1);
        let board = leaderboard(rows, 10);
        assert_eq!(board[0].email, "a@x.com");
    }

    #[test]
    fn rank_of_unknown_attempt_is_none() {
        assert!(rank(vec![attempt(1, "a@x.com", 30, 1)], 99).is_none());
    }

    #[test]
    fn statistics_over_mixed_log() {
        let rows = vec![
            LoggedAttempt { score: 7, perfect: true, elapsed_seconds: 40 },
            LoggedAttempt { score: 6, perfect: false, elapsed_seconds: 20 },
            LoggedAttempt { score: 7, perfect: true, elapsed_seconds: 60 },
        ];
        let stats = statistics(&rows);
        assert_eq!(stats.total_submissions, 3);
        assert_eq!(stats.perfect_count, 2);
        assert!((stats.avg_score - 20.0 / 3.0).abs() < 1e-9);
        assert!((stats.avg_elapsed_seconds - 40.0).abs() < 1e-9);
        // The non-perfect 20s attempt never wins fastest.
        assert_eq!(stats.fastest_perfect_elapsed, Some(40));
    }

    #[test]
    fn statistics_empty_log() {
        let stats = statistics(&[]);
        assert_eq!(stats.total_submissions, 0);
        assert_eq!(stats.avg_score, 0.0);
        assert_eq!(stats.fastest_perfect_elapsed, None);
    }
}
