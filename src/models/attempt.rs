// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use crate::ranking::{EligibleAttempt, RankResult};

/// DTO for submitting a quiz attempt.
///
/// Raw free-text answers keyed by question id ("question1".."question7").
/// Scoring happens server-side; a posted score would not be trusted anyway.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitQuizRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    /// Dedup key for the leaderboard. Matched exactly as received, no
    /// case or whitespace normalization.
    #[validate(email)]
    pub email: String,

    /// Completion time measured by the client, in whole seconds.
    #[validate(range(min = 0))]
    pub elapsed_seconds: i64,

    pub answers: HashMap<String, String>,
}

/// Response body for a processed submission.
#[derive(Debug, Serialize)]
pub struct SubmitQuizResponse {
    pub id: i64,
    pub score: i32,
    pub perfect: bool,
    pub elapsed_seconds: i64,
    pub ranking: RankResult,
    pub message: &'static str,
}

/// One leaderboard row as returned to clients.
#[derive(Debug, Serialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub email: String,
    pub elapsed_seconds: i64,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

impl From<EligibleAttempt> for LeaderboardEntry {
    fn from(a: EligibleAttempt) -> Self {
        Self {
            name: a.name,
            email: a.email,
            elapsed_seconds: a.elapsed_seconds,
            submitted_at: a.submitted_at,
        }
    }
}

/// Query parameters for the leaderboard endpoint.
#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub limit: Option<usize>,
}
