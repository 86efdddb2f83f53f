// src/handlers/quiz.rs

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    grader,
    models::attempt::{LeaderboardEntry, LeaderboardParams, SubmitQuizRequest, SubmitQuizResponse},
    ranking::{self, EligibleAttempt, LoggedAttempt, RankResult},
};

const DEFAULT_LEADERBOARD_LIMIT: usize = 10;
const MAX_LEADERBOARD_LIMIT: usize = 100;

/// Every eligible (perfect) attempt in the log; the ranking engine does the
/// dedup and ordering on top of this.
const ELIGIBLE_SQL: &str =
    "SELECT id, name, email, elapsed_seconds, submitted_at FROM attempts WHERE perfect";

/// Accepts a quiz submission: grades it, appends it to the attempt log, and
/// returns ranking feedback.
///
/// * The attempt row and (for perfect scores) the leaderboard claim are
///   written in one transaction, so a failed submission leaves no trace.
/// * First-perfect status comes from the `perfect_firsts` primary key, which
///   makes concurrent submissions from the same new participant resolve to
///   exactly one "first".
/// * Rank is computed inside the same transaction; if the claim and the
///   attempt log disagree, the transaction rolls back and the client gets an
///   error instead of a fabricated rank.
pub async fn submit_quiz(
    State(pool): State<PgPool>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let graded = grader::grade(&payload.answers);

    let mut tx = pool.begin().await?;

    let (attempt_id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO attempts (name, email, answers, score, perfect, elapsed_seconds)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(sqlx::types::Json(&payload.answers))
    .bind(graded.score)
    .bind(graded.perfect)
    .bind(payload.elapsed_seconds)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to insert attempt: {:?}", e);
        AppError::from(e)
    })?;

    let ranking_info = if graded.perfect {
        let claim = sqlx::query(
            "INSERT INTO perfect_firsts (email, attempt_id) VALUES ($1, $2) \
             ON CONFLICT (email) DO NOTHING",
        )
        .bind(&payload.email)
        .bind(attempt_id)
        .execute(&mut *tx)
        .await?;
        let claimed_first = claim.rows_affected() == 1;

        // The transaction sees its own insert, so the new attempt is part of
        // the eligible set here.
        let rows: Vec<EligibleAttempt> = sqlx::query_as(ELIGIBLE_SQL)
            .fetch_all(&mut *tx)
            .await?;

        let result = ranking::rank(rows, attempt_id).ok_or_else(|| {
            AppError::InternalServerError(format!(
                "attempt {} missing from eligible set right after insert",
                attempt_id
            ))
        })?;

        if result.is_first_perfect != claimed_first {
            return Err(AppError::Conflict(
                "first-perfect claim lost a concurrent race, please retry".to_string(),
            ));
        }
        result
    } else {
        let total_perfect: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM perfect_firsts")
            .fetch_one(&mut *tx)
            .await?;
        RankResult::ineligible(total_perfect)
    };

    tx.commit().await?;

    tracing::info!(
        name = %payload.name,
        email = %payload.email,
        score = graded.score,
        elapsed_seconds = payload.elapsed_seconds,
        perfect = graded.perfect,
        "quiz submitted"
    );

    Ok(Json(SubmitQuizResponse {
        id: attempt_id,
        score: graded.score,
        perfect: graded.perfect,
        elapsed_seconds: payload.elapsed_seconds,
        ranking: ranking_info,
        message: "Quiz submitted successfully!",
    }))
}

/// Returns the current leaderboard: each participant's first perfect attempt,
/// fastest completion first. Recomputed from the log on every call.
pub async fn get_leaderboard(
    State(pool): State<PgPool>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
        .clamp(1, MAX_LEADERBOARD_LIMIT);

    let rows: Vec<EligibleAttempt> = sqlx::query_as(ELIGIBLE_SQL)
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch leaderboard: {:?}", e);
            AppError::from(e)
        })?;

    let entries: Vec<LeaderboardEntry> = ranking::leaderboard(rows, limit)
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(entries))
}

/// Aggregate statistics over the full attempt log, repeats included.
pub async fn get_stats(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let rows: Vec<LoggedAttempt> =
        sqlx::query_as("SELECT score, perfect, elapsed_seconds FROM attempts")
            .fetch_all(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch statistics: {:?}", e);
                AppError::from(e)
            })?;

    Ok(Json(ranking::statistics(&rows)))
}
