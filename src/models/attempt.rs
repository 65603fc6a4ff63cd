// src/models/attempt.rs

use serde::Serialize;
use sqlx::FromRow;

use crate::scoring::{Grade, QuestionResult};

/// Represents the 'attempts' table in the database.
/// One row per completed pass through a quiz; rows are append-only.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Attempt {
    pub id: i64,
    pub quiz_id: i64,
    pub score: i32,
    pub total: i32,
    pub percentage: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO returned after submitting a quiz.
#[derive(Debug, Serialize)]
pub struct AttemptResponse {
    pub success: bool,
    pub attempt_id: i64,
    pub score: i32,
    pub total: i32,
    pub percentage: f64,
    pub perfect: bool,
    pub results: Vec<QuestionResult>,
}

impl AttemptResponse {
    pub fn new(attempt_id: i64, grade: Grade) -> Self {
        Self {
            success: true,
            attempt_id,
            score: grade.score,
            total: grade.total,
            percentage: grade.percentage,
            perfect: grade.is_perfect(),
            results: grade.results,
        }
    }
}
