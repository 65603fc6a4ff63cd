// src/models/quiz.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,

    /// Owner; references `users.id`.
    pub user_id: String,

    /// 11-character YouTube video id the quiz was generated from.
    pub video_id: String,

    /// Video title from the metadata lookup, if it succeeded.
    pub title: Option<String>,

    pub created_at: chrono::DateTime<chrono::Utc>,

    /// Set on every submitted attempt.
    pub last_attempted: Option<chrono::DateTime<chrono::Utc>>,
}

/// Row of the quiz listing, with its question count.
#[derive(Debug, Serialize, FromRow)]
pub struct QuizSummary {
    pub id: i64,
    pub video_id: String,
    pub title: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_attempted: Option<chrono::DateTime<chrono::Utc>>,
    pub question_count: i64,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow)]
pub struct QuestionRow {
    pub id: i64,
    pub quiz_id: i64,
    pub position: i32,
    pub text: String,
}

/// Represents the 'answers' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Answer {
    pub id: i64,
    pub question_id: i64,
    pub position: i32,
    pub text: String,
    pub correct: bool,
}

/// A question with all of its answers, correct flags included.
/// Server-side only; clients get `PublicQuestion`.
#[derive(Debug, Clone)]
pub struct Question {
    pub id: i64,
    pub text: String,
    pub answers: Vec<Answer>,
}

impl Question {
    pub fn correct_answer(&self) -> Option<&Answer> {
        self.answers.iter().find(|a| a.correct)
    }
}

/// DTO for an answer option (excludes the correct flag).
#[derive(Debug, Serialize)]
pub struct PublicAnswer {
    pub id: i64,
    pub text: String,
}

/// DTO for sending a question to the client.
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub text: String,
    pub answers: Vec<PublicAnswer>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            text: q.text.clone(),
            answers: q
                .answers
                .iter()
                .map(|a| PublicAnswer {
                    id: a.id,
                    text: a.text.clone(),
                })
                .collect(),
        }
    }
}

/// DTO for a quiz ready to be taken.
#[derive(Debug, Serialize)]
pub struct QuizDetail {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub questions: Vec<PublicQuestion>,
}

/// DTO for requesting a new quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateQuizRequest {
    #[validate(length(max = 2048, message = "URL is too long."))]
    #[serde(default, alias = "video-url")]
    pub video_url: String,
}

/// DTO returned once a quiz has been generated and stored.
#[derive(Debug, Serialize)]
pub struct GenerateQuizResponse {
    pub success: bool,
    pub quiz_id: i64,
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitQuizRequest {
    /// Key: Question ID. Value: selected Answer ID.
    #[serde(default)]
    pub answers: HashMap<i64, i64>,
}

/// Quiz as produced by the language model, before it is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GeneratedQuiz {
    #[validate(length(min = 1, message = "The generated quiz has no questions."), nested)]
    pub questions: Vec<GeneratedQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GeneratedQuestion {
    #[validate(custom(function = validate_question_text))]
    pub question: String,
    #[validate(custom(function = validate_answers))]
    pub answers: Vec<GeneratedAnswer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedAnswer {
    pub text: String,
    pub correct: bool,
}

fn validate_question_text(text: &str) -> Result<(), validator::ValidationError> {
    if text.trim().is_empty() {
        return Err(validator::ValidationError::new("empty_question"));
    }
    Ok(())
}

/// A question needs at least two non-empty answers, exactly one of them correct.
fn validate_answers(answers: &[GeneratedAnswer]) -> Result<(), validator::ValidationError> {
    if answers.len() < 2 {
        return Err(validator::ValidationError::new("too_few_answers"));
    }
    if answers.iter().any(|a| a.text.trim().is_empty()) {
        return Err(validator::ValidationError::new("empty_answer"));
    }
    if answers.iter().filter(|a| a.correct).count() != 1 {
        return Err(validator::ValidationError::new("not_exactly_one_correct"));
    }
    Ok(())
}
