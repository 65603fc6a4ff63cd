// src/handlers/quiz.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::auth::ensure_user,
    models::{
        attempt::{Attempt, AttemptResponse},
        quiz::{
            Answer, GenerateQuizRequest, GenerateQuizResponse, GeneratedQuiz, PublicQuestion,
            Question, QuestionRow, Quiz, QuizDetail, QuizSummary, SubmitQuizRequest,
        },
    },
    scoring::grade,
    services::VideoDetails,
    state::AppState,
    utils::{
        extract::{ApiJson, ApiPath, JsonOrForm},
        html::clean_text,
        jwt::Claims,
        youtube::validate_youtube_link,
    },
};

/// Generates a quiz from a YouTube link.
///
/// * Validates the link and extracts the video id.
/// * Fetches the transcript (required) and the video metadata (best-effort).
/// * Asks the language model for a quiz and validates its structure.
/// * Stores quiz, questions and answers in one transaction.
pub async fn generate_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonOrForm(payload): JsonOrForm<GenerateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let video_id = validate_youtube_link(&payload.video_url)?;
    tracing::info!("User {} requested a quiz for video {}", claims.sub, video_id);

    let transcript = state.transcripts.fetch_transcript(&video_id).await?;

    let details = match state.transcripts.fetch_details(&video_id).await {
        Ok(details) => details,
        Err(e) => {
            tracing::warn!("No metadata for video {}: {}", video_id, e);
            VideoDetails::default()
        }
    };

    let generated = state.generator.generate(&transcript).await?;

    let user = ensure_user(&state.pool, &claims).await?;
    let quiz_id = insert_quiz(
        &state.pool,
        &user.id,
        &video_id,
        details.title.as_deref(),
        &generated,
    )
    .await?;

    tracing::info!(
        "Quiz {} created with {} questions",
        quiz_id,
        generated.questions.len()
    );

    Ok((
        StatusCode::CREATED,
        Json(GenerateQuizResponse {
            success: true,
            quiz_id,
        }),
    ))
}

/// Lists the caller's quizzes, newest first.
pub async fn list_quizzes(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = sqlx::query_as::<_, QuizSummary>(
        r#"
        SELECT
            q.id,
            q.video_id,
            q.title,
            q.created_at,
            q.last_attempted,
            COUNT(qs.id) AS question_count
        FROM quizzes q
        LEFT JOIN questions qs ON qs.quiz_id = q.id
        WHERE q.user_id = $1
        GROUP BY q.id
        ORDER BY q.created_at DESC, q.id DESC
        "#,
    )
    .bind(&claims.sub)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list quizzes: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(quizzes))
}

/// Returns one of the caller's quizzes, without revealing correct answers.
pub async fn get_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = find_owned_quiz(&pool, id, &claims.sub).await?;
    let questions = load_questions(&pool, quiz.id).await?;

    Ok(Json(QuizDetail {
        quiz,
        questions: questions.iter().map(PublicQuestion::from).collect(),
    }))
}

/// Grades a submission and records it as a new attempt.
///
/// Every submission appends a row; questions and answers are never touched.
pub async fn submit_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = find_owned_quiz(&pool, id, &claims.sub).await?;
    let questions = load_questions(&pool, quiz.id).await?;

    let grade = grade(&questions, &req.answers);

    let mut tx = pool.begin().await?;

    let attempt_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO attempts (quiz_id, score, total, percentage)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(quiz.id)
    .bind(grade.score)
    .bind(grade.total)
    .bind(grade.percentage)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to record attempt: {:?}", e);
        AppError::from(e)
    })?;

    sqlx::query("UPDATE quizzes SET last_attempted = NOW() WHERE id = $1")
        .bind(quiz.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        "Attempt {} on quiz {}: {}/{}",
        attempt_id,
        quiz.id,
        grade.score,
        grade.total
    );

    Ok(Json(AttemptResponse::new(attempt_id, grade)))
}

/// Lists the attempts of one of the caller's quizzes, newest first.
pub async fn list_attempts(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = find_owned_quiz(&pool, id, &claims.sub).await?;

    let attempts = sqlx::query_as::<_, Attempt>(
        r#"
        SELECT id, quiz_id, score, total, percentage, created_at
        FROM attempts
        WHERE quiz_id = $1
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(quiz.id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(attempts))
}

/// Stores a generated quiz with its questions and answers.
///
/// Question and answer text arrive sanitized from the generator; the video
/// title is cleaned here. Positions keep the model's ordering.
async fn insert_quiz(
    pool: &PgPool,
    user_id: &str,
    video_id: &str,
    title: Option<&str>,
    generated: &GeneratedQuiz,
) -> Result<i64, AppError> {
    let mut tx = pool.begin().await?;

    let quiz_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO quizzes (user_id, video_id, title)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(video_id)
    .bind(title.map(clean_text))
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to insert quiz: {:?}", e);
        AppError::from(e)
    })?;

    for (position, question) in generated.questions.iter().enumerate() {
        let question_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO questions (quiz_id, position, text)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(quiz_id)
        .bind(position as i32)
        .bind(&question.question)
        .fetch_one(&mut *tx)
        .await?;

        let mut query_builder =
            QueryBuilder::<Postgres>::new("INSERT INTO answers (question_id, position, text, correct) ");
        query_builder.push_values(
            question.answers.iter().enumerate(),
            |mut row, (answer_position, answer)| {
                row.push_bind(question_id)
                    .push_bind(answer_position as i32)
                    .push_bind(answer.text.as_str())
                    .push_bind(answer.correct);
            },
        );
        query_builder.build().execute(&mut *tx).await?;
    }

    tx.commit().await?;
    Ok(quiz_id)
}

/// Fetches a quiz owned by `user_id`. Other users' quizzes are reported as missing.
async fn find_owned_quiz(pool: &PgPool, id: i64, user_id: &str) -> Result<Quiz, AppError> {
    sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, user_id, video_id, title, created_at, last_attempted
        FROM quizzes
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))
}

/// Loads questions in order, each with its ordered answers.
async fn load_questions(pool: &PgPool, quiz_id: i64) -> Result<Vec<Question>, AppError> {
    let rows = sqlx::query_as::<_, QuestionRow>(
        "SELECT id, quiz_id, position, text FROM questions WHERE quiz_id = $1 ORDER BY position, id",
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await?;

    let answers = sqlx::query_as::<_, Answer>(
        r#"
        SELECT a.id, a.question_id, a.position, a.text, a.correct
        FROM answers a
        JOIN questions q ON a.question_id = q.id
        WHERE q.quiz_id = $1
        ORDER BY a.question_id, a.position, a.id
        "#,
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await?;

    let mut by_question: HashMap<i64, Vec<Answer>> = HashMap::new();
    for answer in answers {
        by_question.entry(answer.question_id).or_default().push(answer);
    }

    Ok(rows
        .into_iter()
        .map(|row| Question {
            id: row.id,
            text: row.text,
            answers: by_question.remove(&row.id).unwrap_or_default(),
        })
        .collect())
}
