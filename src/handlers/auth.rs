// src/handlers/auth.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use sqlx::PgPool;

use crate::{error::AppError, models::user::User, utils::jwt::Claims};

/// Creates the user row for a verified identity, or refreshes its email and
/// name from the latest token.
///
/// The identity provider owns login; this only mirrors the subject locally so
/// quizzes have an owner to reference. An email claim is required.
pub async fn ensure_user(pool: &PgPool, claims: &Claims) -> Result<User, AppError> {
    let email = claims
        .email
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AppError::AuthError("Token is missing an email claim".to_string()))?;

    let name = claims.display_name().unwrap_or_else(|| email.to_string());

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, name)
        VALUES ($1, $2, $3)
        ON CONFLICT (id) DO UPDATE SET email = EXCLUDED.email, name = EXCLUDED.name
        RETURNING id, email, name, created_at
        "#,
    )
    .bind(&claims.sub)
    .bind(email)
    .bind(&name)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to sync user {}: {:?}", claims.sub, e);
        AppError::from(e)
    })?;

    Ok(user)
}

/// First-login hook: mirrors the authenticated identity into `users`.
pub async fn callback(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = ensure_user(&pool, &claims).await?;
    tracing::info!("User {} signed in", user.id);
    Ok(Json(user))
}

/// Get the current user's row.
pub async fn get_me(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, email, name, created_at FROM users WHERE id = $1",
    )
    .bind(&claims.sub)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}
