use std::sync::Arc;

use crate::config::Config;
use crate::services::{QuizGenerator, TranscriptSource};
use axum::extract::FromRef;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub transcripts: Arc<dyn TranscriptSource>,
    pub generator: Arc<dyn QuizGenerator>,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
