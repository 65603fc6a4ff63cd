// src/services/mod.rs

//! Outbound integrations: subtitle retrieval and quiz generation.

pub mod generator;
pub mod transcript;

pub use generator::{OpenAiGenerator, QuizGenerator};
pub use transcript::{RapidApiClient, TranscriptSource, VideoDetails};
