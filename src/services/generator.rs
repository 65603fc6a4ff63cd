// src/services/generator.rs

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;
use validator::Validate;

use crate::{
    config::Config, error::AppError, models::quiz::GeneratedQuiz, utils::html::clean_text,
};

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that generates quiz questions based on provided content.";

/// Turns a transcript into a validated multiple-choice quiz.
#[async_trait]
pub trait QuizGenerator: Send + Sync {
    async fn generate(&self, transcript: &str) -> Result<GeneratedQuiz, AppError>;
}

/// Quiz generator backed by an OpenAI-compatible chat completions endpoint.
#[derive(Clone, Debug)]
pub struct OpenAiGenerator {
    api_key: String,
    base_url: String,
    model: String,
    question_count: usize,
    answer_count: usize,
    http: reqwest::Client,
}

impl OpenAiGenerator {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        Ok(Self {
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            model: config.openai_model.clone(),
            question_count: config.question_count,
            answer_count: config.answer_count,
            http,
        })
    }

    fn request_body(&self, transcript: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": build_prompt(transcript, self.question_count, self.answer_count)
                }
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": { "name": "quiz", "strict": true, "schema": quiz_schema() }
            }
        })
    }
}

#[derive(Deserialize)]
struct Completion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
    refusal: Option<String>,
}

#[async_trait]
impl QuizGenerator for OpenAiGenerator {
    #[instrument(skip(self, transcript), fields(model = %self.model, transcript_len = transcript.len()))]
    async fn generate(&self, transcript: &str) -> Result<GeneratedQuiz, AppError> {
        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(transcript))
            .send()
            .await?;

        let status = resp.status();
        if status == 401 {
            return Err(AppError::Upstream(
                "Language model authentication failed".to_string(),
            ));
        }
        if status == 429 {
            return Err(AppError::Upstream(
                "Language model rate limit exceeded".to_string(),
            ));
        }
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Language model returned {}: {}", status, txt);
            return Err(AppError::Upstream(format!(
                "Language model returned {}",
                status.as_u16()
            )));
        }

        let completion: Completion = resp.json().await?;
        let message = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| AppError::Upstream("Language model returned no choices".to_string()))?;

        if let Some(refusal) = message.refusal {
            return Err(AppError::Upstream(format!(
                "Language model refused the request: {}",
                refusal
            )));
        }

        let content = message
            .content
            .ok_or_else(|| AppError::Upstream("No content in language model response".to_string()))?;

        parse_quiz(&content)
    }
}

/// Builds the user prompt for a transcript.
pub fn build_prompt(transcript: &str, question_count: usize, answer_count: usize) -> String {
    format!(
        "Generate a quiz with {question_count} multiple-choice questions based on the following video transcript.\n\
         Each question should have {answer_count} possible answers, with exactly one correct answer. \
         Make sure the questions are all related to the video.\n\
         Do not make references to the transcript, just make up questions based on the video.\n\n\
         Transcript:\n{transcript}\n\n\
         Provide the output in the following JSON format:\n\
         {{\"questions\": [{{\"question\": \"Question text here?\", \"answers\": [\
         {{\"text\": \"Answer 1\", \"correct\": false}}, {{\"text\": \"Answer 2\", \"correct\": true}}]}}]}}"
    )
}

/// JSON schema the completion must follow.
pub fn quiz_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "questions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "question": { "type": "string" },
                        "answers": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "text": { "type": "string" },
                                    "correct": { "type": "boolean" }
                                },
                                "required": ["text", "correct"],
                                "additionalProperties": false
                            }
                        }
                    },
                    "required": ["question", "answers"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["questions"],
        "additionalProperties": false
    })
}

/// Parses the model's JSON output, strips markup from every text and
/// validates what is left.
pub fn parse_quiz(content: &str) -> Result<GeneratedQuiz, AppError> {
    let mut quiz: GeneratedQuiz = serde_json::from_str(content).map_err(|e| {
        tracing::error!("Language model output is not a quiz: {}", e);
        AppError::Upstream("Language model returned malformed quiz data".to_string())
    })?;

    for question in &mut quiz.questions {
        question.question = clean_text(&question.question);
        for answer in &mut question.answers {
            answer.text = clean_text(&answer.text);
        }
    }

    quiz.validate().map_err(|e| {
        tracing::error!("Language model output failed validation: {}", e);
        AppError::Upstream("Language model returned an invalid quiz".to_string())
    })?;

    Ok(quiz)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_counts_and_transcript() {
        let prompt = build_prompt("ownership moves values", 5, 3);
        assert!(prompt.contains("5 multiple-choice questions"));
        assert!(prompt.contains("3 possible answers"));
        assert!(prompt.contains("Transcript:\nownership moves values"));
        assert!(prompt.contains(r#"{"questions": [{"question""#));
    }

    #[test]
    fn schema_is_strict() {
        let schema = quiz_schema();
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(schema["required"], json!(["questions"]));
        let answer = &schema["properties"]["questions"]["items"]["properties"]["answers"]["items"];
        assert_eq!(answer["required"], json!(["text", "correct"]));
    }

    #[test]
    fn parses_well_formed_output() {
        let content = r#"{"questions": [
            {"question": "What does `cargo` manage?", "answers": [
                {"text": "Packages", "correct": true},
                {"text": "Threads", "correct": false}
            ]}
        ]}"#;
        let quiz = parse_quiz(content).unwrap();
        assert_eq!(quiz.questions.len(), 1);
        assert_eq!(quiz.questions[0].answers.len(), 2);
    }

    #[test]
    fn rejects_malformed_and_invalid_output() {
        assert!(matches!(parse_quiz("not json"), Err(AppError::Upstream(_))));
        assert!(matches!(parse_quiz(r#"{"items": []}"#), Err(AppError::Upstream(_))));

        let two_correct = r#"{"questions": [{"question": "?", "answers": [
            {"text": "a", "correct": true}, {"text": "b", "correct": true}]}]}"#;
        assert!(matches!(parse_quiz(two_correct), Err(AppError::Upstream(_))));
    }

    #[test]
    fn markup_is_stripped_before_validation() {
        let content = r#"{"questions": [{"question": "<b>R&D</b> at <i>Mozilla</i>?", "answers": [
            {"text": "Is 3 < 5?", "correct": true}, {"text": "<script>x()</script>No", "correct": false}]}]}"#;
        let quiz = parse_quiz(content).unwrap();
        assert_eq!(quiz.questions[0].question, "R&D at Mozilla?");
        assert_eq!(quiz.questions[0].answers[0].text, "Is 3 < 5?");
        assert_eq!(quiz.questions[0].answers[1].text, "No");
    }

    #[test]
    fn text_that_is_only_markup_is_rejected() {
        let blank_question = r#"{"questions": [{"question": "<b></b>", "answers": [
            {"text": "a", "correct": true}, {"text": "b", "correct": false}]}]}"#;
        assert!(matches!(parse_quiz(blank_question), Err(AppError::Upstream(_))));

        let blank_answer = r#"{"questions": [{"question": "Pick one", "answers": [
            {"text": "<img src=x onerror=alert(1)>", "correct": true}, {"text": "b", "correct": false}]}]}"#;
        assert!(matches!(parse_quiz(blank_answer), Err(AppError::Upstream(_))));
    }

    #[test]
    fn request_body_uses_configured_model() {
        let generator = OpenAiGenerator {
            api_key: "key".into(),
            base_url: "http://localhost".into(),
            model: "gpt-4o-mini".into(),
            question_count: 10,
            answer_count: 4,
            http: reqwest::Client::new(),
        };
        let body = generator.request_body("hello");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["response_format"]["json_schema"]["name"], "quiz");
    }
}
