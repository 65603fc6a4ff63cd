// src/scoring.rs

use std::collections::HashMap;

use serde::Serialize;

use crate::models::quiz::Question;

/// Outcome of one question in a graded attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionResult {
    pub question_id: i64,
    pub selected_answer_id: Option<i64>,
    pub correct_answer_id: Option<i64>,
    pub is_correct: bool,
}

/// Score of a full pass through a quiz.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grade {
    pub score: i32,
    pub total: i32,
    pub percentage: f64,
    pub results: Vec<QuestionResult>,
}

impl Grade {
    pub fn is_perfect(&self) -> bool {
        self.total > 0 && self.score == self.total
    }
}

/// Grades `selections` (question id -> answer id) against the correct flags.
///
/// Unanswered questions count as wrong. Selections for questions outside the
/// quiz are ignored. An empty quiz scores 0%.
pub fn grade(questions: &[Question], selections: &HashMap<i64, i64>) -> Grade {
    let results: Vec<QuestionResult> = questions
        .iter()
        .map(|question| {
            let selected = selections.get(&question.id).copied();
            let correct = question.correct_answer().map(|a| a.id);
            QuestionResult {
                question_id: question.id,
                selected_answer_id: selected,
                correct_answer_id: correct,
                is_correct: selected.is_some() && selected == correct,
            }
        })
        .collect();

    let score = results.iter().filter(|r| r.is_correct).count() as i32;
    let total = questions.len() as i32;
    let percentage = if total == 0 {
        0.0
    } else {
        score as f64 / total as f64 * 100.0
    };

    Grade {
        score,
        total,
        percentage,
        results,
    }
}
