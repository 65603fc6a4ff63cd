// src/session.rs

//! In-memory state of someone taking a quiz: which question is shown, what
//! has been picked so far, and the grade once submitted. Nothing here is
//! persisted; only the final selection map is sent to the server.

use std::collections::HashMap;

use crate::{
    models::quiz::Question,
    scoring::{Grade, grade},
};

#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<Question>,
    current: usize,
    selections: HashMap<i64, i64>,
    grade: Option<Grade>,
}

impl QuizSession {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            current: 0,
            selections: HashMap::new(),
            grade: None,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    pub fn is_last(&self) -> bool {
        !self.questions.is_empty() && self.current == self.questions.len() - 1
    }

    pub fn is_submitted(&self) -> bool {
        self.grade.is_some()
    }

    /// Answer picked for the current question, if any.
    pub fn current_selection(&self) -> Option<i64> {
        let question = self.current_question()?;
        self.selections.get(&question.id).copied()
    }

    pub fn selections(&self) -> &HashMap<i64, i64> {
        &self.selections
    }

    /// `(index + 1) / N * 100`; 0 for an empty quiz.
    pub fn progress_percent(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        (self.current + 1) as f64 / self.questions.len() as f64 * 100.0
    }

    /// Picks an answer of the current question, replacing any earlier pick.
    /// Returns false for unknown answer ids or after submission.
    pub fn select(&mut self, answer_id: i64) -> bool {
        if self.is_submitted() {
            return false;
        }
        let Some(question) = self.questions.get(self.current) else {
            return false;
        };
        if !question.answers.iter().any(|a| a.id == answer_id) {
            return false;
        }
        self.selections.insert(question.id, answer_id);
        true
    }

    /// Moves forward once the current question is answered.
    pub fn next(&mut self) -> bool {
        if self.is_last() || self.current_selection().is_none() {
            return false;
        }
        self.current += 1;
        true
    }

    pub fn previous(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Grades the session. Only allowed once, from the last question, with it answered.
    pub fn submit(&mut self) -> Option<&Grade> {
        if self.is_submitted() || !self.is_last() || self.current_selection().is_none() {
            return None;
        }
        self.grade = Some(grade(&self.questions, &self.selections));
        self.grade.as_ref()
    }

    pub fn grade(&self) -> Option<&Grade> {
        self.grade.as_ref()
    }
}
