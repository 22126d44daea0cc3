//! Question bank
//!
//! The game only needs "give me the questions for level N". Where they live
//! is up to the implementation; the in-memory bank can be filled from a JSON
//! file holding an array of question records.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;

use crate::types::QuestionRecord;

#[derive(Debug, thiserror::Error)]
pub enum BankError {
    #[error("Failed to read question file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse question file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid question {id}: {reason}")]
    Invalid { id: String, reason: String },
}

/// Read-only source of leveled questions
#[async_trait]
pub trait QuestionBank: Send + Sync {
    async fn questions_at_level(&self, level: usize) -> Vec<QuestionRecord>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryQuestionBank {
    by_level: BTreeMap<usize, Vec<QuestionRecord>>,
}

impl InMemoryQuestionBank {
    pub fn new(questions: impl IntoIterator<Item = QuestionRecord>) -> Result<Self, BankError> {
        let mut bank = Self::default();
        for question in questions {
            bank.add(question)?;
        }
        Ok(bank)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, BankError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let questions: Vec<QuestionRecord> = serde_json::from_str(&raw)?;
        let bank = Self::new(questions)?;
        tracing::info!(
            "Loaded {} questions from {}",
            bank.len(),
            path.as_ref().display()
        );
        Ok(bank)
    }

    pub fn add(&mut self, question: QuestionRecord) -> Result<(), BankError> {
        if question.correct_index >= question.answers.len() {
            return Err(BankError::Invalid {
                id: question.id,
                reason: format!("correct index {} out of range", question.correct_index),
            });
        }
        if question.text.trim().is_empty() {
            return Err(BankError::Invalid {
                id: question.id,
                reason: "empty question text".to_string(),
            });
        }
        self.by_level
            .entry(question.level)
            .or_default()
            .push(question);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.by_level.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl QuestionBank for InMemoryQuestionBank {
    async fn questions_at_level(&self, level: usize) -> Vec<QuestionRecord> {
        self.by_level.get(&level).cloned().unwrap_or_default()
    }
}

/// Placeholder questions, `per_level` for every level in `0..=max_level`.
/// Used when no question file is configured.
pub fn generated_questions(max_level: usize, per_level: usize) -> Vec<QuestionRecord> {
    (0..=max_level)
        .flat_map(|level| {
            (0..per_level).map(move |n| {
                let a = level * 10 + n;
                let b = n + 1;
                QuestionRecord {
                    id: format!("generated-{}-{}", level, n),
                    level,
                    text: format!("What is {} + {}?", a, b),
                    answers: [
                        (a + b).to_string(),
                        (a + b + 1).to_string(),
                        (a + b + 2).to_string(),
                        (a + b).saturating_sub(1).to_string(),
                    ],
                    correct_index: 0,
                }
            })
        })
        .collect()
}
