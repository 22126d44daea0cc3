use std::collections::BTreeMap;

use crate::types::{AnswerKey, HelpKind, HelpResult, QuestionRecord};

/// A question placed on one level of one game.
///
/// `order[key.index()]` is the index into `question.answers` shown under
/// `key`, so every game can shuffle the same record differently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeveledQuestion {
    question: QuestionRecord,
    order: [usize; 4],
    help: BTreeMap<HelpKind, HelpResult>,
}

impl LeveledQuestion {
    /// `order` must be a permutation of 0..4
    pub fn new(question: QuestionRecord, order: [usize; 4]) -> Result<Self, String> {
        let mut seen = [false; 4];
        for index in order {
            if index >= 4 || seen[index] {
                return Err(format!("Answer order {:?} is not a permutation", order));
            }
            seen[index] = true;
        }
        if question.correct_index >= 4 {
            return Err(format!(
                "Question {} has correct index {} out of range",
                question.id, question.correct_index
            ));
        }
        Ok(Self {
            question,
            order,
            help: BTreeMap::new(),
        })
    }

    /// Attach help results loaded from a snapshot
    pub(crate) fn with_help(mut self, help: BTreeMap<HelpKind, HelpResult>) -> Self {
        self.help = help;
        self
    }

    pub fn question(&self) -> &QuestionRecord {
        &self.question
    }

    pub fn text(&self) -> &str {
        &self.question.text
    }

    pub fn level(&self) -> usize {
        self.question.level
    }

    pub fn order(&self) -> [usize; 4] {
        self.order
    }

    /// Option text shown under each key
    pub fn variants(&self) -> BTreeMap<AnswerKey, &str> {
        AnswerKey::ALL
            .iter()
            .map(|key| (*key, self.question.answers[self.order[key.index()]].as_str()))
            .collect()
    }

    pub fn correct_answer_key(&self) -> AnswerKey {
        AnswerKey::ALL
            .iter()
            .copied()
            .find(|key| self.order[key.index()] == self.question.correct_index)
            // order is a permutation and correct_index < 4, checked in new()
            .unwrap_or(AnswerKey::A)
    }

    pub fn answer_correct(&self, key: AnswerKey) -> bool {
        key == self.correct_answer_key()
    }

    pub fn help(&self) -> &BTreeMap<HelpKind, HelpResult> {
        &self.help
    }

    pub fn has_help(&self, kind: HelpKind) -> bool {
        self.help.contains_key(&kind)
    }

    /// Store a help result. Returns false if this kind is already stored,
    /// leaving the earlier result in place.
    pub(crate) fn record_help(&mut self, kind: HelpKind, result: HelpResult) -> bool {
        if self.help.contains_key(&kind) {
            return false;
        }
        self.help.insert(kind, result);
        true
    }
}
