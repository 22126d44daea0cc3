pub mod export;
mod game;
mod user;

pub use game::{GameUpdate, HelpUpdate};

use crate::bank::{generated_questions, InMemoryQuestionBank, QuestionBank};
use crate::phrasebook::Phrasebook;
use crate::session::{GameRules, GameSession};
use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Placeholder questions per level when no question file is configured
const GENERATED_PER_LEVEL: usize = 4;

/// Shared application state
///
/// Lock order is `games` before `users`. Payouts are credited while the
/// games lock is still held, so a session can only pay out once.
#[derive(Clone)]
pub struct AppState {
    pub rules: Arc<GameRules>,
    pub phrasebook: Arc<Phrasebook>,
    pub bank: Arc<dyn QuestionBank>,
    pub users: Arc<RwLock<HashMap<UserId, User>>>,
    pub games: Arc<RwLock<HashMap<GameId, GameSession>>>,
}

impl AppState {
    pub fn new(rules: GameRules, bank: Arc<dyn QuestionBank>, phrasebook: Phrasebook) -> Self {
        Self {
            rules: Arc::new(rules),
            phrasebook: Arc::new(phrasebook),
            bank,
            users: Arc::new(RwLock::new(HashMap::new())),
            games: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// State backed by generated placeholder questions
    pub fn with_generated_questions(rules: GameRules, phrasebook: Phrasebook) -> Self {
        let questions = generated_questions(rules.max_level(), GENERATED_PER_LEVEL);
        let bank = InMemoryQuestionBank::new(questions).unwrap_or_else(|e| {
            tracing::error!("Generated questions were rejected: {}", e);
            InMemoryQuestionBank::default()
        });
        Self::new(rules, Arc::new(bank), phrasebook)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_generated_questions(GameRules::default(), Phrasebook::default())
    }
}
