//! Building new sessions from the question bank.
//!
//! Drawing is split from assembling so the async bank lookups finish before
//! any random generator is created.

use chrono::{DateTime, Utc};
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use std::sync::Arc;

use crate::bank::QuestionBank;
use crate::error::{GameError, GameResult};
use crate::game_question::LeveledQuestion;
use crate::session::{GameRules, GameSession};
use crate::types::{QuestionRecord, UserId};

/// Candidate questions for every level `0..=max_level`, in level order
pub async fn draw_candidates(
    bank: &dyn QuestionBank,
    max_level: usize,
) -> GameResult<Vec<Vec<QuestionRecord>>> {
    let mut candidates = Vec::with_capacity(max_level + 1);
    for level in 0..=max_level {
        let questions: Vec<QuestionRecord> = bank
            .questions_at_level(level)
            .await
            .into_iter()
            .filter(|q| q.level == level)
            .collect();
        if questions.is_empty() {
            tracing::warn!("Question bank has nothing for level {}", level);
            return Err(GameError::InsufficientQuestions { level });
        }
        candidates.push(questions);
    }
    Ok(candidates)
}

/// Pick one question per level, shuffle each one's answers and start a session
pub fn assemble<R: Rng + ?Sized>(
    user_id: UserId,
    candidates: Vec<Vec<QuestionRecord>>,
    rules: Arc<GameRules>,
    rng: &mut R,
    now: DateTime<Utc>,
) -> GameResult<GameSession> {
    let mut questions = Vec::with_capacity(candidates.len());
    for (level, pool) in candidates.iter().enumerate() {
        let record = pool
            .choose(rng)
            .cloned()
            .ok_or(GameError::InsufficientQuestions { level })?;

        let mut order = [0, 1, 2, 3];
        order.shuffle(rng);

        // records with a broken correct index count as missing
        let question = LeveledQuestion::new(record, order)
            .map_err(|_| GameError::InsufficientQuestions { level })?;
        questions.push(question);
    }

    let session = GameSession::new(
        ulid::Ulid::new().to_string(),
        user_id,
        questions,
        rules,
        now,
    )?;

    tracing::info!(
        "Created game {} for user {}",
        session.id(),
        session.user_id()
    );
    Ok(session)
}
