//! Game session state machine
//!
//! A session walks the prize ladder one question at a time. It ends exactly
//! once: a wrong answer, running out of time, taking the money, or clearing
//! the last level. Status is derived from the stored fields, never stored.
//!
//! Every operation takes the current instant as an argument. The time limit
//! is a comparison against `created_at`, not a timer.

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::{GameError, GameResult};
use crate::game_question::LeveledQuestion;
use crate::help;
use crate::phrasebook::Phrasebook;
use crate::prize::PrizeTable;
use crate::types::*;

/// Default time a player has for a whole game
pub const DEFAULT_TIME_LIMIT_MINUTES: i64 = 35;

/// Rules shared by every session: the prize ladder and the time limit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRules {
    pub prizes: PrizeTable,
    pub time_limit: TimeDelta,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            prizes: PrizeTable::default(),
            time_limit: TimeDelta::minutes(DEFAULT_TIME_LIMIT_MINUTES),
        }
    }
}

impl GameRules {
    pub fn max_level(&self) -> usize {
        self.prizes.max_level()
    }

    /// Strictly more than the limit has passed between `from` and `to`
    pub fn exceeded(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        to - from > self.time_limit
    }
}

/// Result of `submit_answer` or `cash_out`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub status: GameStatus,
    /// Prize to credit the owner. Only set on the call that ended the game.
    pub payout: Option<u64>,
}

impl Outcome {
    /// Correct answer (game goes on or is won) or money banked
    pub fn is_success(&self) -> bool {
        matches!(
            self.status,
            GameStatus::InProgress | GameStatus::Won | GameStatus::Money
        )
    }
}

#[derive(Debug, Clone)]
pub struct GameSession {
    id: GameId,
    user_id: UserId,
    questions: Vec<LeveledQuestion>,
    current_level: usize,
    is_failed: bool,
    created_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    prize: u64,
    used_help: BTreeSet<HelpKind>,
    rules: Arc<GameRules>,
}

impl GameSession {
    /// Fresh session at level 0. `questions[i]` must sit on level `i` and
    /// there must be one per level of the ladder.
    pub fn new(
        id: GameId,
        user_id: UserId,
        questions: Vec<LeveledQuestion>,
        rules: Arc<GameRules>,
        now: DateTime<Utc>,
    ) -> GameResult<Self> {
        check_ladder(&questions, rules.max_level())?;
        Ok(Self {
            id,
            user_id,
            questions,
            current_level: 0,
            is_failed: false,
            created_at: now,
            finished_at: None,
            prize: 0,
            used_help: BTreeSet::new(),
            rules,
        })
    }

    pub fn id(&self) -> &GameId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn current_level(&self) -> usize {
        self.current_level
    }

    pub fn is_failed(&self) -> bool {
        self.is_failed
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Prize won so far; 0 until the game is over
    pub fn prize(&self) -> u64 {
        self.prize
    }

    pub fn used_help(&self) -> &BTreeSet<HelpKind> {
        &self.used_help
    }

    pub fn game_questions(&self) -> &[LeveledQuestion] {
        &self.questions
    }

    /// Question the player is on, `None` once the last one is cleared
    pub fn current_game_question(&self) -> Option<&LeveledQuestion> {
        self.questions.get(self.current_level)
    }

    /// Highest cleared level, `None` before the first correct answer
    pub fn previous_level(&self) -> Option<usize> {
        self.current_level.checked_sub(1)
    }

    pub fn status(&self) -> GameStatus {
        let Some(finished_at) = self.finished_at else {
            return GameStatus::InProgress;
        };

        if self.is_failed {
            if self.rules.exceeded(self.created_at, finished_at) {
                GameStatus::Timeout
            } else {
                GameStatus::Fail
            }
        } else if self.current_level > self.rules.max_level() {
            GameStatus::Won
        } else {
            GameStatus::Money
        }
    }

    /// Answer the current question. The time limit is checked first, so a
    /// late answer times out even when it is right.
    pub fn submit_answer(&mut self, key: AnswerKey, now: DateTime<Utc>) -> GameResult<Outcome> {
        self.ensure_active()?;
        if let Some(outcome) = self.time_out(now) {
            return Ok(outcome);
        }

        let correct = self
            .current_game_question()
            .ok_or(GameError::InactiveSession)?
            .answer_correct(key);

        if !correct {
            let floor = self.rules.prizes.fireproof_floor(self.previous_level());
            return Ok(self.finish(floor, true, now));
        }

        self.current_level += 1;
        if self.current_level > self.rules.max_level() {
            let grand = self.rules.prizes.grand_prize();
            return Ok(self.finish(grand, false, now));
        }

        Ok(Outcome {
            status: GameStatus::InProgress,
            payout: None,
        })
    }

    /// Bank the prize of the last cleared level
    pub fn cash_out(&mut self, now: DateTime<Utc>) -> GameResult<Outcome> {
        self.ensure_active()?;
        if let Some(outcome) = self.time_out(now) {
            return Ok(outcome);
        }

        // nothing cleared yet, nothing to bank
        let cleared = self.previous_level().ok_or(GameError::InactiveSession)?;
        let prize = self.rules.prizes.prize_at(cleared);
        Ok(self.finish(prize, false, now))
    }

    /// Use a help option on the current question. Each kind works once per game.
    pub fn use_help<R: Rng + ?Sized>(
        &mut self,
        kind: HelpKind,
        rng: &mut R,
        phrasebook: &Phrasebook,
    ) -> GameResult<HelpResult> {
        self.ensure_active()?;
        if self.used_help.contains(&kind) {
            return Err(GameError::AlreadyUsedHelp(kind));
        }

        let level = self.current_level;
        let question = self
            .questions
            .get_mut(level)
            .ok_or(GameError::InactiveSession)?;
        let correct = question.correct_answer_key();
        let keys = AnswerKey::ALL;

        let result = match kind {
            HelpKind::AudienceHelp => {
                HelpResult::Audience(help::audience_distribution(rng, &keys, correct))
            }
            HelpKind::FriendCall => {
                HelpResult::FriendCall(help::friend_call(rng, phrasebook, &keys, correct))
            }
            HelpKind::FiftyFifty => HelpResult::FiftyFifty(help::fifty_fifty(rng, &keys, correct)),
        };

        if !question.record_help(kind, result.clone()) {
            return Err(GameError::AlreadyUsedHelp(kind));
        }
        self.used_help.insert(kind);

        tracing::info!("Game {} used {} on level {}", self.id, kind, level);
        Ok(result)
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            id: self.id.clone(),
            status: self.status(),
            created_at: self.created_at,
            current_level: self.current_level,
            prize: self.prize,
            used_help: self.used_help.iter().copied().collect(),
        }
    }

    fn ensure_active(&self) -> GameResult<()> {
        if self.is_finished() {
            tracing::warn!("Rejected operation on finished game {}", self.id);
            return Err(GameError::InactiveSession);
        }
        Ok(())
    }

    /// Ends the game as a timeout if the limit has passed
    fn time_out(&mut self, now: DateTime<Utc>) -> Option<Outcome> {
        if !self.rules.exceeded(self.created_at, now) {
            return None;
        }
        let floor = self.rules.prizes.fireproof_floor(self.previous_level());
        Some(self.finish(floor, true, now))
    }

    /// The only place that sets `finished_at`
    fn finish(&mut self, prize: u64, failed: bool, now: DateTime<Utc>) -> Outcome {
        self.finished_at = Some(now);
        self.is_failed = failed;
        self.prize = prize;

        let status = self.status();
        tracing::info!(
            "Game {} finished: status={:?}, level={}, prize={}",
            self.id,
            status,
            self.current_level,
            prize
        );

        Outcome {
            status,
            payout: Some(prize),
        }
    }

    /// Rebuild a session from stored fields. Used by state import.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        id: GameId,
        user_id: UserId,
        questions: Vec<LeveledQuestion>,
        current_level: usize,
        is_failed: bool,
        created_at: DateTime<Utc>,
        finished_at: Option<DateTime<Utc>>,
        prize: u64,
        used_help: BTreeSet<HelpKind>,
        rules: Arc<GameRules>,
    ) -> Result<Self, String> {
        check_ladder(&questions, rules.max_level()).map_err(|e| e.to_string())?;

        if current_level > rules.max_level() + 1 {
            return Err(format!(
                "Game {} is on level {} past the end of the ladder",
                id, current_level
            ));
        }
        if finished_at.is_none() && (is_failed || prize > 0) {
            return Err(format!("Game {} is unfinished but has a result", id));
        }
        if finished_at.is_none() && current_level > rules.max_level() {
            return Err(format!("Game {} cleared every level but is unfinished", id));
        }

        Ok(Self {
            id,
            user_id,
            questions,
            current_level,
            is_failed,
            created_at,
            finished_at,
            prize,
            used_help,
            rules,
        })
    }
}

fn check_ladder(questions: &[LeveledQuestion], max_level: usize) -> GameResult<()> {
    for level in 0..=max_level {
        match questions.get(level) {
            Some(q) if q.level() == level => {}
            _ => return Err(GameError::InsufficientQuestions { level }),
        }
    }
    Ok(())
}
