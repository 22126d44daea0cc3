//! State export/import.
//!
//! Sessions are written in their persisted shape: ladder slots, pointer,
//! flags, timestamps, prize, help usage and per-level help results. Game
//! rules and the question bank are not part of the snapshot.

use super::AppState;
use crate::game_question::LeveledQuestion;
use crate::session::{GameRules, GameSession};
use crate::types::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Schema version for export format compatibility
pub const EXPORT_SCHEMA_VERSION: u32 = 1;

/// One question slot of a stored session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderSlot {
    pub question: QuestionRecord,
    /// Option index shown under a, b, c, d
    pub order: [usize; 4],
}

/// Persisted form of a [`GameSession`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: GameId,
    pub user_id: UserId,
    pub ladder: Vec<LadderSlot>,
    pub current_level: usize,
    pub is_failed: bool,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub prize: u64,
    pub help_usage: BTreeSet<HelpKind>,
    /// Only levels that have any help stored appear here
    #[serde(default)]
    pub per_level_help_state: BTreeMap<usize, BTreeMap<HelpKind, HelpResult>>,
}

impl SessionRecord {
    pub fn from_session(game: &GameSession) -> Self {
        let ladder = game
            .game_questions()
            .iter()
            .map(|q| LadderSlot {
                question: q.question().clone(),
                order: q.order(),
            })
            .collect();

        let per_level_help_state = game
            .game_questions()
            .iter()
            .enumerate()
            .filter(|(_, q)| !q.help().is_empty())
            .map(|(level, q)| (level, q.help().clone()))
            .collect();

        Self {
            id: game.id().clone(),
            user_id: game.user_id().clone(),
            ladder,
            current_level: game.current_level(),
            is_failed: game.is_failed(),
            created_at: game.created_at(),
            finished_at: game.finished_at(),
            prize: game.prize(),
            help_usage: game.used_help().clone(),
            per_level_help_state,
        }
    }

    pub fn into_session(self, rules: Arc<GameRules>) -> Result<GameSession, String> {
        let mut help_state = self.per_level_help_state;
        if let Some(level) = help_state.keys().find(|l| **l >= self.ladder.len()) {
            return Err(format!(
                "Game {} has help stored for missing level {}",
                self.id, level
            ));
        }
        // help only ever lands on the question being played
        if let Some(level) = help_state.keys().find(|l| **l > self.current_level) {
            return Err(format!(
                "Game {} has help stored for level {} beyond its current level {}",
                self.id, level, self.current_level
            ));
        }

        let mut stored_kinds = BTreeSet::new();
        let mut questions = Vec::with_capacity(self.ladder.len());
        for (level, slot) in self.ladder.into_iter().enumerate() {
            let help = help_state.remove(&level).unwrap_or_default();
            for kind in help.keys() {
                if !stored_kinds.insert(*kind) {
                    return Err(format!("Game {} used {} more than once", self.id, kind));
                }
            }
            let question = LeveledQuestion::new(slot.question, slot.order)
                .map_err(|e| format!("Game {}: {}", self.id, e))?
                .with_help(help);
            questions.push(question);
        }
        if !stored_kinds.is_subset(&self.help_usage) {
            return Err(format!(
                "Game {} has help results not listed in its help usage",
                self.id
            ));
        }

        GameSession::restore(
            self.id,
            self.user_id,
            questions,
            self.current_level,
            self.is_failed,
            self.created_at,
            self.finished_at,
            self.prize,
            self.help_usage,
            rules,
        )
    }
}

/// A serializable snapshot of users and games
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStateExport {
    /// Schema version for forward compatibility
    pub schema_version: u32,
    /// Export timestamp (ISO8601)
    pub exported_at: String,
    pub users: HashMap<UserId, User>,
    pub games: Vec<SessionRecord>,
}

impl GameStateExport {
    pub fn new(users: HashMap<UserId, User>, games: Vec<SessionRecord>) -> Self {
        Self {
            schema_version: EXPORT_SCHEMA_VERSION,
            exported_at: Utc::now().to_rfc3339(),
            users,
            games,
        }
    }

    /// Validate the export before import
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version > EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Export schema version {} is newer than supported version {}. \
                 Please update the server.",
                self.schema_version, EXPORT_SCHEMA_VERSION
            ));
        }

        for (id, user) in &self.users {
            if id != &user.id {
                return Err(format!("User keyed as '{}' has id '{}'", id, user.id));
            }
        }

        let mut running = BTreeSet::new();
        let mut ids = BTreeSet::new();
        for game in &self.games {
            if !ids.insert(&game.id) {
                return Err(format!("Game id '{}' appears more than once", game.id));
            }
            if !self.users.contains_key(&game.user_id) {
                return Err(format!(
                    "Game '{}' references user '{}' but user not found in export",
                    game.id, game.user_id
                ));
            }
            if game.finished_at.is_none() && !running.insert(&game.user_id) {
                return Err(format!(
                    "User '{}' has more than one game in progress",
                    game.user_id
                ));
            }
        }

        Ok(())
    }
}

impl AppState {
    pub async fn export_state(&self) -> GameStateExport {
        // games before users, same order as move handling
        let games = self.games.read().await;
        let users = self.users.read().await;

        let mut records: Vec<SessionRecord> =
            games.values().map(SessionRecord::from_session).collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        GameStateExport::new(users.clone(), records)
    }

    /// Replace all users and games with the snapshot. Nothing changes if any
    /// part of it is invalid.
    pub async fn import_state(&self, export: GameStateExport) -> Result<(), String> {
        export.validate()?;

        let mut sessions = HashMap::with_capacity(export.games.len());
        for record in export.games {
            let session = record.into_session(self.rules.clone())?;
            sessions.insert(session.id().clone(), session);
        }

        let mut games = self.games.write().await;
        let mut users = self.users.write().await;
        *games = sessions;
        *users = export.users;

        tracing::info!(
            "Imported state: {} users, {} games",
            users.len(),
            games.len()
        );
        Ok(())
    }
}
