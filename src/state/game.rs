use super::AppState;
use crate::error::{GameError, GameResult};
use crate::factory;
use crate::session::{GameSession, Outcome};
use crate::types::*;

/// Result of a move together with the game as it stands afterwards
#[derive(Debug, Clone)]
pub struct GameUpdate {
    pub outcome: Outcome,
    pub game: GameSession,
}

#[derive(Debug, Clone)]
pub struct HelpUpdate {
    pub result: HelpResult,
    pub game: GameSession,
}

impl AppState {
    /// Start a new game for a user. Refused while another one is running.
    pub async fn create_game_for_user(&self, user_id: &UserId) -> GameResult<GameSession> {
        self.require_user(user_id).await?;
        if let Some(running) = self.running_game_id(user_id).await {
            return Err(GameError::GameInProgress(running));
        }

        let candidates =
            factory::draw_candidates(self.bank.as_ref(), self.rules.max_level()).await?;
        let session = {
            let mut rng = rand::rng();
            factory::assemble(
                user_id.clone(),
                candidates,
                self.rules.clone(),
                &mut rng,
                chrono::Utc::now(),
            )?
        };

        let mut games = self.games.write().await;
        // another request may have started one while we were drawing
        if let Some(running) = games
            .values()
            .find(|g| g.user_id() == user_id && !g.is_finished())
        {
            return Err(GameError::GameInProgress(running.id().clone()));
        }
        games.insert(session.id().clone(), session.clone());

        Ok(session)
    }

    pub async fn get_game(&self, game_id: &GameId) -> Option<GameSession> {
        self.games.read().await.get(game_id).cloned()
    }

    /// Id of the user's unfinished game, if any
    pub async fn running_game_id(&self, user_id: &UserId) -> Option<GameId> {
        self.games
            .read()
            .await
            .values()
            .find(|g| g.user_id() == user_id && !g.is_finished())
            .map(|g| g.id().clone())
    }

    /// A user's games, newest first
    pub async fn games_for_user(&self, user_id: &UserId) -> Vec<GameSummary> {
        let games = self.games.read().await;
        let mut summaries: Vec<GameSummary> = games
            .values()
            .filter(|g| g.user_id() == user_id)
            .map(GameSession::summary)
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        summaries
    }

    /// Answer the current question of a game
    pub async fn answer(&self, game_id: &GameId, key: AnswerKey) -> GameResult<GameUpdate> {
        self.apply(game_id, |game| game.submit_answer(key, chrono::Utc::now()))
            .await
    }

    /// Take the money and end the game
    pub async fn take_money(&self, game_id: &GameId) -> GameResult<GameUpdate> {
        self.apply(game_id, |game| game.cash_out(chrono::Utc::now()))
            .await
    }

    pub async fn use_help(&self, game_id: &GameId, kind: HelpKind) -> GameResult<HelpUpdate> {
        let mut games = self.games.write().await;
        let game = games
            .get_mut(game_id)
            .ok_or_else(|| GameError::GameNotFound(game_id.clone()))?;

        let result = {
            let mut rng = rand::rng();
            game.use_help(kind, &mut rng, &self.phrasebook)?
        };

        Ok(HelpUpdate {
            result,
            game: game.clone(),
        })
    }

    /// Run one state-machine step and credit its payout under the same lock
    async fn apply<F>(&self, game_id: &GameId, step: F) -> GameResult<GameUpdate>
    where
        F: FnOnce(&mut GameSession) -> GameResult<Outcome>,
    {
        let mut games = self.games.write().await;
        let game = games
            .get_mut(game_id)
            .ok_or_else(|| GameError::GameNotFound(game_id.clone()))?;

        let outcome = step(game)?;
        if let Some(payout) = outcome.payout {
            self.credit_user(game.user_id(), payout).await;
        }

        Ok(GameUpdate {
            outcome,
            game: game.clone(),
        })
    }
}
