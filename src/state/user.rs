use super::AppState;
use crate::error::{GameError, GameResult};
use crate::types::*;

const MAX_NAME_CHARS: usize = 40;

/// Random friendly name like "clever-otter"
fn generate_display_name() -> String {
    petname::petname(2, "-").unwrap_or_else(|| "player".to_string())
}

impl AppState {
    /// Register a user. A blank or missing name gets a generated one.
    pub async fn register_user(&self, name: Option<String>) -> User {
        let name = name
            .map(|n| n.trim().chars().take(MAX_NAME_CHARS).collect::<String>())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(generate_display_name);

        let user = User {
            id: ulid::Ulid::new().to_string(),
            name,
            balance: 0,
        };

        self.users
            .write()
            .await
            .insert(user.id.clone(), user.clone());

        tracing::info!("Registered user {} ({})", user.id, user.name);
        user
    }

    pub async fn get_user(&self, user_id: &UserId) -> Option<User> {
        self.users.read().await.get(user_id).cloned()
    }

    pub(crate) async fn require_user(&self, user_id: &UserId) -> GameResult<User> {
        self.get_user(user_id)
            .await
            .ok_or_else(|| GameError::UserNotFound(user_id.clone()))
    }

    /// Add winnings to a user's balance. Callers hold the games lock.
    pub(crate) async fn credit_user(&self, user_id: &UserId, amount: u64) {
        if amount == 0 {
            return;
        }
        let mut users = self.users.write().await;
        match users.get_mut(user_id) {
            Some(user) => {
                user.balance = user.balance.saturating_add(amount);
                tracing::info!(
                    "Credited {} to user {}, balance now {}",
                    amount,
                    user_id,
                    user.balance
                );
            }
            None => tracing::warn!("Cannot credit {} to unknown user {}", amount, user_id),
        }
    }
}
