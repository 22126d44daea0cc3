//! Display text for help results.
//!
//! Friend personas and the friend-call sentence come from here so they can be
//! swapped without touching the game rules.

use crate::types::AnswerKey;

const DEFAULT_FRIENDS: &[&str] = &[
    "Aunt Valentina",
    "Uncle Boris",
    "Your old schoolteacher",
    "A neighbour who reads a lot",
    "Grandpa",
];

const DEFAULT_FRIEND_CALL: &str = "{name} thinks the answer is {variant}";

#[derive(Debug, Clone)]
pub struct Phrasebook {
    friends: Vec<String>,
    /// Template with `{name}` and `{variant}` placeholders
    friend_call: String,
}

impl Default for Phrasebook {
    fn default() -> Self {
        Self {
            friends: DEFAULT_FRIENDS.iter().map(|s| s.to_string()).collect(),
            friend_call: DEFAULT_FRIEND_CALL.to_string(),
        }
    }
}

impl Phrasebook {
    /// Empty `friends` falls back to the default personas
    pub fn new(friends: Vec<String>, friend_call: impl Into<String>) -> Self {
        let friends = if friends.is_empty() {
            Self::default().friends
        } else {
            friends
        };
        Self {
            friends,
            friend_call: friend_call.into(),
        }
    }

    /// Load persona names from `FRIEND_NAMES` (comma separated) and the
    /// template from `FRIEND_CALL_TEMPLATE`
    pub fn from_env() -> Self {
        let friends = std::env::var("FRIEND_NAMES")
            .ok()
            .map(|names| {
                names
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let template = std::env::var("FRIEND_CALL_TEMPLATE")
            .ok()
            .and_then(|t| {
                let trimmed = t.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| DEFAULT_FRIEND_CALL.to_string());

        Self::new(friends, template)
    }

    pub fn friends(&self) -> &[String] {
        &self.friends
    }

    pub fn friend_call(&self, name: &str, variant: AnswerKey) -> String {
        self.friend_call
            .replace("{name}", name)
            .replace("{variant}", variant.upper())
    }
}
