use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque ID types for type safety
pub type GameId = String;
pub type UserId = String;
pub type QuestionId = String;

/// Answer letter a player picks. Always four of them per question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerKey {
    A,
    B,
    C,
    D,
}

impl AnswerKey {
    pub const ALL: [AnswerKey; 4] = [AnswerKey::A, AnswerKey::B, AnswerKey::C, AnswerKey::D];

    /// Position of the key in `ALL` (a = 0 .. d = 3)
    pub fn index(self) -> usize {
        match self {
            AnswerKey::A => 0,
            AnswerKey::B => 1,
            AnswerKey::C => 2,
            AnswerKey::D => 3,
        }
    }

    /// Parse a single letter, case-insensitive
    pub fn parse(letter: &str) -> Option<Self> {
        match letter.trim().to_ascii_lowercase().as_str() {
            "a" => Some(AnswerKey::A),
            "b" => Some(AnswerKey::B),
            "c" => Some(AnswerKey::C),
            "d" => Some(AnswerKey::D),
            _ => None,
        }
    }

    pub fn upper(self) -> &'static str {
        match self {
            AnswerKey::A => "A",
            AnswerKey::B => "B",
            AnswerKey::C => "C",
            AnswerKey::D => "D",
        }
    }
}

impl fmt::Display for AnswerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            AnswerKey::A => "a",
            AnswerKey::B => "b",
            AnswerKey::C => "c",
            AnswerKey::D => "d",
        };
        f.write_str(letter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HelpKind {
    AudienceHelp,
    FriendCall,
    FiftyFifty,
}

impl fmt::Display for HelpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HelpKind::AudienceHelp => "audience_help",
            HelpKind::FriendCall => "friend_call",
            HelpKind::FiftyFifty => "fifty_fifty",
        };
        f.write_str(name)
    }
}

/// Stored outcome of a help request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HelpResult {
    /// Percentage of the audience voting for each key
    Audience(BTreeMap<AnswerKey, u32>),
    /// What the friend said on the phone
    FriendCall(String),
    /// The two keys left standing
    FiftyFifty(Vec<AnswerKey>),
}

/// Derived game status, never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    InProgress,
    Won,
    Fail,
    Timeout,
    /// Player took the money and left
    Money,
}

/// A question from the bank. Options are stored with the correct one at
/// `correct_index`; display order is decided per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: QuestionId,
    pub level: usize,
    pub text: String,
    pub answers: [String; 4],
    pub correct_index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub balance: u64,
}

/// One row in a user's game history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSummary {
    pub id: GameId,
    pub status: GameStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub current_level: usize,
    pub prize: u64,
    pub used_help: Vec<HelpKind>,
}
