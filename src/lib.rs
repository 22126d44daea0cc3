// Public API for integration tests and potential library usage

pub mod api;
pub mod bank;
pub mod config;
pub mod error;
pub mod factory;
pub mod game_question;
pub mod help;
pub mod phrasebook;
pub mod prize;
pub mod session;
pub mod state;
pub mod types;
