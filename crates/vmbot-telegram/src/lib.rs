//! Telegram transport for vmbot
//!
//! Long-polls the Bot API for commands and delivers the bot's messages with
//! `sendMessage`. [`TelegramClient`] implements [`vmbot_core::Messenger`].

pub mod api;
pub mod client;
pub mod error;

pub use api::Update;
pub use client::{TelegramClient, UpdatePoller};
pub use error::{Result, TelegramError};
