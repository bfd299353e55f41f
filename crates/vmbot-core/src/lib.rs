//! vmbot core
//!
//! Bridges the sequential chat command dispatcher to long-running cloud
//! operations:
//!
//! - [`router`]: authorization, argument checks and status guards per command
//! - [`tracker`]: one background task per accepted start/stop request
//! - [`notify`]: replies to the requester and the optional broadcast chat
//! - [`classify`]: turns cloud errors into user-facing messages
//!
//! The chat transport sits behind the [`Messenger`] trait and the cloud
//! provider behind [`vmbot_cloud::InstanceClient`].

pub mod classify;
pub mod command;
pub mod error;
pub mod inflight;
pub mod markdown;
pub mod messenger;
pub mod notify;
pub mod router;
pub mod tracker;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use classify::{ErrorKind, classify};
pub use command::{Command, CommandKind, Request};
pub use error::{BotError, Result};
pub use inflight::{InFlight, InFlightGuard};
pub use messenger::{ChatId, Messenger, OutgoingMessage, ParseMode, UserId};
pub use notify::Notifier;
pub use router::Router;
pub use tracker::{TrackJob, TrackerOutcome};
