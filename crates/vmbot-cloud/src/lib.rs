//! vmbot Cloud Abstraction
//!
//! This crate defines the compute-instance model shared by the bot core and
//! the provider implementations, together with the [`InstanceClient`] trait
//! the bot drives.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  vmbot-core                      │
//! │        (router / operation tracker)              │
//! └─────────────────┬───────────────────────────────┘
//!                   │ Arc<dyn InstanceClient>
//! ┌─────────────────▼───────────────────────────────┐
//! │                 vmbot-cloud                      │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  trait InstanceClient { ... }            │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │   Instance   │  │  Operation   │            │
//! │  └──────────────┘  └──────────────┘            │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//!           ┌───────▼───────┐
//!           │ yandex-cloud  │
//!           │   provider    │
//!           └───────────────┘
//! ```

pub mod action;
pub mod error;
pub mod instance;
pub mod operation;
pub mod provider;

// Re-exports
pub use action::PowerAction;
pub use error::{CloudError, Result};
pub use instance::{Instance, NetworkInterface, Status};
pub use operation::{Operation, OperationError};
pub use provider::InstanceClient;
