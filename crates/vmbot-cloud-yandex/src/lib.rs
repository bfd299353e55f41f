//! Yandex Cloud provider for vmbot
//!
//! This crate implements the [`InstanceClient`](vmbot_cloud::InstanceClient)
//! trait on top of the Yandex Cloud Compute REST API.
//!
//! # Features
//!
//! - Instance lookup (status and external address)
//! - Instance start / stop
//! - Operation polling until the provider reports completion
//!
//! # Authentication
//!
//! Requests are authorized with an IAM token. The token is either supplied
//! directly or exchanged from a service-account authorized key (the JSON file
//! produced by `yc iam key create`), in which case it is cached and refreshed
//! automatically.
//!
//! # Example
//!
//! ```ignore
//! use vmbot_cloud::InstanceClient;
//! use vmbot_cloud_yandex::{Credentials, ServiceAccountKey, YandexCompute};
//!
//! let key = ServiceAccountKey::from_value(raw_key)?;
//! let compute = YandexCompute::new(Credentials::ServiceAccount(key));
//!
//! let instance = compute.get_instance("fhm0123456789abcdef").await?;
//! println!("{}", instance.status);
//! ```

pub mod api;
pub mod auth;
pub mod client;
pub mod error;

pub use auth::{Credentials, ServiceAccountKey};
pub use client::{Endpoints, YandexCompute};
pub use error::{Result, YandexError};
