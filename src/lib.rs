//! Chatery WhatsApp gateway node.
//!
//! - [`dispatch`] / [`node`]: the action node, one REST call per item.
//! - [`filter`] / [`trigger`]: the webhook trigger and its event filter.
//! - [`credentials`]: gateway URL and optional API key.

pub mod client;
pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod filter;
pub mod node;
pub mod params;
pub mod resource;
pub mod trigger;

pub use client::ChateryClient;
pub use credentials::Credentials;
pub use error::{ChateryError, Result};
pub use filter::{should_forward, Decision, FilterOptions, TriggerFilter};
pub use node::{ActionNode, ExecutionItem};
