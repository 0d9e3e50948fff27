//! `formadmin-client`
//!
//! **Responsibility:** client-side core of the training-management console.
//!
//! This crate provides:
//! - The session owner (principal + tokens, persisted in durable storage)
//! - The REST transport with the bearer-header contract
//! - A resilient data layer that serves a local mock store when the backend
//!   is unreachable (transport failures only; rejections propagate)
//! - Domain services (auth, users, teams, formations, participants,
//!   attendance, statistics)

pub mod client;
pub mod config;
pub mod error;
pub mod offline;
pub mod record;
pub mod remote;
pub mod repository;
pub mod services;
pub mod session;
pub mod storage;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::FormadminClient;
pub use config::ClientConfig;
pub use error::{RemoteError, ShimError};
pub use offline::{ConnectivityState, OfflineMode};
pub use record::Record;
pub use remote::{ApiRequest, HttpRemote, Method, Remote};
pub use repository::ResilientRepository;
pub use session::Session;
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
pub use store::{LocalStore, MockDb};
