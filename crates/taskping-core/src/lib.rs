//! # TaskPing Core
//! Shared types, configuration, errors, and collaborator traits.
//!
//! The engine crates depend on this and nothing else internal — the read
//! model and the delivery channel plug in behind the traits defined here.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::TaskPingConfig;
pub use error::{Result, TaskPingError};
pub use traits::{DeliveryAdapter, TaskReadModel};
pub use types::{
    NotificationKind, NotificationRecord, Priority, ProjectSummary, Task, TaskStatus, User,
};
