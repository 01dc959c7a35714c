//! examkit-backends — Collaborator implementations for examkit.
//!
//! Implements the core's `QuestionRepository`, `AssignmentStore`, and
//! `Notifier` traits: an in-memory backend, an HTTP mail-gateway
//! notifier, mocks for testing, and configuration loading.

pub mod config;
pub mod memory;
pub mod mock;
pub mod notifier;

pub use config::{create_notifier, load_config, ExamkitConfig, NotifierConfig};
pub use memory::MemoryBackend;
pub use notifier::HttpNotifier;
