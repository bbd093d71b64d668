//! athena-core: quiz model, content normalization, and navigation.
//!
//! This crate holds everything the athena client does that is independent of
//! the transport: turning backend text into renderable HTML, navigating and
//! filtering questions, score bookkeeping, and the dashboard view of quiz sets.
//! The backend itself is reached through the [`traits::QuizBackend`] trait,
//! implemented over HTTP by `athena-client`.

pub mod comments;
pub mod dashboard;
pub mod error;
pub mod images;
pub mod layout;
pub mod lock;
pub mod markdown;
pub mod model;
pub mod navigator;
pub mod normalize;
pub mod notes;
pub mod schedule;
pub mod scrape;
pub mod search;
pub mod session;
pub mod shuffle;
pub mod storage;
pub mod traits;
pub mod urls;
