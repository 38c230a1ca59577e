//! journey-core library.
//!
//! The progress and gating engine behind a chaptered narrative experience:
//! a single persisted [`state::JourneyState`] owned by a
//! [`store::ProgressStore`], plus the route guard, the dormant calendar
//! time-lock, and the independent questionnaire blob.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums at module boundaries, `anyhow::Result` for
//!   config loading.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod gating;
pub mod lock;
pub mod model;
pub mod questionnaire;
pub mod state;
pub mod storage;
pub mod store;
pub mod timelock;

pub use model::chapter::{CHAPTER_COUNT, ChapterState, JourneyPhase};
pub use model::choice::FinalChoice;
pub use state::JourneyState;
pub use store::{Change, ProgressStore};
