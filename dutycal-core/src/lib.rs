//! Core library for dutycal.
//!
//! Rotation, history and calendar projection for a weekly two-person triage
//! duty, independent of the CLI and of any network transport.
//!
//! # Usage
//!
//! ```no_run
//! use chrono::{Local, Utc};
//! use dutycal_core::feed::{rebuild_feed, FeedSettings};
//! use dutycal_core::models::{Components, Roster};
//! use dutycal_core::{rotation, DutyStore};
//!
//! let store = DutyStore::open("./state");
//! let roster = Roster::from_names(["alice", "bob", "carol"]);
//! let components = Components::from_names(["DOM", "CSS", "Audio"]);
//!
//! let mut history = store.load_history()?;
//! let next = rotation::next_cycle(
//!     &history,
//!     &roster,
//!     &components,
//!     Local::now().date_naive(),
//!     &mut rand::thread_rng(),
//! )?;
//! history.insert(next.cycle.clone());
//! store.commit_cycle(&history, &next.cycle, &roster, &components)?;
//! rebuild_feed(&store, &history, &components, &FeedSettings::default(), Utc::now())?;
//! # Ok::<(), dutycal_core::DutyError>(())
//! ```

pub mod error;
pub mod feed;
pub mod models;
pub mod prune;
pub mod rotation;
pub mod sampler;
pub mod store;

// Re-export commonly used types at crate root
pub use error::{DutyError, DutyResult, Inconsistency};
pub use store::DutyStore;
