//! Domain types for themr
//!
//! This module contains all core domain types:
//! - Run: one invocation of the generation loop, tracked in memory
//! - Theme: the persisted design artifact (a named bundle of style tokens)
//! - Identity: an owner principal that themes are bound to

pub mod identity;
pub mod run;
pub mod theme;

pub use identity::Identity;
pub use run::{Run, RunStatus};
pub use theme::{Styles, Theme};
