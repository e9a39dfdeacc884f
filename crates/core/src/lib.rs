//! Core domain for CritBot: phrase resolution, the d20 roll generator, and
//! layered application configuration.
//!
//! Everything here is transport-agnostic. The Telegram interface crate builds
//! on these types; nothing in this crate performs network I/O.

pub mod config;
pub mod phrases;
pub mod roll;

pub use phrases::{default_phrase, PhraseLoadError, PhraseOverrides, PhraseResolver};
pub use roll::{roll_d20, roll_d20_with, DIE_SIDES};
