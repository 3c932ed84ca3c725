//! Dataset preparation and model hand-off for singing-voice cloning.
//!
//! A subject's recording is downloaded, cut into fixed windows, separated
//! into vocals, normalized, and passed to an external voice-conversion
//! toolchain. Inference runs feed uploaded clips through the newest
//! checkpoint and archive the results.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod pipeline;
pub mod preprocessing;
pub mod web;
