//! Integration test modules for moodtrack
//!
//! - corpus: MIDI directory loading and pitch extraction
//! - pipeline: End-to-end train, generate and write workflows
//! - config: TOML configuration driving a session

pub mod config;
pub mod corpus;
pub mod pipeline;
