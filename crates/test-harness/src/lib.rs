//! Test harness for the platform input layer
//!
//! Drives the dispatch path without a toolkit or compositor.
//!
//! # Modules
//!
//! - `recording`: Toolkit that records every call for assertions
//! - `keyboard`: Scan-code driven keyboard state, no keymap required
//! - `fixtures`: Native event builders and ready-made setups
//! - `assertions`: Common test assertions

pub mod assertions;
pub mod fixtures;
pub mod keyboard;
pub mod recording;

pub use fixtures::Harness;
pub use keyboard::FakeKeyboard;
pub use recording::{RecordingToolkit, ToolkitCall};
