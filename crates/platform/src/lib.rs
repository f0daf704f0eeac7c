//! Mir platform input layer
//!
//! Translates native input-stack events (touch, key, hardware switch) into
//! toolkit input events, and reconciles compositor-driven surface resizes
//! with the buffers the render thread actually swaps.
//!
//! Native events arrive on a platform thread and are posted through
//! [`queue::EventPoster`] onto the main loop, where
//! [`dispatch::InputDispatcher`] fans them out to the motion and key paths.

pub mod config;
pub mod dispatch;
pub mod event;
pub mod filter;
pub mod key;
pub mod keys;
pub mod modifiers;
pub mod motion;
pub mod queue;
pub mod resize;
pub mod script;
pub mod toolkit;
pub mod touch;
pub mod window;

pub use dispatch::InputDispatcher;
pub use event::NativeEvent;
pub use toolkit::{Toolkit, WindowId};
pub use window::PlatformWindow;
