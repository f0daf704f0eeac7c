//! Native event scripts
//!
//! A script is JSON lines, one step per line, replayed through the same
//! path live events take: posted from the platform side, filtered, queued
//! and dispatched on a calloop loop. Blank lines and lines starting with
//! `#` are skipped.
//!
//! ```text
//! {"step": "filter_key", "key": 65}
//! {"step": "event", "action": 0, "details": {"type": "key", "key_code": 97}}
//! {"step": "compositor_resize", "width": 150, "height": 150}
//! {"step": "buffer_swap", "width": 150, "height": 150}
//! ```

use std::sync::{mpsc, Arc};
use std::time::Duration;

use calloop::EventLoop;
use serde::{Deserialize, Serialize};
use smithay::utils::Size;
use thiserror::Error;

use crate::config::Config;
use crate::dispatch::InputDispatcher;
use crate::event::NativeEvent;
use crate::filter::{KeyObserver, PluggableKeyFilter};
use crate::key::KeyEvent;
use crate::keys::KeyCode;
use crate::modifiers::KeyboardState;
use crate::queue::{event_queue, EventPoster, PostOutcome, QueueError};
use crate::toolkit::Toolkit;
use crate::window::PlatformWindow;

/// Maximum script size (4 MB)
pub const MAX_SCRIPT_SIZE: usize = 4 * 1024 * 1024;

/// Maximum size of one step
pub const MAX_LINE_SIZE: usize = 64 * 1024;

/// Script parse errors
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("script too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("line {line}: step too large: {size} bytes (max {max})")]
    LineTooLong { line: usize, size: usize, max: usize },

    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: {message}")]
    Validation { line: usize, message: String },
}

/// Errors while replaying a script
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("event loop error: {0}")]
    Loop(#[from] calloop::Error),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

fn default_device_pixel_ratio() -> f64 {
    1.0
}

/// One script step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Replace the target window
    Window {
        width: i32,
        height: i32,
        #[serde(default = "default_device_pixel_ratio")]
        device_pixel_ratio: f64,
    },

    /// Deliver a native event
    Event(NativeEvent),

    /// Register a key filter observer for `key`
    FilterKey { key: KeyCode },

    /// Compositor announces a surface size
    CompositorResize { width: i32, height: i32 },

    /// Render thread swapped a buffer
    BufferSwap { width: i32, height: i32 },
}

impl ScriptStep {
    fn validate(&self) -> Result<(), String> {
        match self {
            Self::Window {
                width,
                height,
                device_pixel_ratio,
            } => {
                if *width <= 0 || *height <= 0 {
                    return Err(format!("window size must be positive, got {width}x{height}"));
                }
                if !(device_pixel_ratio.is_finite() && *device_pixel_ratio > 0.0) {
                    return Err(format!(
                        "device_pixel_ratio must be positive, got {device_pixel_ratio}"
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Parse a whole script
pub fn parse_script(input: &str) -> Result<Vec<ScriptStep>, ScriptError> {
    if input.len() > MAX_SCRIPT_SIZE {
        return Err(ScriptError::TooLarge {
            size: input.len(),
            max: MAX_SCRIPT_SIZE,
        });
    }

    let mut steps = Vec::new();
    for (index, raw) in input.lines().enumerate() {
        let line = index + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        if text.len() > MAX_LINE_SIZE {
            return Err(ScriptError::LineTooLong {
                line,
                size: text.len(),
                max: MAX_LINE_SIZE,
            });
        }

        let step: ScriptStep =
            serde_json::from_str(text).map_err(|source| ScriptError::Parse { line, source })?;
        step.validate()
            .map_err(|message| ScriptError::Validation { line, message })?;
        steps.push(step);
    }

    Ok(steps)
}

/// Result of one replayed step
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Set for event steps
    pub post: Option<PostOutcome>,
    /// Key events delivered to script observers during the step
    pub observed: Vec<KeyEvent>,
}

/// Replays steps through the live dispatch path
pub struct ScriptRunner {
    event_loop: EventLoop<'static, InputDispatcher>,
    dispatcher: InputDispatcher,
    poster: EventPoster,
    key_filter: Arc<PluggableKeyFilter>,
    toolkit: Arc<dyn Toolkit>,
    config: Config,
    window: Arc<PlatformWindow>,
    observers: Vec<(KeyObserver, mpsc::Receiver<KeyEvent>)>,
}

impl ScriptRunner {
    /// Set up the loop, dispatcher and a first window of `width`x`height` pixels
    pub fn new(
        toolkit: Arc<dyn Toolkit>,
        keyboard: Box<dyn KeyboardState>,
        config: Config,
        width: i32,
        height: i32,
        device_pixel_ratio: f64,
    ) -> Result<Self, ReplayError> {
        let event_loop = EventLoop::try_new()?;
        let key_filter = Arc::new(PluggableKeyFilter::new());
        let (poster, queue) = event_queue(Some(Arc::clone(&key_filter)));
        queue.insert_into(&event_loop.handle())?;

        let dispatcher = InputDispatcher::new(Arc::clone(&toolkit), keyboard, &config);
        let window = Arc::new(PlatformWindow::new(
            Arc::clone(&toolkit),
            Size::from((width.max(0), height.max(0))),
            device_pixel_ratio,
            &config.resize,
        ));

        Ok(Self {
            event_loop,
            dispatcher,
            poster,
            key_filter,
            toolkit,
            config,
            window,
            observers: Vec::new(),
        })
    }

    pub fn window(&self) -> &Arc<PlatformWindow> {
        &self.window
    }

    /// Replay one step, draining the loop before returning
    pub fn run_step(&mut self, step: &ScriptStep) -> Result<StepReport, ReplayError> {
        let mut post = None;

        match step {
            ScriptStep::Window {
                width,
                height,
                device_pixel_ratio,
            } => {
                self.window = Arc::new(PlatformWindow::new(
                    Arc::clone(&self.toolkit),
                    Size::from(((*width).max(0), (*height).max(0))),
                    *device_pixel_ratio,
                    &self.config.resize,
                ));
            }
            ScriptStep::Event(event) => {
                post = Some(self.poster.post_event(&self.window, event.clone()));
            }
            ScriptStep::FilterKey { key } => {
                let (observer, receiver) = KeyObserver::channel();
                self.key_filter.install_key_event_filter_object(*key, &observer);
                self.observers.push((observer, receiver));
            }
            ScriptStep::CompositorResize { width, height } => {
                self.window.notify_compositor_resize(*width, *height);
            }
            ScriptStep::BufferSwap { width, height } => {
                self.window.notify_buffer_swapped(*width, *height);
            }
        }

        self.event_loop
            .dispatch(Some(Duration::ZERO), &mut self.dispatcher)?;

        let observed = self
            .observers
            .iter()
            .flat_map(|(_, receiver)| receiver.try_iter())
            .collect();

        Ok(StepReport { post, observed })
    }

    /// Replay every step in order
    pub fn run(&mut self, steps: &[ScriptStep]) -> Result<Vec<StepReport>, ReplayError> {
        steps.iter().map(|step| self.run_step(step)).collect()
    }
}

impl std::fmt::Debug for ScriptRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptRunner")
            .field("window", &self.window)
            .field("dispatcher", &self.dispatcher)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventDetails;

    #[test]
    fn parses_steps_and_skips_comments() {
        let script = r#"
            # open with a filter
            {"step": "filter_key", "key": 65}

            {"step": "event", "action": 0, "details": {"type": "key", "key_code": 97}}
            {"step": "compositor_resize", "width": 150, "height": 150}
            {"step": "buffer_swap", "width": 150, "height": 150}
            {"step": "window", "width": 10, "height": 20}
        "#;

        let steps = parse_script(script).expect("valid script");
        assert_eq!(steps.len(), 5);
        assert_eq!(steps[0], ScriptStep::FilterKey { key: KeyCode(65) });
        match &steps[1] {
            ScriptStep::Event(event) => {
                assert!(matches!(event.details, EventDetails::Key(ref k) if k.key_code == 97))
            }
            other => panic!("unexpected step: {other:?}"),
        }
        assert_eq!(
            steps[4],
            ScriptStep::Window {
                width: 10,
                height: 20,
                device_pixel_ratio: 1.0
            }
        );
    }

    #[test]
    fn parse_errors_carry_line_numbers() {
        let script = "{\"step\": \"buffer_swap\", \"width\": 1, \"height\": 1}\n{\"step\": \"nope\"}";
        match parse_script(script) {
            Err(ScriptError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_degenerate_windows() {
        let script = r#"{"step": "window", "width": 0, "height": 20}"#;
        assert!(matches!(
            parse_script(script),
            Err(ScriptError::Validation { line: 1, .. })
        ));

        let script = r#"{"step": "window", "width": 5, "height": 20, "device_pixel_ratio": -1}"#;
        assert!(matches!(
            parse_script(script),
            Err(ScriptError::Validation { line: 1, .. })
        ));
    }

    #[test]
    fn rejects_oversized_input() {
        let line = format!("{{\"step\": \"buffer_swap\", \"pad\": \"{}\"}}", "x".repeat(MAX_LINE_SIZE));
        assert!(matches!(
            parse_script(&line),
            Err(ScriptError::LineTooLong { line: 1, .. })
        ));
    }
}
