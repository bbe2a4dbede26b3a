// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Scripted Replay
//!
//! Drives a [`DecisionLoop`](crate::DecisionLoop) from a JSON-lines recording
//! instead of a camera and an OCR engine. Each line is one frame:
//!
//! ```text
//! {"at_ms": 6500, "key": "s", "variants": [[{"text": "ABC 123", "confidence": 0.91}], []]}
//! {"at_ms": 7000, "capture_failed": true}
//! ```
//!
//! - `at_ms`: loop clock reading when the frame arrives (non-decreasing)
//! - `key`: optional operator key, `q` or `s`
//! - `capture_failed`: the frame grab fails
//! - `variants`: one hypothesis list per preprocessing variant
//!
//! Blank lines and lines starting with `#` are skipped. Running out of frames
//! quits the loop.

use crate::capture::{ObservationSource, Preprocessor, RecognitionEngine};
use crate::controls::{OperatorCommand, OperatorControls};
use crate::decision_loop::Collaborators;
use crate::gateway::ActuatorGateway;
use image::{DynamicImage, RgbImage};
use plategate_config::CaptureConfig;
use plategate_hal::{ManualTimeProvider, TimeProvider};
use plategate_structures::{CaptureError, Frame, Hypothesis, RecognitionError};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("Cannot read replay script {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid replay frame at line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Replay frame at line {line} goes back in time ({at_ms} ms after {previous_ms} ms)")]
    TimeWentBackwards {
        line: usize,
        at_ms: u64,
        previous_ms: u64,
    },
}

/// One recorded frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayFrame {
    pub at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub capture_failed: bool,
    #[serde(default)]
    pub variants: Vec<Vec<Hypothesis>>,
}

impl ReplayFrame {
    fn command(&self) -> Option<OperatorCommand> {
        self.key
            .as_deref()
            .and_then(|key| key.chars().next())
            .and_then(OperatorCommand::from_key)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayScript {
    frames: Vec<ReplayFrame>,
}

impl ReplayScript {
    pub fn new(frames: Vec<ReplayFrame>) -> Self {
        Self { frames }
    }

    pub fn parse(text: &str) -> Result<Self, ReplayError> {
        let mut frames: Vec<ReplayFrame> = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let frame: ReplayFrame = serde_json::from_str(trimmed)
                .map_err(|source| ReplayError::Parse { line, source })?;
            if let Some(previous) = frames.last() {
                if frame.at_ms < previous.at_ms {
                    return Err(ReplayError::TimeWentBackwards {
                        line,
                        at_ms: frame.at_ms,
                        previous_ms: previous.at_ms,
                    });
                }
            }
            frames.push(frame);
        }
        Ok(Self { frames })
    }

    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let text = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn frames(&self) -> &[ReplayFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Playback position shared by all replay collaborators
#[derive(Debug)]
struct Cursor {
    upcoming: VecDeque<ReplayFrame>,
    current: Option<ReplayFrame>,
    /// Hypothesis lists of the current scan not yet handed to the engine
    pending: VecDeque<Vec<Hypothesis>>,
    recognized: usize,
    exhausted: bool,
    releases: usize,
    frame_width: u32,
    frame_height: u32,
}

/// Hands out collaborators that play back one script in lockstep
///
/// The clock jumps to each frame's `at_ms` as the frame is grabbed and never
/// moves backwards, so waits inside the loop (capture retry) still count.
#[derive(Debug, Clone)]
pub struct ReplayDriver {
    cursor: Rc<RefCell<Cursor>>,
    clock: ManualTimeProvider,
}

impl ReplayDriver {
    pub fn new(script: ReplayScript, frame_width: u32, frame_height: u32) -> Self {
        let cursor = Cursor {
            upcoming: script.frames.into(),
            current: None,
            pending: VecDeque::new(),
            recognized: 0,
            exhausted: false,
            releases: 0,
            frame_width,
            frame_height,
        };
        Self {
            cursor: Rc::new(RefCell::new(cursor)),
            clock: ManualTimeProvider::new(),
        }
    }

    pub fn from_config(script: ReplayScript, config: &CaptureConfig) -> Self {
        Self::new(script, config.frame_width, config.frame_height)
    }

    pub fn clock(&self) -> ManualTimeProvider {
        self.clock.clone()
    }

    pub fn source(&self) -> ReplaySource {
        ReplaySource {
            cursor: self.cursor.clone(),
            clock: self.clock.clone(),
        }
    }

    pub fn preprocessor(&self) -> ReplayPreprocessor {
        ReplayPreprocessor {
            cursor: self.cursor.clone(),
        }
    }

    pub fn engine(&self) -> ReplayEngine {
        ReplayEngine {
            cursor: self.cursor.clone(),
        }
    }

    pub fn controls(&self) -> ReplayControls {
        ReplayControls {
            cursor: self.cursor.clone(),
        }
    }

    /// Everything a decision loop needs, except the actuator
    pub fn collaborators(&self, gateway: Box<dyn ActuatorGateway>) -> Collaborators {
        Collaborators {
            source: Box::new(self.source()),
            preprocessor: Box::new(self.preprocessor()),
            engine: Box::new(self.engine()),
            gateway,
            controls: Box::new(self.controls()),
            clock: Box::new(self.clock()),
        }
    }

    /// Frames not yet grabbed
    pub fn remaining(&self) -> usize {
        self.cursor.borrow().upcoming.len()
    }

    /// How many times the source was released
    pub fn release_count(&self) -> usize {
        self.cursor.borrow().releases
    }
}

pub struct ReplaySource {
    cursor: Rc<RefCell<Cursor>>,
    clock: ManualTimeProvider,
}

impl ObservationSource for ReplaySource {
    fn next_frame(&mut self) -> Result<Frame, CaptureError> {
        let mut cursor = self.cursor.borrow_mut();
        cursor.pending.clear();
        cursor.recognized = 0;

        let Some(frame) = cursor.upcoming.pop_front() else {
            // Hand out one more frame so the controls get polled and can quit
            cursor.exhausted = true;
            cursor.current = None;
            return Ok(Frame::blank(cursor.frame_width, cursor.frame_height));
        };

        let at = Duration::from_millis(frame.at_ms);
        if at > self.clock.now() {
            self.clock.set(at);
        }
        debug!("[REPLAY] frame at {} ms", frame.at_ms);

        let failed = frame.capture_failed;
        cursor.current = Some(frame);
        if failed {
            return Err(CaptureError::FrameUnavailable(
                "scripted capture failure".to_string(),
            ));
        }
        Ok(Frame::blank(cursor.frame_width, cursor.frame_height))
    }

    fn release(&mut self) {
        self.cursor.borrow_mut().releases += 1;
    }
}

/// One variant image per scripted hypothesis list
pub struct ReplayPreprocessor {
    cursor: Rc<RefCell<Cursor>>,
}

impl Preprocessor for ReplayPreprocessor {
    fn variants(&mut self, region: &RgbImage) -> Vec<DynamicImage> {
        let mut cursor = self.cursor.borrow_mut();
        let lists: Vec<Vec<Hypothesis>> = cursor
            .current
            .as_ref()
            .map(|frame| frame.variants.clone())
            .unwrap_or_default();
        let count = lists.len();
        cursor.pending = lists.into();
        cursor.recognized = 0;
        (0..count)
            .map(|_| DynamicImage::ImageRgb8(region.clone()))
            .collect()
    }
}

/// Returns the scripted hypotheses of each variant in order
pub struct ReplayEngine {
    cursor: Rc<RefCell<Cursor>>,
}

impl RecognitionEngine for ReplayEngine {
    fn recognize(&mut self, _image: &DynamicImage) -> Result<Vec<Hypothesis>, RecognitionError> {
        let mut cursor = self.cursor.borrow_mut();
        let variant = cursor.recognized;
        cursor.recognized += 1;
        cursor.pending.pop_front().ok_or_else(|| RecognitionError {
            variant,
            reason: "no scripted reading left for this frame".to_string(),
        })
    }
}

/// Scripted keys; quits once the script is exhausted
pub struct ReplayControls {
    cursor: Rc<RefCell<Cursor>>,
}

impl OperatorControls for ReplayControls {
    fn poll(&mut self) -> Option<OperatorCommand> {
        let cursor = self.cursor.borrow();
        if cursor.exhausted {
            return Some(OperatorCommand::Quit);
        }
        cursor.current.as_ref().and_then(ReplayFrame::command)
    }
}
