// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Decision Loop
//!
//! Root of the control flow. The observation source is opened once before the
//! first iteration; failing to acquire it ends the run with an error. Then one
//! iteration per captured frame:
//!
//! 1. grab a frame (failure: log, wait `retry_delay`, next iteration; a source
//!    that went away for good ends the run)
//! 2. poll the operator (quit, or a manual scan request)
//! 3. ask the scheduler whether a scan is due
//! 4. if so: crop, preprocess, recognize, fuse, suppress duplicates, match,
//!    and on a grant signal the actuator
//!
//! The loop is the only reader of the clock and the only owner of the
//! [`SchedulerState`]. Scans run synchronously, so a slow recognizer delays
//! the next frame.

use crate::allow_list::AllowList;
use crate::artifacts::{DebugArtifactSink, DirectoryArtifactSink};
use crate::capture::{ObservationSource, Preprocessor, RecognitionEngine, RegionOfInterest};
use crate::controls::{OperatorCommand, OperatorControls};
use crate::fusion::RecognitionFusion;
use crate::gateway::{Acknowledgment, ActuatorGateway};
use crate::matcher::Matcher;
use crate::scheduler::{ScanPhase, ScanScheduler, SchedulerState};
use plategate_config::PlateGateConfig;
use plategate_hal::TimeProvider;
use plategate_structures::{
    CaptureError, Decision, Frame, Hypothesis, Identifier, InconclusiveReason,
};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// External collaborators the loop drives
pub struct Collaborators {
    pub source: Box<dyn ObservationSource>,
    pub preprocessor: Box<dyn Preprocessor>,
    pub engine: Box<dyn RecognitionEngine>,
    pub gateway: Box<dyn ActuatorGateway>,
    pub controls: Box<dyn OperatorControls>,
    pub clock: Box<dyn TimeProvider>,
}

/// What one iteration did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// No frame this iteration; already waited the retry delay
    CaptureFailed,
    /// Source cannot deliver frames anymore; the run is over
    SourceLost(CaptureError),
    /// Operator asked to stop
    Quit,
    /// Frame consumed, no scan due
    Idle(ScanPhase),
    Scanned(Decision),
}

/// Counters for one [`DecisionLoop::run`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub frames: usize,
    pub capture_failures: usize,
    pub scans: usize,
    pub grants: usize,
}

pub struct DecisionLoop {
    allow_list: AllowList,
    matcher: Matcher,
    fusion: RecognitionFusion,
    scheduler: ScanScheduler,
    state: SchedulerState,
    roi: RegionOfInterest,
    retry_delay: Duration,

    source: Box<dyn ObservationSource>,
    preprocessor: Box<dyn Preprocessor>,
    engine: Box<dyn RecognitionEngine>,
    gateway: Box<dyn ActuatorGateway>,
    controls: Box<dyn OperatorControls>,
    clock: Box<dyn TimeProvider>,
    artifacts: Option<Box<dyn DebugArtifactSink>>,

    shut_down: bool,
}

impl DecisionLoop {
    /// Build the loop; the scheduler starts from the clock's current reading
    pub fn new(config: &PlateGateConfig, allow_list: AllowList, parts: Collaborators) -> Self {
        let scheduler = ScanScheduler::from_config(&config.scan);
        let state = scheduler.initial_state(parts.clock.now());

        let artifacts: Option<Box<dyn DebugArtifactSink>> = if config.debug.save_artifacts {
            Some(Box::new(DirectoryArtifactSink::new(
                config.debug.artifact_dir.clone(),
            )))
        } else {
            None
        };

        info!(
            "[LOOP] {} authorized plates, scan every {:?}, cooldown {:?}, actuator {}",
            allow_list.len(),
            scheduler.interval(),
            scheduler.cooldown(),
            if parts.gateway.is_connected() {
                "connected"
            } else {
                "in demo mode"
            }
        );

        Self {
            allow_list,
            matcher: Matcher::new(config.matching.fuzzy_threshold),
            fusion: RecognitionFusion::new(config.matching.noise_floor),
            scheduler,
            state,
            roi: RegionOfInterest::from_config(&config.capture),
            retry_delay: config.capture.retry_delay(),
            source: parts.source,
            preprocessor: parts.preprocessor,
            engine: parts.engine,
            gateway: parts.gateway,
            controls: parts.controls,
            clock: parts.clock,
            artifacts,
            shut_down: false,
        }
    }

    /// Replace the artifact sink chosen from the configuration
    pub fn with_artifacts(mut self, sink: Option<Box<dyn DebugArtifactSink>>) -> Self {
        self.artifacts = sink;
        self
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    pub fn gateway(&self) -> &dyn ActuatorGateway {
        self.gateway.as_ref()
    }

    /// Scheduler phase right now, for status display
    pub fn phase(&self) -> ScanPhase {
        self.scheduler.phase(&self.state, self.clock.now())
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Run one iteration
    ///
    /// Blocks for the duration of a scan when one is due, including the
    /// actuator round trip on a grant.
    pub fn tick(&mut self) -> TickOutcome {
        let frame = match self.source.next_frame() {
            Ok(frame) => frame,
            Err(e @ CaptureError::SourceUnavailable(_)) => {
                error!("[LOOP] {}", e);
                return TickOutcome::SourceLost(e);
            }
            Err(e) => {
                warn!("[LOOP] {}", e);
                self.clock.sleep(self.retry_delay);
                return TickOutcome::CaptureFailed;
            }
        };
        let now = self.clock.now();

        match self.controls.poll() {
            Some(OperatorCommand::Quit) => {
                info!("[LOOP] Quit requested");
                return TickOutcome::Quit;
            }
            Some(OperatorCommand::ManualScan) => {
                let (state, accepted) = self.scheduler.manual_trigger(&self.state, now);
                self.state = state;
                if accepted {
                    info!("[LOOP] Manual scan triggered");
                } else {
                    info!("[LOOP] Manual scan ignored during cooldown");
                }
            }
            None => {}
        }

        let phase = self.scheduler.phase(&self.state, now);
        if !phase.is_ready() {
            trace!("[LOOP] {}", phase);
            return TickOutcome::Idle(phase);
        }

        TickOutcome::Scanned(self.scan(&frame, now))
    }

    /// Open the source, iterate until quit, then shut down
    ///
    /// Returns `SourceUnavailable` when the source cannot be acquired or goes
    /// away for good; the loop is shut down in that case too.
    pub fn run(&mut self) -> Result<LoopStats, CaptureError> {
        self.run_with(|_| {})
    }

    /// Like [`run`](Self::run), handing every decision to `on_decision`
    pub fn run_with<F>(&mut self, mut on_decision: F) -> Result<LoopStats, CaptureError>
    where
        F: FnMut(&Decision),
    {
        if let Err(e) = self.source.open() {
            error!("[LOOP] {}", e);
            self.shutdown();
            return Err(e);
        }

        let mut stats = LoopStats::default();
        loop {
            match self.tick() {
                TickOutcome::Quit => break,
                TickOutcome::SourceLost(e) => {
                    self.shutdown();
                    return Err(e);
                }
                TickOutcome::CaptureFailed => stats.capture_failures += 1,
                TickOutcome::Idle(_) => stats.frames += 1,
                TickOutcome::Scanned(decision) => {
                    stats.frames += 1;
                    stats.scans += 1;
                    if decision.is_granted() {
                        stats.grants += 1;
                    }
                    on_decision(&decision);
                }
            }
        }
        self.shutdown();
        Ok(stats)
    }

    /// Release the observation source and close the actuator session
    ///
    /// Safe to call more than once; also runs on drop.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.source.release();
        self.gateway.close();
        info!("[LOOP] Shut down");
    }

    fn scan(&mut self, frame: &Frame, now: Duration) -> Decision {
        self.state = self.scheduler.begin_scan(&self.state, now);
        info!("[SCAN] Scanning for license plate...");

        let region = self.roi.crop(frame);
        let variants = self.preprocessor.variants(&region);
        if let Some(sink) = self.artifacts.as_mut() {
            sink.save_region(&region);
            sink.save_variants(&variants);
        }

        let mut readings: Vec<Vec<Hypothesis>> = Vec::with_capacity(variants.len());
        for (i, variant) in variants.iter().enumerate() {
            match self.engine.recognize(variant) {
                Ok(hypotheses) => {
                    debug!("[SCAN] Recognition results for variant {}: {:?}", i, hypotheses);
                    readings.push(hypotheses);
                }
                Err(e) => {
                    warn!("[SCAN] {}", e);
                    readings.push(Vec::new());
                }
            }
        }

        let observed = self
            .fusion
            .fuse(&readings)
            .map(|best| (Identifier::new(&best.text), best.confidence))
            .filter(|(id, _)| !id.is_empty());
        let Some((observed, confidence)) = observed else {
            self.state = self.scheduler.record_no_detection(&self.state);
            info!("[SCAN] No license plate text detected");
            return Decision::Inconclusive(InconclusiveReason::NoDetection);
        };
        info!(
            "[SCAN] Detected plate '{}' with confidence {:.2}",
            observed, confidence
        );

        if self.scheduler.is_duplicate(&self.state, &observed) {
            info!("[SCAN] Same plate detected again, skipping to avoid duplicate actions");
            return Decision::Inconclusive(InconclusiveReason::DuplicateSuppressed);
        }
        self.state = self
            .scheduler
            .record_observation(&self.state, observed.clone());

        match self.matcher.evaluate(&observed, &self.allow_list).into_grant() {
            Some((identifier, kind)) => {
                self.state = self.scheduler.record_grant(&self.state, now);
                let decision = Decision::Granted { identifier, kind };
                info!("[SCAN] {}. Access granted", decision);
                self.signal_actuator();
                decision
            }
            None => {
                info!("[SCAN] '{}' is not authorized. Access denied", observed);
                Decision::Denied { observed }
            }
        }
    }

    fn signal_actuator(&mut self) {
        match self.gateway.signal_grant() {
            Ok(Acknowledgment::Demo) => debug!("[SCAN] No actuator attached, grant not signalled"),
            Ok(Acknowledgment::Received(line)) => debug!("[SCAN] Actuator acknowledged: {}", line),
            Err(e) => error!("[SCAN] Failed to communicate with actuator: {}", e),
        }
    }
}

impl Drop for DecisionLoop {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::PassthroughPreprocessor;
    use crate::controls::NoControls;
    use crate::gateway::NullGateway;
    use image::DynamicImage;
    use plategate_hal::ManualTimeProvider;
    use plategate_structures::{GatewayError, MatchKind, RecognitionError};
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// Blank frames, each taking one second of clock time
    struct TickingSource {
        clock: ManualTimeProvider,
        failures: Rc<RefCell<VecDeque<bool>>>,
        releases: Rc<Cell<usize>>,
    }

    impl ObservationSource for TickingSource {
        fn next_frame(&mut self) -> Result<Frame, CaptureError> {
            if self.failures.borrow_mut().pop_front().unwrap_or(false) {
                return Err(CaptureError::FrameUnavailable("camera hiccup".to_string()));
            }
            self.clock.advance(Duration::from_secs(1));
            Ok(Frame::blank(64, 48))
        }

        fn release(&mut self) {
            self.releases.set(self.releases.get() + 1);
        }
    }

    /// Pops one scripted scan result per recognize call
    struct QueueEngine {
        scans: Rc<RefCell<VecDeque<Result<Vec<Hypothesis>, RecognitionError>>>>,
    }

    impl RecognitionEngine for QueueEngine {
        fn recognize(&mut self, _image: &DynamicImage) -> Result<Vec<Hypothesis>, RecognitionError> {
            self.scans.borrow_mut().pop_front().unwrap_or(Ok(Vec::new()))
        }
    }

    struct FailingGateway {
        calls: Rc<Cell<usize>>,
        closes: Rc<Cell<usize>>,
    }

    impl ActuatorGateway for FailingGateway {
        fn signal_grant(&mut self) -> Result<Acknowledgment, GatewayError> {
            self.calls.set(self.calls.get() + 1);
            Err(GatewayError::AckTimeout(Duration::from_secs(1)))
        }

        fn is_connected(&self) -> bool {
            true
        }

        fn close(&mut self) {
            self.closes.set(self.closes.get() + 1);
        }
    }

    struct Harness {
        clock: ManualTimeProvider,
        failures: Rc<RefCell<VecDeque<bool>>>,
        scans: Rc<RefCell<VecDeque<Result<Vec<Hypothesis>, RecognitionError>>>>,
        releases: Rc<Cell<usize>>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                clock: ManualTimeProvider::new(),
                failures: Rc::default(),
                scans: Rc::default(),
                releases: Rc::default(),
            }
        }

        fn build(&self, gateway: Box<dyn ActuatorGateway>, allowed: &[&str]) -> DecisionLoop {
            let mut config = PlateGateConfig::default();
            config.scan.interval_secs = 1.0;
            config.scan.cooldown_secs = 3.0;
            let parts = Collaborators {
                source: Box::new(TickingSource {
                    clock: self.clock.clone(),
                    failures: self.failures.clone(),
                    releases: self.releases.clone(),
                }),
                preprocessor: Box::new(PassthroughPreprocessor),
                engine: Box::new(QueueEngine {
                    scans: self.scans.clone(),
                }),
                gateway,
                controls: Box::new(NoControls),
                clock: Box::new(self.clock.clone()),
            };
            let allow = AllowList::from_identifiers(allowed.iter().map(|p| Identifier::new(p)));
            DecisionLoop::new(&config, allow, parts)
        }

        fn push_reading(&self, text: &str, confidence: f32) {
            self.scans
                .borrow_mut()
                .push_back(Ok(vec![Hypothesis::new(text, confidence)]));
        }
    }

    #[test]
    fn test_exact_grant_enters_cooldown() {
        let harness = Harness::new();
        harness.push_reading("abc 123", 0.9);
        let mut decision_loop = harness.build(Box::new(NullGateway), &["ABC123"]);

        assert_eq!(
            decision_loop.tick(),
            TickOutcome::Scanned(Decision::Granted {
                identifier: Identifier::new("ABC123"),
                kind: MatchKind::Exact,
            })
        );
        assert!(decision_loop.phase().in_cooldown());
        assert!(matches!(decision_loop.tick(), TickOutcome::Idle(ScanPhase::Cooldown { .. })));
    }

    #[test]
    fn test_grant_stands_when_actuator_fails() {
        let harness = Harness::new();
        harness.push_reading("ABC123", 0.9);
        let calls = Rc::new(Cell::new(0));
        let closes = Rc::new(Cell::new(0));
        let gateway = FailingGateway {
            calls: calls.clone(),
            closes: closes.clone(),
        };
        let mut decision_loop = harness.build(Box::new(gateway), &["ABC123"]);

        let outcome = decision_loop.tick();
        assert!(matches!(outcome, TickOutcome::Scanned(ref d) if d.is_granted()));
        assert_eq!(calls.get(), 1);
        assert!(decision_loop.state().last_grant_at.is_some());

        drop(decision_loop);
        assert_eq!(closes.get(), 1);
        assert_eq!(harness.releases.get(), 1);
    }

    #[test]
    fn test_recognition_error_counts_as_empty_variant() {
        let harness = Harness::new();
        harness.scans.borrow_mut().push_back(Err(RecognitionError {
            variant: 0,
            reason: "engine crashed".to_string(),
        }));
        let mut decision_loop = harness.build(Box::new(NullGateway), &["ABC123"]);

        assert_eq!(
            decision_loop.tick(),
            TickOutcome::Scanned(Decision::Inconclusive(InconclusiveReason::NoDetection))
        );
    }

    #[test]
    fn test_whitespace_only_reading_is_no_detection() {
        let harness = Harness::new();
        harness.push_reading("   ", 0.95);
        let mut decision_loop = harness.build(Box::new(NullGateway), &["ABC123"]);

        assert_eq!(
            decision_loop.tick(),
            TickOutcome::Scanned(Decision::Inconclusive(InconclusiveReason::NoDetection))
        );
    }

    #[test]
    fn test_capture_failure_waits_retry_delay() {
        let harness = Harness::new();
        harness.failures.borrow_mut().push_back(true);
        let mut decision_loop = harness.build(Box::new(NullGateway), &[]);

        assert_eq!(decision_loop.tick(), TickOutcome::CaptureFailed);
        assert_eq!(harness.clock.now(), Duration::from_millis(500));
        assert!(!decision_loop.is_shut_down());
    }

    /// Camera that is gone: either refuses to open or stops mid-run
    struct DeadSource {
        opens: bool,
        releases: Rc<Cell<usize>>,
    }

    impl ObservationSource for DeadSource {
        fn open(&mut self) -> Result<(), CaptureError> {
            if self.opens {
                Ok(())
            } else {
                Err(CaptureError::SourceUnavailable("no camera".to_string()))
            }
        }

        fn next_frame(&mut self) -> Result<Frame, CaptureError> {
            Err(CaptureError::SourceUnavailable("camera unplugged".to_string()))
        }

        fn release(&mut self) {
            self.releases.set(self.releases.get() + 1);
        }
    }

    fn dead_source_loop(harness: &Harness, opens: bool) -> DecisionLoop {
        let mut decision_loop = harness.build(Box::new(NullGateway), &["ABC123"]);
        decision_loop.source = Box::new(DeadSource {
            opens,
            releases: harness.releases.clone(),
        });
        decision_loop
    }

    #[test]
    fn test_unavailable_source_is_fatal_at_startup() {
        let harness = Harness::new();
        let mut decision_loop = dead_source_loop(&harness, false);

        assert_eq!(
            decision_loop.run(),
            Err(CaptureError::SourceUnavailable("no camera".to_string()))
        );
        assert!(decision_loop.is_shut_down());
        assert_eq!(harness.releases.get(), 1);
        assert_eq!(harness.clock.now(), Duration::ZERO);
    }

    #[test]
    fn test_source_lost_mid_run_ends_loop() {
        let harness = Harness::new();
        let mut decision_loop = dead_source_loop(&harness, true);

        assert!(matches!(decision_loop.tick(), TickOutcome::SourceLost(_)));
        // No retry delay for a source that is gone
        assert_eq!(harness.clock.now(), Duration::ZERO);
        assert_eq!(
            decision_loop.run(),
            Err(CaptureError::SourceUnavailable("camera unplugged".to_string()))
        );
        assert!(decision_loop.is_shut_down());
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let harness = Harness::new();
        let mut decision_loop = harness.build(Box::new(NullGateway), &[]);
        decision_loop.shutdown();
        decision_loop.shutdown();
        drop(decision_loop);
        assert_eq!(harness.releases.get(), 1);
    }
}
