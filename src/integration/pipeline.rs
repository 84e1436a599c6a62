//! FollowPipeline: the frame loop tying detection, tracking, planning and
//! dispatch together.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::gateway::{FollowState, SelectionGateway, SharedState, lock};
use super::{AcquisitionError, DetectionSource, FrameSource};
use crate::config::FollowConfig;
use crate::dispatch::Dispatcher;
use crate::motion::{Command, MotionPlanner};
use crate::tracker::{TargetState, TargetTracker, filter_class};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("frame acquisition failed: {0}")]
    Acquisition(#[from] AcquisitionError),
}

/// Cooperative stop request for a running pipeline.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Result of one pass through the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Detections processed and a command planned.
    Completed { command: Command, state: TargetState },
    /// Detection failed; target and command left unchanged, nothing sent.
    Skipped,
    /// The frame source has no more frames.
    Exhausted,
}

/// Counters reported when the loop ends normally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub skipped: u64,
}

/// Runs acquisition, detection, tracking, planning and dispatch as one
/// blocking pipeline per cycle.
///
/// The frame source is released and a final `Stop` is sent before the
/// transport closes on every exit path, including unwinding, because both
/// happen when the pipeline is dropped.
pub struct FollowPipeline<F: FrameSource, D: DetectionSource> {
    frames: F,
    detector: D,
    dispatcher: Dispatcher,
    planner: MotionPlanner,
    target_class: u32,
    cycle_interval: Option<Duration>,
    state: SharedState,
    stop: StopHandle,
}

impl<F, D> FollowPipeline<F, D>
where
    F: FrameSource,
    D: DetectionSource,
    D::Error: fmt::Display,
{
    pub fn new(frames: F, detector: D, dispatcher: Dispatcher, config: &FollowConfig) -> Self {
        let state = FollowState {
            tracker: TargetTracker::new(config.tracker_config()),
            ..Default::default()
        };
        Self {
            frames,
            detector,
            dispatcher,
            planner: config.planner(),
            target_class: config.target_class,
            cycle_interval: config.cycle_interval(),
            state: Arc::new(Mutex::new(state)),
            stop: StopHandle::default(),
        }
    }

    /// Handle for the request layer. Cheap to clone, safe to use from any thread.
    pub fn gateway(&self) -> SelectionGateway {
        SelectionGateway::new(Arc::clone(&self.state))
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Run one cycle.
    pub fn step(&mut self) -> Result<CycleOutcome, PipelineError> {
        let Some(frame) = self.frames.next_frame()? else {
            return Ok(CycleOutcome::Exhausted);
        };

        let raw = match self.detector.detect(&frame.data, frame.width, frame.height) {
            Ok(detections) => detections,
            Err(err) => {
                warn!(error = %err, "detection failed, skipping cycle");
                return Ok(CycleOutcome::Skipped);
            }
        };
        let detections = filter_class(raw, self.target_class);

        let (command, target_state) = {
            let mut state = lock(&self.state);
            let held = state.tracker.current().is_some();
            let mut target_state = state.tracker.update(&detections);
            // A target lost this cycle must plan Stop before anything new is adopted.
            if !held && state.tracker.acquire(&detections).is_some() {
                target_state = TargetState::Active;
            }
            let bbox = state.tracker.current();
            let command = self.planner.plan(bbox.as_ref(), frame.width as f32);
            state.command = command;
            state.planned_from = bbox;
            state.last_detections = detections;
            debug!(
                frame = state.tracker.frame_id(),
                candidates = state.last_detections.len(),
                bbox = ?bbox.map(|b| b.to_tlbr()),
                %command,
                "cycle"
            );
            (command, target_state)
        };

        self.dispatcher.send(command);
        Ok(CycleOutcome::Completed {
            command,
            state: target_state,
        })
    }

    /// Drive cycles until the source is exhausted or a stop is requested.
    ///
    /// An acquisition failure ends the loop with an error; the frame source
    /// and transport are still shut down.
    pub fn run(mut self) -> Result<RunSummary, PipelineError> {
        info!(
            target_class = self.target_class,
            dead_band = self.planner.dead_band,
            "follow loop started"
        );
        let mut summary = RunSummary::default();

        while !self.stop.is_stopped() {
            let started = Instant::now();
            match self.step() {
                Ok(CycleOutcome::Completed { .. }) => summary.cycles += 1,
                Ok(CycleOutcome::Skipped) => summary.skipped += 1,
                Ok(CycleOutcome::Exhausted) => {
                    info!("frame source exhausted");
                    break;
                }
                Err(err) => {
                    error!(error = %err, "follow loop aborted");
                    return Err(err);
                }
            }
            if let Some(interval) = self.cycle_interval {
                if let Some(rest) = interval.checked_sub(started.elapsed()) {
                    thread::sleep(rest);
                }
            }
        }

        info!(cycles = summary.cycles, skipped = summary.skipped, "follow loop finished");
        Ok(summary)
    }
}

impl<F: FrameSource, D: DetectionSource> Drop for FollowPipeline<F, D> {
    fn drop(&mut self) {
        self.frames.release();
        debug!("frame source released");
        // `dispatcher` is dropped after this, sending the final Stop and
        // closing the transport.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{DispatchPolicy, MemoryTransport};
    use crate::integration::Frame;
    use crate::tracker::Detection;
    use std::collections::VecDeque;

    struct MockFrames {
        frames: VecDeque<Frame>,
        released: Arc<AtomicBool>,
    }

    impl FrameSource for MockFrames {
        fn next_frame(&mut self) -> Result<Option<Frame>, AcquisitionError> {
            Ok(self.frames.pop_front())
        }

        fn release(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    struct MockDetector {
        script: VecDeque<Result<Vec<Detection>, String>>,
    }

    impl DetectionSource for MockDetector {
        type Error = String;

        fn detect(
            &mut self,
            _input: &[u8],
            _width: u32,
            _height: u32,
        ) -> Result<Vec<Detection>, Self::Error> {
            self.script.pop_front().unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn pipeline(
        script: Vec<Result<Vec<Detection>, String>>,
        probe: &MemoryTransport,
        released: &Arc<AtomicBool>,
    ) -> FollowPipeline<MockFrames, MockDetector> {
        let frames = (0..script.len())
            .map(|_| Frame {
                data: Vec::new(),
                width: 320,
                height: 320,
            })
            .collect();
        let dispatcher = Dispatcher::spawn(probe.clone(), DispatchPolicy::EveryCycle).unwrap();
        FollowPipeline::new(
            MockFrames {
                frames,
                released: Arc::clone(released),
            },
            MockDetector {
                script: script.into(),
            },
            dispatcher,
            &FollowConfig::default(),
        )
    }

    #[test]
    fn test_detector_failure_skips_cycle() {
        let probe = MemoryTransport::new();
        let released = Arc::new(AtomicBool::new(false));
        let person = Detection::new(100.0, 100.0, 150.0, 200.0, 0, 0.9);
        let mut pipeline = pipeline(
            vec![Ok(vec![person.clone()]), Err("inference".into())],
            &probe,
            &released,
        );
        let gateway = pipeline.gateway();

        assert!(matches!(pipeline.step().unwrap(), CycleOutcome::Completed { .. }));
        gateway.select_target(120.0, 150.0).unwrap();

        assert_eq!(pipeline.step().unwrap(), CycleOutcome::Skipped);
        assert_eq!(gateway.current_target(), Some(person.bbox));
        assert_eq!(gateway.last_detections(), vec![person]);
        assert_eq!(pipeline.step().unwrap(), CycleOutcome::Exhausted);
    }

    #[test]
    fn test_other_classes_are_ignored() {
        let probe = MemoryTransport::new();
        let released = Arc::new(AtomicBool::new(false));
        let mut pipeline = pipeline(
            vec![Ok(vec![Detection::new(100.0, 100.0, 150.0, 200.0, 2, 0.9)])],
            &probe,
            &released,
        );
        let gateway = pipeline.gateway();
        pipeline.step().unwrap();
        assert!(gateway.last_detections().is_empty());
        assert!(gateway.select_target(120.0, 150.0).is_err());
    }

    #[test]
    fn test_run_releases_and_stops() {
        let probe = MemoryTransport::new();
        let released = Arc::new(AtomicBool::new(false));
        let pipeline = pipeline(vec![Ok(Vec::new()), Ok(Vec::new())], &probe, &released);

        let summary = pipeline.run().unwrap();
        assert_eq!(summary, RunSummary { cycles: 2, skipped: 0 });
        assert!(released.load(Ordering::SeqCst));
        assert_eq!(probe.last(), Some(Command::Stop));
        assert!(probe.is_closed());
    }

    #[test]
    fn test_stop_handle_ends_loop_before_first_cycle() {
        let probe = MemoryTransport::new();
        let released = Arc::new(AtomicBool::new(false));
        let pipeline = pipeline(vec![Ok(Vec::new())], &probe, &released);
        pipeline.stop_handle().stop();

        assert_eq!(pipeline.run().unwrap(), RunSummary::default());
        assert!(released.load(Ordering::SeqCst));
        assert_eq!(probe.sent(), vec![Command::Stop]);
    }
}
