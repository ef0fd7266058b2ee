//! Fixed-duration observation window

use std::cell::Cell;
use std::time::{Duration, Instant};

use camera_capture::{CaptureGuard, FrameSource};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::blink::BlinkDetector;
use crate::config::DrowsinessConfig;
use crate::landmarks::LandmarkInference;
use crate::DrowsinessError;

/// Time source for the observation loop
pub trait Clock {
    /// Monotonic time since an arbitrary origin
    fn now(&self) -> Duration;

    /// Block for `duration`
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `Instant` and `thread::sleep`
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Clock that only moves when slept on or advanced by hand
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Why a session stopped before the window elapsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// The frame source stopped producing frames
    DeviceUnavailable,
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Completion {
    Completed,
    Aborted { reason: AbortReason },
}

/// Tally of one observation window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationResult {
    /// Blink onsets seen during the window
    pub blink_count: u32,
    /// Frames that went through inference
    pub frames_processed: u32,
    /// Frames in which a face was found
    pub faces_detected: u32,
    /// Time spent observing, by the session clock
    pub elapsed: Duration,
    pub completion: Completion,
}

impl ObservationResult {
    /// Whether the full window was observed
    pub fn is_complete(&self) -> bool {
        self.completion == Completion::Completed
    }

    pub fn abort_reason(&self) -> Option<AbortReason> {
        match self.completion {
            Completion::Completed => None,
            Completion::Aborted { reason } => Some(reason),
        }
    }
}

/// Session errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Landmark inference failed on frame {frame} after {blink_count} blinks: {source}")]
    Inference {
        frame: u32,
        blink_count: u32,
        #[source]
        source: DrowsinessError,
    },
}

/// Runs the capture → inference → blink detection loop for a fixed time
pub struct ObservationWindow<C: Clock> {
    detector: BlinkDetector,
    clock: C,
}

impl ObservationWindow<SystemClock> {
    /// Window driven by the wall clock
    pub fn new(config: &DrowsinessConfig) -> Self {
        Self::with_clock(config, SystemClock::new())
    }
}

impl<C: Clock> ObservationWindow<C> {
    pub fn with_clock(config: &DrowsinessConfig, clock: C) -> Self {
        Self {
            detector: BlinkDetector::from_config(config),
            clock,
        }
    }

    /// Observe for `duration`, sampling every `poll_interval`.
    ///
    /// The source is released on every exit path. A source that stops
    /// producing frames ends the session early with the partial count.
    pub fn run<S, I>(
        &mut self,
        source: S,
        inference: &I,
        duration: Duration,
        poll_interval: Duration,
    ) -> Result<ObservationResult, SessionError>
    where
        S: FrameSource,
        I: LandmarkInference + ?Sized,
    {
        self.run_with_progress(source, inference, duration, poll_interval, |_| {})
    }

    /// Like [`run`](Self::run), calling `on_blink` with the running count after each blink
    pub fn run_with_progress<S, I, F>(
        &mut self,
        source: S,
        inference: &I,
        duration: Duration,
        poll_interval: Duration,
        mut on_blink: F,
    ) -> Result<ObservationResult, SessionError>
    where
        S: FrameSource,
        I: LandmarkInference + ?Sized,
        F: FnMut(u32),
    {
        let mut source = CaptureGuard::new(source);
        self.detector.reset();

        let start = self.clock.now();
        let mut blink_count = 0u32;
        let mut frames_processed = 0u32;
        let mut faces_detected = 0u32;

        info!(
            "Observation started: window {:?}, poll interval {:?}",
            duration, poll_interval
        );

        let completion = loop {
            if self.clock.now().saturating_sub(start) >= duration {
                break Completion::Completed;
            }

            let Some(frame) = source.capture() else {
                warn!(
                    "Frame source unavailable after {} frames, ending session early",
                    frames_processed
                );
                break Completion::Aborted {
                    reason: AbortReason::DeviceUnavailable,
                };
            };

            let started = Instant::now();
            let landmarks = inference.infer(&frame).map_err(|err| SessionError::Inference {
                frame: frames_processed,
                blink_count,
                source: err,
            })?;
            metrics::histogram!("landmark_inference_seconds").record(started.elapsed().as_secs_f64());
            metrics::counter!("frames_processed_total").increment(1);

            frames_processed += 1;
            if landmarks.is_some() {
                faces_detected += 1;
            }

            if self.detector.detect(landmarks.as_ref()) {
                blink_count += 1;
                metrics::counter!("blinks_detected_total").increment(1);
                debug!("Blink {} at frame {}", blink_count, frame.sequence);
                on_blink(blink_count);
            }

            self.clock.sleep(poll_interval);
        };

        let result = ObservationResult {
            blink_count,
            frames_processed,
            faces_detected,
            elapsed: self.clock.now().saturating_sub(start),
            completion,
        };

        info!(
            ended_in_blink = self.detector.state().in_blink,
            "Observation finished: {} blinks over {} frames ({:?})",
            result.blink_count, result.frames_processed, result.completion
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{LandmarkPoint, LandmarkSet, FACE_MESH_POINTS, LEFT_EYE_LOWER_LID, LEFT_EYE_UPPER_LID};
    use camera_capture::VideoFrame;
    use std::cell::RefCell;

    /// Frame source producing `limit` frames, tagging each with its index
    struct ScriptedSource {
        produced: u32,
        limit: Option<u32>,
        released: bool,
    }

    impl ScriptedSource {
        fn endless() -> Self {
            Self { produced: 0, limit: None, released: false }
        }

        fn failing_after(limit: u32) -> Self {
            Self { produced: 0, limit: Some(limit), released: false }
        }
    }

    impl FrameSource for ScriptedSource {
        fn capture(&mut self) -> Option<VideoFrame> {
            if self.released || self.limit.is_some_and(|l| self.produced >= l) {
                return None;
            }
            let mut frame = VideoFrame::blank(2, 2);
            frame.sequence = self.produced;
            self.produced += 1;
            Some(frame)
        }

        fn release(&mut self) {
            self.released = true;
        }

        fn is_released(&self) -> bool {
            self.released
        }
    }

    #[derive(Clone, Copy)]
    enum Eye {
        Open,
        Closed,
        NoFace,
    }

    /// Inference replaying a per-frame script, repeating the last entry
    struct ScriptedInference {
        script: Vec<Eye>,
        fail_at: Option<u32>,
        calls: RefCell<u32>,
    }

    impl ScriptedInference {
        fn new(script: Vec<Eye>) -> Self {
            Self { script, fail_at: None, calls: RefCell::new(0) }
        }
    }

    impl LandmarkInference for ScriptedInference {
        fn infer(&self, frame: &VideoFrame) -> Result<Option<LandmarkSet>, DrowsinessError> {
            *self.calls.borrow_mut() += 1;
            if self.fail_at == Some(frame.sequence) {
                return Err(DrowsinessError::Inference("session crashed".into()));
            }
            let idx = (frame.sequence as usize).min(self.script.len() - 1);
            let aperture = match self.script[idx] {
                Eye::Open => 0.02,
                Eye::Closed => 0.001,
                Eye::NoFace => return Ok(None),
            };
            let mut points = vec![LandmarkPoint::default(); FACE_MESH_POINTS];
            points[LEFT_EYE_UPPER_LID].y = 0.5;
            points[LEFT_EYE_LOWER_LID].y = 0.5 + aperture;
            Ok(Some(LandmarkSet::new(points)))
        }
    }

    fn window(clock: &ManualClock) -> ObservationWindow<&ManualClock> {
        ObservationWindow::with_clock(&DrowsinessConfig::default(), clock)
    }

    const SECOND: Duration = Duration::from_secs(1);
    const TICK: Duration = Duration::from_millis(100);

    #[test]
    fn test_full_window_counts_onsets() {
        use Eye::*;
        let clock = ManualClock::new();
        let inference = ScriptedInference::new(vec![
            Open, Closed, Closed, Closed, Open, Closed, Open, Open, Closed, Open,
        ]);
        let mut source = ScriptedSource::endless();

        let result = window(&clock).run(&mut source, &inference, SECOND, TICK).unwrap();

        assert_eq!(result.blink_count, 3);
        assert_eq!(result.frames_processed, 10);
        assert_eq!(result.faces_detected, 10);
        assert_eq!(result.elapsed, SECOND);
        assert!(result.is_complete());
        assert!(source.released);
    }

    #[test]
    fn test_no_face_full_duration() {
        let clock = ManualClock::new();
        let inference = ScriptedInference::new(vec![Eye::NoFace]);
        let mut source = ScriptedSource::endless();

        let result = window(&clock).run(&mut source, &inference, SECOND, TICK).unwrap();

        assert_eq!(result.blink_count, 0);
        assert_eq!(result.faces_detected, 0);
        assert_eq!(result.frames_processed, 10);
        assert!(result.is_complete());
    }

    #[test]
    fn test_device_lost_reports_partial_count() {
        use Eye::*;
        let clock = ManualClock::new();
        let inference = ScriptedInference::new(vec![Closed, Open, Closed, Open, Closed]);
        let mut source = ScriptedSource::failing_after(4);

        let result = window(&clock).run(&mut source, &inference, SECOND, TICK).unwrap();

        assert_eq!(result.blink_count, 2);
        assert_eq!(result.frames_processed, 4);
        assert_eq!(result.abort_reason(), Some(AbortReason::DeviceUnavailable));
        assert!(!result.is_complete());
        assert!(source.released);
    }

    #[test]
    fn test_inference_error_releases_source() {
        let clock = ManualClock::new();
        let mut inference = ScriptedInference::new(vec![Eye::Closed, Eye::Open]);
        inference.fail_at = Some(3);
        let mut source = ScriptedSource::endless();

        let err = window(&clock).run(&mut source, &inference, SECOND, TICK).unwrap_err();

        match err {
            SessionError::Inference { frame, blink_count, .. } => {
                assert_eq!(frame, 3);
                assert_eq!(blink_count, 1);
            }
        }
        assert!(source.released);
    }

    #[test]
    fn test_sessions_are_reproducible() {
        use Eye::*;
        let script = vec![Closed, Closed, Open, Closed, NoFace, Closed, Open, Closed];
        let config = DrowsinessConfig::default();
        let clock = ManualClock::new();
        let mut window = ObservationWindow::with_clock(&config, &clock);

        let first_clock_start = clock.now();
        let first = window
            .run(ScriptedSource::endless(), &ScriptedInference::new(script.clone()), SECOND, TICK)
            .unwrap();
        assert_eq!(clock.now() - first_clock_start, SECOND);

        // the first session ended mid-blink; a fresh session must not inherit it
        let second = window
            .run(ScriptedSource::endless(), &ScriptedInference::new(script), SECOND, TICK)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.blink_count, 4);
    }

    #[test]
    fn test_progress_callback_sees_running_count() {
        use Eye::*;
        let clock = ManualClock::new();
        let inference = ScriptedInference::new(vec![Closed, Open, Closed, Open]);
        let mut seen = Vec::new();

        let result = window(&clock)
            .run_with_progress(ScriptedSource::endless(), &inference, SECOND, TICK, |n| seen.push(n))
            .unwrap();

        assert_eq!(seen, vec![1, 2]);
        assert_eq!(result.blink_count, 2);
    }

    #[test]
    fn test_zero_window_takes_no_frames() {
        let clock = ManualClock::new();
        let inference = ScriptedInference::new(vec![Eye::Closed]);
        let mut source = ScriptedSource::endless();

        let result = window(&clock).run(&mut source, &inference, Duration::ZERO, TICK).unwrap();

        assert_eq!(result.frames_processed, 0);
        assert_eq!(*inference.calls.borrow(), 0);
        assert!(result.is_complete());
        assert!(source.released);
    }

    #[test]
    fn test_records_frame_and_blink_metrics() {
        use Eye::*;
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let clock = ManualClock::new();
        let inference = ScriptedInference::new(vec![Closed, Open, Closed, Closed, Open]);

        let result = metrics::with_local_recorder(&recorder, || {
            window(&clock).run(ScriptedSource::endless(), &inference, SECOND, TICK)
        })
        .unwrap();
        assert_eq!(result.blink_count, 2);

        let rendered = handle.render();
        assert!(rendered.contains("frames_processed_total 10"), "{rendered}");
        assert!(rendered.contains("blinks_detected_total 2"), "{rendered}");
        assert!(rendered.contains("landmark_inference_seconds_count 10"), "{rendered}");
    }
}
