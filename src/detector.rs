//! Gate crossing detector
//!
//! Turns noisy distance samples into crossing events using two rolling
//! windows:
//!
//! - the **baseline** window tracks the ambient distance (slow drift from
//!   mounting or temperature) and is frozen while a detection attempt runs
//! - the **detection** window collects the samples following a deviating
//!   sample; only when its average still deviates from the baseline is the
//!   crossing confirmed, so a single noisy sample never triggers
//!
//! Two confirmed crossings are paired into one lap time.
//!
//! Samples that start or fill a detection attempt never enter the baseline.
//! A permanent step in the ambient distance larger than the trigger threshold
//! is therefore never absorbed: every sample arms, confirms and pairs into
//! phantom laps until [`TriggerDetector::restart`] (or a new configuration)
//! recalibrates on the new distance.
//!
//! ## Usage
//!
//! ```rust
//! use lapgate::{DetectorConfig, Event, TriggerDetector};
//!
//! let mut detector = TriggerDetector::new(DetectorConfig::default()).unwrap();
//!
//! // once per sampling cycle
//! for event in detector.observe(412, 1_000).iter() {
//!     if let Event::Match { elapsed_ms } = event {
//!         // lap completed
//!     }
//! }
//! ```

use log::{debug, info, warn};

use crate::config::{ConfigError, DetectorConfig, MAX_DETECTION_SIZE, MAX_WINDOW_SIZE};
use crate::event::{self, Event, Events};
use crate::window::BoundedAverageWindow;

/// Symmetric relative difference of `a` and `b` in percent, normalized by their mean
///
/// Truncating integer arithmetic. Values above 100 are possible. The mean
/// keeps its sign, so a negative mean gives a negative difference that never
/// reaches a trigger threshold. A zero mean is treated as 1.
pub fn percent_difference(a: i32, b: i32) -> i32 {
    let (a, b) = (a as i64, b as i64);
    let diff = num::abs(a - b);
    let mean = match (a + b) / 2 {
        0 => 1,
        mean => mean,
    };

    (diff * 100 / mean).max(i32::MIN as i64).min(i32::MAX as i64) as i32
}

/// Pending-trigger bookkeeping, kept apart from the windows
#[derive(Clone, Copy, Debug, Default)]
struct DetectorState {
    run_detection: bool,
    first_trigger_ms: Option<u32>,
    potential_trigger_ms: Option<u32>,
    last_matched_ms: u32,
}

impl DetectorState {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Hysteresis state machine over a baseline and a detection window
#[derive(Clone, Debug)]
pub struct TriggerDetector {
    config: DetectorConfig,
    baseline: BoundedAverageWindow<MAX_WINDOW_SIZE>,
    detection: BoundedAverageWindow<MAX_DETECTION_SIZE>,
    state: DetectorState,
}

impl Default for TriggerDetector {
    fn default() -> Self {
        let config = DetectorConfig::default();
        Self::with_valid_config(config)
    }
}

impl TriggerDetector {
    /// Create a detector, rejecting an out-of-range configuration
    pub fn new(config: DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: DetectorConfig) -> Self {
        Self {
            config,
            baseline: BoundedAverageWindow::new(config.window_size as usize),
            detection: BoundedAverageWindow::new(config.detection_size as usize),
            state: DetectorState::default(),
        }
    }

    /// Apply a new configuration and restart
    ///
    /// An invalid configuration is rejected before anything changes.
    pub fn configure(&mut self, config: DetectorConfig) -> Result<(), ConfigError> {
        if let Err(e) = config.validate() {
            warn!("Rejected detector configuration: {}", e);
            return Err(e);
        }

        self.config = config;
        self.baseline.reset(config.window_size as usize);
        self.detection.reset(config.detection_size as usize);
        self.restart();

        info!(
            "Detector configured: window={}, detection={}, trigger={}%, delay={}ms",
            config.window_size,
            config.detection_size,
            config.percent_diff_trigger,
            config.after_detection_delay_ms
        );

        Ok(())
    }

    /// Forget all samples and pending triggers, keeping the configuration
    pub fn restart(&mut self) {
        self.baseline.clear();
        self.detection.clear();
        self.state.reset();
    }

    /// Feed one sample taken at `now_ms`
    pub fn observe(&mut self, reading: i32, now_ms: u32) -> Events {
        // calibration: nothing is detected until the baseline is full
        if !self.baseline.is_full() {
            self.baseline.append(reading);
            return event::single(Event::Calibrating {
                filled: self.baseline.size() as u16,
                total: self.baseline.capacity() as u16,
            });
        }

        let baseline_average = self.baseline.average();
        let percent_diff = percent_difference(reading, baseline_average);
        let trigger = self.config.percent_diff_trigger as i32;

        let mut events = Events::new();

        if !self.state.run_detection {
            if percent_diff < trigger {
                self.baseline.append(reading);
                return event::single(Event::Tracking {
                    baseline_average,
                    percent_diff,
                });
            }

            // the arming sample opens the detection window, baseline stays frozen
            self.state.run_detection = true;
            self.state.potential_trigger_ms = Some(now_ms);
            debug!(
                "Detection started at {} ms: reading={}, baseline={}, diff={}%",
                now_ms, reading, baseline_average, percent_diff
            );
            event::push(&mut events, Event::DetectionStarted);
        }

        self.detection.append(reading);

        if !self.detection.is_full() {
            if events.is_empty() {
                event::push(
                    &mut events,
                    Event::DetectionProgress {
                        filled: self.detection.size() as u16,
                        total: self.detection.capacity() as u16,
                    },
                );
            }
            return events;
        }

        self.confirm(now_ms, &mut events);
        events
    }

    /// Evaluate a full detection window
    fn confirm(&mut self, now_ms: u32, events: &mut Events) {
        let detection_average = self.detection.average();
        let baseline_average = self.baseline.average();
        let det_percent_diff = percent_difference(detection_average, baseline_average);
        let is_trigger = det_percent_diff > self.config.percent_diff_trigger as i32;

        self.detection.clear();
        self.state.run_detection = false;
        let armed_at = self.state.potential_trigger_ms.take();

        if !is_trigger {
            debug!(
                "Detection rejected at {} ms: detection={}, baseline={}, diff={}%",
                now_ms, detection_average, baseline_average, det_percent_diff
            );
            event::push(
                events,
                Event::DetectionResult {
                    is_trigger: false,
                    armed_first: false,
                },
            );
            return;
        }

        match self.state.first_trigger_ms {
            None => {
                self.state.first_trigger_ms = armed_at.or(Some(now_ms));
                info!(
                    "First crossing confirmed: detection={}, baseline={}, diff={}%",
                    detection_average, baseline_average, det_percent_diff
                );
                event::push(
                    events,
                    Event::DetectionResult {
                        is_trigger: true,
                        armed_first: true,
                    },
                );
            }
            Some(first_ms) => {
                // both ends measured at the sample that armed each crossing
                let elapsed_ms = armed_at.unwrap_or(now_ms).wrapping_sub(first_ms);
                self.state.last_matched_ms = elapsed_ms;
                self.state.first_trigger_ms = None;
                info!("Match: lap time {} ms", elapsed_ms);
                event::push(
                    events,
                    Event::DetectionResult {
                        is_trigger: true,
                        armed_first: false,
                    },
                );
                event::push(events, Event::Match { elapsed_ms });
            }
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Baseline average for display
    pub fn current_baseline_average(&self) -> i32 {
        self.baseline.average()
    }

    /// Last completed lap time (ms), 0 before the first match
    pub fn last_matched_ms(&self) -> u32 {
        self.state.last_matched_ms
    }

    /// Timestamp of a confirmed crossing still waiting for its pair
    pub fn first_trigger_ms(&self) -> Option<u32> {
        self.state.first_trigger_ms
    }

    pub fn is_detecting(&self) -> bool {
        self.state.run_detection
    }

    pub fn is_calibrated(&self) -> bool {
        self.baseline.is_full()
    }
}
