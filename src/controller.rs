//! Gate controller
//!
//! Wraps a [`TriggerDetector`] with the bits the sampling loop needs around
//! it: starting and stopping a timing session, holding off sampling after a
//! completed lap, and keeping lap statistics.
//!
//! ## Usage
//!
//! ```rust
//! use lapgate::{DetectorConfig, GateController};
//!
//! let mut gate = GateController::new(DetectorConfig::default()).unwrap();
//! gate.start();
//!
//! // every sampling cycle
//! if let Some(events) = gate.poll(412, 1_000) {
//!     for event in events.iter() {
//!         // hand over to logging / transport
//!     }
//! }
//! ```

use log::info;

use crate::config::{ConfigError, DetectorConfig};
use crate::detector::TriggerDetector;
use crate::event::{matched_lap, Events};

/// Sampling state of the gate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateState {
    /// Samples are ignored
    Stopped,
    /// Every sample goes to the detector
    Running,
    /// A lap just completed, samples are ignored for the configured delay
    CoolingDown { since_ms: u32 },
}

pub struct GateController {
    detector: TriggerDetector,
    state: GateState,
    lap_count: u16,
    best_lap_ms: Option<u32>,
    last_lap_ms: Option<u32>,
}

impl GateController {
    /// Create a stopped controller
    pub fn new(config: DetectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            detector: TriggerDetector::new(config)?,
            state: GateState::Stopped,
            lap_count: 0,
            best_lap_ms: None,
            last_lap_ms: None,
        })
    }

    /// Start a new timing session
    ///
    /// Restarts the detector and clears the lap statistics.
    pub fn start(&mut self) {
        self.detector.restart();
        self.state = GateState::Running;
        self.lap_count = 0;
        self.best_lap_ms = None;
        self.last_lap_ms = None;
        info!("Gate started");
    }

    /// Stop sampling, discarding detector state
    pub fn stop(&mut self) {
        self.detector.restart();
        self.state = GateState::Stopped;
        info!("Gate stopped after {} laps", self.lap_count);
    }

    /// Switch between running and stopped, returns whether the gate now runs
    pub fn toggle(&mut self) -> bool {
        if self.is_running() {
            self.stop();
        } else {
            self.start();
        }
        self.is_running()
    }

    pub fn is_running(&self) -> bool {
        self.state != GateState::Stopped
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Apply a new detector configuration
    ///
    /// Restarts the detector and ends a pending cooldown. On error nothing
    /// changes.
    pub fn configure(&mut self, config: DetectorConfig) -> Result<(), ConfigError> {
        self.detector.configure(config)?;
        if let GateState::CoolingDown { .. } = self.state {
            self.state = GateState::Running;
        }
        Ok(())
    }

    /// Feed one sample
    ///
    /// Returns `None` when the sample was not used: the gate is stopped or
    /// still cooling down after a lap.
    pub fn poll(&mut self, reading: i32, now_ms: u32) -> Option<Events> {
        match self.state {
            GateState::Stopped => return None,
            GateState::CoolingDown { .. } => {
                if self.cooldown_remaining_ms(now_ms).is_some() {
                    return None;
                }
                self.state = GateState::Running;
            }
            GateState::Running => {}
        }

        let events = self.detector.observe(reading, now_ms);
        if let Some(lap_ms) = matched_lap(&events) {
            self.record_lap(lap_ms);
            self.state = GateState::CoolingDown { since_ms: now_ms };
        }

        Some(events)
    }

    /// Time left before sampling resumes, `None` when not cooling down
    pub fn cooldown_remaining_ms(&self, now_ms: u32) -> Option<u32> {
        match self.state {
            GateState::CoolingDown { since_ms } => {
                let delay = self.detector.config().after_detection_delay_ms as u32;
                let elapsed = now_ms.wrapping_sub(since_ms);
                if elapsed < delay {
                    Some(delay - elapsed)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn record_lap(&mut self, lap_ms: u32) {
        self.lap_count = self.lap_count.saturating_add(1);
        self.last_lap_ms = Some(lap_ms);

        if self.best_lap_ms.map_or(true, |best| lap_ms < best) {
            self.best_lap_ms = Some(lap_ms);
            info!("New best lap: {} ms (lap {})", lap_ms, self.lap_count);
        }
    }

    pub fn detector(&self) -> &TriggerDetector {
        &self.detector
    }

    pub fn lap_count(&self) -> u16 {
        self.lap_count
    }

    pub fn best_lap_ms(&self) -> Option<u32> {
        self.best_lap_ms
    }

    pub fn last_lap_ms(&self) -> Option<u32> {
        self.last_lap_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;

    const SAMPLE_MS: u32 = 100;

    /// window 4, detection 2, trigger 30%, 1 s cooldown
    fn gate() -> GateController {
        let config = DetectorConfig::new(4, 2, 30, 1000).unwrap();
        GateController::new(config).unwrap()
    }

    /// Feeds `count` samples, returns how many were used and any lap time
    fn run(
        gate: &mut GateController,
        value: i32,
        count: usize,
        clock: &mut u32,
    ) -> (usize, Option<u32>) {
        let mut used = 0;
        let mut lap = None;
        for _ in 0..count {
            if let Some(events) = gate.poll(value, *clock) {
                used += 1;
                lap = lap.or(matched_lap(&events));
            }
            *clock += SAMPLE_MS;
        }
        (used, lap)
    }

    #[test]
    fn test_stopped_gate_ignores_samples() {
        let mut gate = gate();
        assert!(!gate.is_running());
        assert!(gate.poll(100, 0).is_none());
    }

    #[test]
    fn test_lap_then_cooldown() {
        let mut gate = gate();
        let mut clock = 0;
        gate.start();

        run(&mut gate, 100, 4, &mut clock);
        let (_, lap) = run(&mut gate, 200, 2, &mut clock);
        assert_eq!(lap, None);

        let (_, lap) = run(&mut gate, 200, 2, &mut clock);
        assert_eq!(lap, Some(200));
        assert_eq!(gate.state(), GateState::CoolingDown { since_ms: 700 });

        // match at 700 ms, sampling resumes at 1700 ms
        assert_eq!(gate.cooldown_remaining_ms(800), Some(900));
        let (used, _) = run(&mut gate, 100, 9, &mut clock);
        assert_eq!(used, 0);
        assert_eq!(clock, 1700);

        let events = gate.poll(100, clock).unwrap();
        assert!(matches!(events[0], Event::Tracking { .. }));
        assert_eq!(gate.state(), GateState::Running);
    }

    #[test]
    fn test_lap_statistics() {
        let mut gate = gate();
        let mut clock = 0;
        gate.start();
        run(&mut gate, 100, 4, &mut clock);

        // three laps of 300, 200 and 400 ms
        for &gap in [1, 0, 2].iter() {
            run(&mut gate, 200, 2, &mut clock);
            run(&mut gate, 100, gap, &mut clock);
            run(&mut gate, 200, 2, &mut clock);
            clock += 1000;
        }

        assert_eq!(gate.lap_count(), 3);
        assert_eq!(gate.best_lap_ms(), Some(200));
        assert_eq!(gate.last_lap_ms(), Some(400));
        assert_eq!(gate.detector().last_matched_ms(), 400);
    }

    #[test]
    fn test_toggle_restarts_detector() {
        let mut gate = gate();
        let mut clock = 0;
        assert!(gate.toggle());
        run(&mut gate, 100, 4, &mut clock);
        assert!(gate.detector().is_calibrated());

        assert!(!gate.toggle());
        assert!(!gate.detector().is_calibrated());
        assert!(gate.poll(100, clock).is_none());

        assert!(gate.toggle());
        let events = gate.poll(100, clock).unwrap();
        assert_eq!(events[0], Event::Calibrating { filled: 1, total: 4 });
    }

    #[test]
    fn test_configure_ends_cooldown() {
        let mut gate = gate();
        let mut clock = 0;
        gate.start();
        run(&mut gate, 100, 4, &mut clock);
        run(&mut gate, 200, 4, &mut clock);
        assert!(gate.cooldown_remaining_ms(clock).is_some());

        let config = DetectorConfig::new(6, 3, 20, 500).unwrap();
        gate.configure(config).unwrap();

        assert_eq!(gate.state(), GateState::Running);
        assert_eq!(gate.lap_count(), 1);
        let events = gate.poll(100, clock).unwrap();
        assert_eq!(events[0], Event::Calibrating { filled: 1, total: 6 });
    }

    #[test]
    fn test_invalid_configure_is_ignored() {
        let mut gate = gate();
        let mut clock = 0;
        gate.start();
        run(&mut gate, 100, 4, &mut clock);

        let bad = DetectorConfig {
            detection_size: 0,
            ..DetectorConfig::default()
        };
        assert_eq!(gate.configure(bad), Err(ConfigError::DetectionSize(0)));
        assert!(gate.detector().is_calibrated());
        assert_eq!(gate.detector().config().window_size, 4);
    }

    #[test]
    fn test_configure_keeps_stopped_gate_stopped() {
        let mut gate = gate();
        gate.configure(DetectorConfig::default()).unwrap();
        assert_eq!(gate.state(), GateState::Stopped);
    }
}
