//! Events emitted by the trigger detector

use core::fmt;

use heapless::{consts::U3, Vec};
use serde::{Deserialize, Serialize};

/// Outcome of one sampling cycle, as seen by logging and transport
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// Baseline still filling up
    Calibrating { filled: u16, total: u16 },
    /// Baseline full, sample within the threshold
    Tracking { baseline_average: i32, percent_diff: i32 },
    /// Sample deviated enough to start a detection attempt
    DetectionStarted,
    /// Detection window filling up
    DetectionProgress { filled: u16, total: u16 },
    /// Detection window full and evaluated
    DetectionResult { is_trigger: bool, armed_first: bool },
    /// Second confirmed crossing completed a lap
    Match { elapsed_ms: u32 },
}

impl Event {
    pub fn is_match(&self) -> bool {
        matches!(self, Event::Match { .. })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Calibrating { filled, total } => write!(f, "calibrating {}/{}", filled, total),
            Event::Tracking {
                baseline_average,
                percent_diff,
            } => write!(f, "baseline {} ({}%)", baseline_average, percent_diff),
            Event::DetectionStarted => write!(f, "detection started"),
            Event::DetectionProgress { filled, total } => {
                write!(f, "detecting {}/{}", filled, total)
            }
            Event::DetectionResult {
                is_trigger: false, ..
            } => write!(f, "no trigger"),
            Event::DetectionResult {
                armed_first: true, ..
            } => write!(f, "trigger, waiting for second"),
            Event::DetectionResult { .. } => write!(f, "trigger"),
            Event::Match { elapsed_ms } => write!(f, "match {} ms", elapsed_ms),
        }
    }
}

/// Events of one cycle, in emission order
///
/// Usually a single event. The cycle that fills the detection window reports
/// its `DetectionResult`, followed by `Match` when it completes a lap, and a
/// one-sample detection window also reports `DetectionStarted` first.
pub type Events = Vec<Event, U3>;

/// Lap time carried by a list of events, if any
pub fn matched_lap(events: &Events) -> Option<u32> {
    events.iter().find_map(|event| match event {
        Event::Match { elapsed_ms } => Some(*elapsed_ms),
        _ => None,
    })
}

pub(crate) fn single(event: Event) -> Events {
    let mut events = Events::new();
    push(&mut events, event);
    events
}

pub(crate) fn push(events: &mut Events, event: Event) {
    // a cycle emits at most three events
    events.push(event).ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matched_lap() {
        let mut events = single(Event::DetectionResult {
            is_trigger: true,
            armed_first: false,
        });
        assert_eq!(matched_lap(&events), None);

        push(&mut events, Event::Match { elapsed_ms: 4210 });
        assert_eq!(matched_lap(&events), Some(4210));
        assert!(events[1].is_match());
        assert!(!events[0].is_match());
    }
}
