//! Detector configuration
//!
//! Parameters arrive either from compile-time defaults or as postcard frames
//! from the configuration surface. Every path goes through [`DetectorConfig::validate`]
//! so an out-of-range value never reaches the detector.

use core::fmt;
use core::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Storage reserved for the baseline window
pub const MAX_WINDOW_SIZE: usize = 256;

/// Storage reserved for the detection window
pub const MAX_DETECTION_SIZE: usize = 64;

/// Accepted trigger threshold, percent
pub const PERCENT_DIFF_TRIGGER_RANGE: RangeInclusive<u8> = 1..=99;

/// Accepted cooldown after a match, milliseconds
pub const AFTER_DETECTION_DELAY_RANGE: RangeInclusive<u16> = 500..=3000;

/// Tunable parameters of the trigger detector
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Number of samples averaged into the baseline
    pub window_size: u16,
    /// Number of samples that must deviate before a crossing is confirmed
    pub detection_size: u16,
    /// Deviation from the baseline (percent) that arms a detection
    pub percent_diff_trigger: u8,
    /// Pause in sampling after a match (ms), applied by the caller
    pub after_detection_delay_ms: u16,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window_size: 20,
            detection_size: 5,
            percent_diff_trigger: 30,
            after_detection_delay_ms: 1000,
        }
    }
}

impl DetectorConfig {
    /// Build a validated configuration
    pub fn new(
        window_size: u16,
        detection_size: u16,
        percent_diff_trigger: u8,
        after_detection_delay_ms: u16,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            window_size,
            detection_size,
            percent_diff_trigger,
            after_detection_delay_ms,
        };
        config.validate()?;

        Ok(config)
    }

    /// Decode a parameter update frame and validate it
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Decode)?;
        config.validate()?;

        Ok(config)
    }

    /// Encode into a parameter update frame
    pub fn to_slice<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], postcard::Error> {
        postcard::to_slice(self, buf)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let window = self.window_size as usize;
        if window < 1 || window > MAX_WINDOW_SIZE {
            return Err(ConfigError::WindowSize(self.window_size));
        }

        let detection = self.detection_size as usize;
        if detection < 1 || detection > MAX_DETECTION_SIZE {
            return Err(ConfigError::DetectionSize(self.detection_size));
        }

        if !PERCENT_DIFF_TRIGGER_RANGE.contains(&self.percent_diff_trigger) {
            return Err(ConfigError::PercentDiffTrigger(self.percent_diff_trigger));
        }

        if !AFTER_DETECTION_DELAY_RANGE.contains(&self.after_detection_delay_ms) {
            return Err(ConfigError::AfterDetectionDelay(
                self.after_detection_delay_ms,
            ));
        }

        Ok(())
    }
}

/// Configuration errors
///
/// Carries the offending value so the configuration surface can report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    WindowSize(u16),
    DetectionSize(u16),
    PercentDiffTrigger(u8),
    AfterDetectionDelay(u16),
    /// Update frame could not be decoded
    Decode,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::WindowSize(v) => {
                write!(f, "window size {} outside 1..={}", v, MAX_WINDOW_SIZE)
            }
            ConfigError::DetectionSize(v) => {
                write!(f, "detection size {} outside 1..={}", v, MAX_DETECTION_SIZE)
            }
            ConfigError::PercentDiffTrigger(v) => write!(
                f,
                "percent diff trigger {} outside {}..={}",
                v,
                PERCENT_DIFF_TRIGGER_RANGE.start(),
                PERCENT_DIFF_TRIGGER_RANGE.end()
            ),
            ConfigError::AfterDetectionDelay(v) => write!(
                f,
                "after detection delay {} ms outside {}..={}",
                v,
                AFTER_DETECTION_DELAY_RANGE.start(),
                AFTER_DETECTION_DELAY_RANGE.end()
            ),
            ConfigError::Decode => write!(f, "malformed configuration frame"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(DetectorConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_range_bounds_accepted() {
        assert!(DetectorConfig::new(1, 1, 1, 500).is_ok());
        assert!(
            DetectorConfig::new(MAX_WINDOW_SIZE as u16, MAX_DETECTION_SIZE as u16, 99, 3000)
                .is_ok()
        );
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert_eq!(
            DetectorConfig::new(0, 5, 30, 1000),
            Err(ConfigError::WindowSize(0))
        );
        assert_eq!(
            DetectorConfig::new(MAX_WINDOW_SIZE as u16 + 1, 5, 30, 1000),
            Err(ConfigError::WindowSize(MAX_WINDOW_SIZE as u16 + 1))
        );
        assert_eq!(
            DetectorConfig::new(20, 0, 30, 1000),
            Err(ConfigError::DetectionSize(0))
        );
        assert_eq!(
            DetectorConfig::new(20, 5, 0, 1000),
            Err(ConfigError::PercentDiffTrigger(0))
        );
        assert_eq!(
            DetectorConfig::new(20, 5, 100, 1000),
            Err(ConfigError::PercentDiffTrigger(100))
        );
        assert_eq!(
            DetectorConfig::new(20, 5, 30, 499),
            Err(ConfigError::AfterDetectionDelay(499))
        );
        assert_eq!(
            DetectorConfig::new(20, 5, 30, 3001),
            Err(ConfigError::AfterDetectionDelay(3001))
        );
    }

    #[test]
    fn test_frame_decode() {
        let config = DetectorConfig::new(40, 8, 25, 2000).unwrap();
        let mut buf = [0u8; 16];
        let frame = config.to_slice(&mut buf).unwrap();

        assert_eq!(DetectorConfig::from_bytes(frame), Ok(config));
    }

    #[test]
    fn test_frame_with_invalid_values_rejected() {
        let bogus = DetectorConfig {
            percent_diff_trigger: 150,
            ..DetectorConfig::default()
        };
        let mut buf = [0u8; 16];
        let frame = bogus.to_slice(&mut buf).unwrap();

        assert_eq!(
            DetectorConfig::from_bytes(frame),
            Err(ConfigError::PercentDiffTrigger(150))
        );
    }

    #[test]
    fn test_truncated_frame_rejected() {
        assert_eq!(DetectorConfig::from_bytes(&[]), Err(ConfigError::Decode));
    }
}
