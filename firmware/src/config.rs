use lapgate::DetectorConfig;

/// Detector configuration with compile-time overrides
///
/// ```bash
/// export LAPGATE_WINDOW_SIZE=40
/// export LAPGATE_DETECTION_SIZE=6
/// export LAPGATE_PERCENT_DIFF_TRIGGER=25
/// export LAPGATE_AFTER_DETECTION_DELAY_MS=1500
/// cargo build --release
/// ```
///
/// Unparsable values are skipped, range checks happen when the controller is
/// built.
pub fn from_env() -> DetectorConfig {
    let mut config = DetectorConfig::default();

    if let Some(v) = option_env!("LAPGATE_WINDOW_SIZE").and_then(|s| s.parse().ok()) {
        config.window_size = v;
    }
    if let Some(v) = option_env!("LAPGATE_DETECTION_SIZE").and_then(|s| s.parse().ok()) {
        config.detection_size = v;
    }
    if let Some(v) = option_env!("LAPGATE_PERCENT_DIFF_TRIGGER").and_then(|s| s.parse().ok()) {
        config.percent_diff_trigger = v;
    }
    if let Some(v) = option_env!("LAPGATE_AFTER_DETECTION_DELAY_MS").and_then(|s| s.parse().ok()) {
        config.after_detection_delay_ms = v;
    }

    config
}
