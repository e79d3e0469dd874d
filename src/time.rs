//! Conversions between engine values and what the widgets display.

/// Upper bound of the seek slider.
pub const SLIDER_MAX: u16 = 1000;

/// Upper bound of the volume slider.
pub const VOLUME_MAX: u8 = 100;

/// Label shown when nothing has played yet or after stop.
pub const RESET_TIME_LABEL: &str = "00:00:00 / 00:00:00";

/// Format whole seconds as zero-padded `HH:MM:SS`.
pub fn format_hms(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// `current / total`, both as `HH:MM:SS`.
pub fn format_time_label(current: u64, total: u64) -> String {
    format!("{} / {}", format_hms(current), format_hms(total))
}

/// Engine milliseconds to whole seconds. The engine reports -1 when it
/// has nothing loaded.
pub fn ms_to_secs(ms: i64) -> u64 {
    if ms <= 0 {
        0
    } else {
        (ms / 1000) as u64
    }
}

/// Seek slider position to playback fraction.
pub fn slider_to_fraction(position: u16) -> f32 {
    (position.min(SLIDER_MAX) as f32 / SLIDER_MAX as f32).clamp(0.0, 1.0)
}

/// Playback fraction to seek slider position (truncating).
pub fn fraction_to_slider(fraction: f32) -> u16 {
    if !fraction.is_finite() {
        return 0;
    }
    let scaled = (fraction * SLIDER_MAX as f32) as i64;
    scaled.clamp(0, SLIDER_MAX as i64) as u16
}

/// Volume percent to the linear gain the audio sink expects.
pub fn volume_to_gain(percent: u8) -> f32 {
    percent.min(VOLUME_MAX) as f32 / VOLUME_MAX as f32
}
