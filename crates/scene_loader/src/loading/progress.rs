use std::time::Duration;

/// Handle progress at which an async load parks while activation is withheld.
pub const ACTIVATION_WITHHELD_PROGRESS: f32 = 0.9;

/// Position of `value` between `a` and `b`, clamped to `[0, 1]`.
///
/// Returns 0 for an empty range or a non-finite result.
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if a == b {
        return 0.0;
    }
    let t = (value - a) / (b - a);
    if !t.is_finite() {
        return 0.0;
    }
    t.clamp(0.0, 1.0)
}

/// Rescales withheld-activation handle progress (`0..=0.9`) onto `0..=1`.
pub fn real_progress(handle_progress: f32) -> f32 {
    inverse_lerp(0.0, ACTIVATION_WITHHELD_PROGRESS, handle_progress)
}

/// Presentation progress for one tick.
///
/// With a zero floor this is the real progress. Otherwise it is the smaller
/// of real progress and `elapsed / minimum_display_time`, so it reaches 1.0
/// only once the load is done and the floor has elapsed.
pub fn blend_progress(
    handle_progress: f32,
    elapsed: Duration,
    minimum_display_time: Duration,
) -> f32 {
    let real = real_progress(handle_progress);
    if minimum_display_time.is_zero() {
        return real;
    }
    let fake = inverse_lerp(
        0.0,
        minimum_display_time.as_secs_f32(),
        elapsed.as_secs_f32(),
    );
    real.min(fake)
}
