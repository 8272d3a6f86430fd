//! Sampling shared by every track implementation

use super::keyframe::{Interpolation, Keyframe, TrackValue, hermite};

/// Map `time` into `[start, end]`
///
/// Looping wraps modulo the duration, moving negative remainders forward.
/// Clamping saturates at either end. An empty or inverted range yields
/// `start`.
pub fn wrap_time(time: f32, start: f32, end: f32, looping: bool) -> f32 {
    let duration = end - start;
    if duration <= 0.0 {
        return start;
    }

    if looping {
        let mut offset = (time - start) % duration;
        if offset < 0.0 {
            offset += duration;
        }
        offset + start
    } else {
        time.clamp(start, end)
    }
}

/// Index of the last keyframe at or before `time`, capped so that a
/// following keyframe always exists
///
/// Requires at least two keyframes sorted by time.
pub fn search_frame_index<T>(keyframes: &[Keyframe<T>], time: f32) -> usize {
    let last = keyframes.len().saturating_sub(2);
    let at_or_before = keyframes.partition_point(|frame| frame.time <= time);
    at_or_before.saturating_sub(1).min(last)
}

/// Read access to a keyframe track
///
/// Implementors only decide how a frame index is found. Time remapping and
/// interpolation are provided here so every implementation samples
/// identically.
pub trait TrackSampler<T: TrackValue> {
    fn keyframes(&self) -> &[Keyframe<T>];

    fn interpolation(&self) -> Interpolation;

    /// Index of the keyframe that starts the segment containing `time`
    ///
    /// Only called on valid tracks with `time` already inside the track's
    /// domain. Must not exceed `keyframes().len() - 2`.
    fn frame_index(&self, time: f32) -> usize;

    /// A track needs two keyframes before it can be sampled
    fn is_valid(&self) -> bool {
        self.keyframes().len() > 1
    }

    fn start_time(&self) -> f32 {
        self.keyframes().first().map_or(0.0, |frame| frame.time)
    }

    fn end_time(&self) -> f32 {
        self.keyframes().last().map_or(0.0, |frame| frame.time)
    }

    fn duration(&self) -> f32 {
        self.end_time() - self.start_time()
    }

    /// Remap `time` into this track's domain
    fn adjust_time(&self, time: f32, looping: bool) -> f32 {
        wrap_time(time, self.start_time(), self.end_time(), looping)
    }

    /// Sample the track
    ///
    /// Invalid tracks and zero-length segments return [`TrackValue::DEFAULT`].
    fn sample(&self, time: f32, looping: bool) -> T {
        let keyframes = self.keyframes();
        if keyframes.len() < 2 {
            return T::DEFAULT;
        }

        let time = self.adjust_time(time, looping);
        let index = self.frame_index(time).min(keyframes.len() - 2);
        let this = &keyframes[index];
        let next = &keyframes[index + 1];

        if self.interpolation() == Interpolation::Constant {
            return this.value.finalize();
        }

        let span = next.time - this.time;
        if span <= 0.0 {
            return T::DEFAULT;
        }
        let t = (time - this.time) / span;

        match self.interpolation() {
            Interpolation::Cubic => hermite(
                t,
                this.value,
                this.out_tangent * span,
                next.value,
                next.in_tangent * span,
            ),
            _ => T::interpolate(this.value, next.value, t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_time_clamp() {
        assert_eq!(wrap_time(-1.0, 0.0, 2.0, false), 0.0);
        assert_eq!(wrap_time(5.0, 0.0, 2.0, false), 2.0);
        assert_eq!(wrap_time(1.5, 0.0, 2.0, false), 1.5);
    }

    #[test]
    fn test_wrap_time_loop() {
        assert!((wrap_time(2.5, 0.0, 2.0, true) - 0.5).abs() < 1e-6);
        assert!((wrap_time(-0.5, 0.0, 2.0, true) - 1.5).abs() < 1e-6);
        assert!((wrap_time(4.5, 1.0, 3.0, true) - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_wrap_time_empty_range() {
        assert_eq!(wrap_time(3.0, 1.0, 1.0, true), 1.0);
        assert_eq!(wrap_time(3.0, 1.0, 1.0, false), 1.0);
    }

    #[test]
    fn test_search_frame_index() {
        let frames: Vec<Keyframe<f32>> = [0.0, 1.0, 2.0, 4.0]
            .iter()
            .map(|&t| Keyframe::new(t, t))
            .collect();

        assert_eq!(search_frame_index(&frames, -1.0), 0);
        assert_eq!(search_frame_index(&frames, 0.0), 0);
        assert_eq!(search_frame_index(&frames, 0.99), 0);
        assert_eq!(search_frame_index(&frames, 1.0), 1);
        assert_eq!(search_frame_index(&frames, 3.0), 2);
        // never points at the final keyframe
        assert_eq!(search_frame_index(&frames, 4.0), 2);
        assert_eq!(search_frame_index(&frames, 10.0), 2);
    }
}
