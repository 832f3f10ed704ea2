//! Time-based interpolation of a value toward a target.

use super::Easing;

/// Values a [`Tween`] can interpolate.
pub trait Interpolate: Copy {
    /// Value at progress `t` between `self` (0) and `to` (1).
    fn interpolate(&self, to: &Self, t: f32) -> Self;
}

impl Interpolate for f32 {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

impl<const N: usize> Interpolate for [f32; N] {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        std::array::from_fn(|i| self[i].interpolate(&to[i], t))
    }
}

/// Interpolates from a start value to a target over a fixed duration.
///
/// Tweens are advanced explicitly with [`Tween::advance`]; they own no clock.
#[derive(Debug, Clone)]
pub struct Tween<T: Interpolate> {
    from: T,
    to: T,
    duration: f32,
    elapsed: f32,
    easing: Easing,
}

impl<T: Interpolate> Tween<T> {
    /// Tween from `from` to `to` over `duration` seconds with [`Easing::QuadOut`].
    pub fn new(from: T, to: T, duration: f32) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            elapsed: 0.0,
            easing: Easing::default(),
        }
    }

    /// Replace the easing curve.
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Normalized progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }

    /// Move time forward by `dt` seconds and return the new value.
    pub fn advance(&mut self, dt: f32) -> T {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed = (self.elapsed + dt).min(self.duration);
        }
        self.value()
    }

    /// Current value.
    pub fn value(&self) -> T {
        self.from.interpolate(&self.to, self.easing.apply(self.progress()))
    }

    /// Whether the target has been reached.
    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> T {
        self.to
    }

    /// Easing curve.
    #[inline]
    pub fn easing(&self) -> Easing {
        self.easing
    }

    /// Restart toward `to` from the current value, keeping duration and easing.
    pub fn retarget(&mut self, to: T) {
        self.from = self.value();
        self.to = to;
        self.elapsed = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaches_target_after_duration() {
        let mut tween = Tween::new(0.0f32, 1.0, 0.3);
        tween.advance(0.1);
        assert!(!tween.is_finished());
        tween.advance(0.25);
        assert!(tween.is_finished());
        assert_eq!(tween.value(), 1.0);
    }

    #[test]
    fn test_quad_out_midpoint() {
        let mut tween = Tween::new([0.0f32, 0.0], [2.0, -4.0], 1.0);
        let v = tween.advance(0.5);
        assert_eq!(v, [1.5, -3.0]);
    }

    #[test]
    fn test_linear_easing() {
        let mut tween = Tween::new(10.0f32, 20.0, 2.0).with_easing(Easing::Linear);
        assert_eq!(tween.advance(1.0), 15.0);
    }

    #[test]
    fn test_retarget_starts_from_current_value() {
        let mut tween = Tween::new(0.0f32, 1.0, 1.0).with_easing(Easing::Linear);
        tween.advance(0.5);
        tween.retarget(-1.0);
        assert_eq!(tween.value(), 0.5);
        assert_eq!(tween.target(), -1.0);
        assert!(!tween.is_finished());
        tween.advance(1.0);
        assert_eq!(tween.value(), -1.0);
    }

    #[test]
    fn test_zero_duration_is_immediate() {
        let tween = Tween::new(0.0f32, 3.0, 0.0);
        assert!(tween.is_finished());
        assert_eq!(tween.value(), 3.0);
    }

    #[test]
    fn test_ignores_negative_time() {
        let mut tween = Tween::new(0.0f32, 1.0, 1.0);
        tween.advance(-5.0);
        tween.advance(f32::NAN);
        assert_eq!(tween.progress(), 0.0);
    }
}
