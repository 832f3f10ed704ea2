//! Frame scheduling with an explicit stop condition.
//!
//! The driver does not own a timer: on the web each `requestAnimationFrame`
//! callback calls [`FrameDriver::tick`] and reschedules while it returns
//! [`LoopControl::Continue`]; natively [`FrameDriver::run`] loops directly.

use crate::core::Clock;

/// Something rendered once per frame.
pub trait FrameTarget {
    /// Advance by `delta` seconds and draw.
    fn frame(&mut self, delta: f64);
}

/// Decides when the frame loop ends.
pub trait StopCondition {
    /// Whether to stop before running frame number `frame` (zero-based).
    fn should_stop(&mut self, frame: u64) -> bool;
}

/// Never stops; the page lifetime bounds the loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunForever;

impl StopCondition for RunForever {
    fn should_stop(&mut self, _frame: u64) -> bool {
        false
    }
}

/// Stops after a fixed number of frames.
#[derive(Debug, Clone, Copy)]
pub struct StopAfter(pub u64);

impl StopCondition for StopAfter {
    fn should_stop(&mut self, frame: u64) -> bool {
        frame >= self.0
    }
}

/// Stops when the closure returns `true`.
pub struct StopWhen<F>(pub F);

impl<F: FnMut(u64) -> bool> StopCondition for StopWhen<F> {
    fn should_stop(&mut self, frame: u64) -> bool {
        (self.0)(frame)
    }
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    /// Schedule another frame.
    Continue,
    /// The stop condition fired; do not reschedule.
    Stop,
}

/// Runs frames until its [`StopCondition`] fires.
pub struct FrameDriver<S: StopCondition = RunForever> {
    clock: Clock,
    stop: S,
    frames: u64,
    stopped: bool,
}

impl FrameDriver<RunForever> {
    /// A driver that never stops.
    pub fn forever() -> Self {
        Self::new(RunForever)
    }
}

impl<S: StopCondition> FrameDriver<S> {
    /// Create a driver with `stop` as its stop condition.
    pub fn new(stop: S) -> Self {
        Self {
            clock: Clock::new(),
            stop,
            frames: 0,
            stopped: false,
        }
    }

    /// Run one frame using the clock's delta.
    pub fn tick<T: FrameTarget + ?Sized>(&mut self, target: &mut T) -> LoopControl {
        if self.stopped {
            return LoopControl::Stop;
        }
        let delta = self.clock.get_delta();
        self.tick_with_delta(target, delta)
    }

    /// Run one frame with an explicit delta.
    pub fn tick_with_delta<T: FrameTarget + ?Sized>(&mut self, target: &mut T, delta: f64) -> LoopControl {
        if self.stopped || self.stop.should_stop(self.frames) {
            self.stopped = true;
            return LoopControl::Stop;
        }
        target.frame(delta);
        self.frames += 1;
        LoopControl::Continue
    }

    /// Tick until the stop condition fires. Returns the number of frames run.
    ///
    /// With [`RunForever`] this never returns.
    pub fn run<T: FrameTarget + ?Sized>(&mut self, target: &mut T) -> u64 {
        while self.tick(target) == LoopControl::Continue {}
        self.frames
    }

    /// Frames run so far.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Whether the stop condition has fired.
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        deltas: Vec<f64>,
    }

    impl FrameTarget for Recorder {
        fn frame(&mut self, delta: f64) {
            self.deltas.push(delta);
        }
    }

    #[test]
    fn test_stop_after_runs_exact_count() {
        let mut target = Recorder::default();
        let mut driver = FrameDriver::new(StopAfter(5));
        assert_eq!(driver.run(&mut target), 5);
        assert_eq!(target.deltas.len(), 5);
        assert!(driver.is_stopped());
        assert_eq!(driver.tick(&mut target), LoopControl::Stop);
        assert_eq!(target.deltas.len(), 5);
    }

    #[test]
    fn test_first_delta_is_zero() {
        let mut target = Recorder::default();
        let mut driver = FrameDriver::new(StopAfter(1));
        driver.run(&mut target);
        assert_eq!(target.deltas, vec![0.0]);
    }

    #[test]
    fn test_stop_when_closure() {
        let mut target = Recorder::default();
        let mut driver = FrameDriver::new(StopWhen(|frame| frame == 3));
        assert_eq!(driver.run(&mut target), 3);
    }

    #[test]
    fn test_explicit_deltas_are_forwarded() {
        let mut target = Recorder::default();
        let mut driver = FrameDriver::forever();
        for _ in 0..3 {
            assert_eq!(driver.tick_with_delta(&mut target, 0.016), LoopControl::Continue);
        }
        assert_eq!(driver.frames(), 3);
        assert_eq!(target.deltas, vec![0.016; 3]);
        assert!(!driver.is_stopped());
    }

    #[test]
    fn test_zero_budget_runs_nothing() {
        let mut target = Recorder::default();
        assert_eq!(FrameDriver::new(StopAfter(0)).run(&mut target), 0);
        assert!(target.deltas.is_empty());
    }
}
