//! Frame clock.

#[cfg(all(feature = "web", target_arch = "wasm32"))]
use web_sys::window;

#[cfg(not(all(feature = "web", target_arch = "wasm32")))]
use std::time::Instant;

/// Measures time between frames.
///
/// The clock starts lazily: the first [`Clock::get_delta`] call starts it and
/// returns zero, so the first frame never sees a huge delta.
pub struct Clock {
    running: bool,
    old_time: f64,
    elapsed_time: f64,

    #[cfg(not(all(feature = "web", target_arch = "wasm32")))]
    origin: Instant,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    /// Create a stopped clock.
    pub fn new() -> Self {
        Self {
            running: false,
            old_time: 0.0,
            elapsed_time: 0.0,
            #[cfg(not(all(feature = "web", target_arch = "wasm32")))]
            origin: Instant::now(),
        }
    }

    /// Current time in seconds.
    fn now(&self) -> f64 {
        #[cfg(all(feature = "web", target_arch = "wasm32"))]
        {
            window()
                .and_then(|w| w.performance())
                .map(|p| p.now() / 1000.0)
                .unwrap_or(0.0)
        }

        #[cfg(not(all(feature = "web", target_arch = "wasm32")))]
        {
            self.origin.elapsed().as_secs_f64()
        }
    }

    /// Start (or restart) the clock.
    pub fn start(&mut self) {
        self.old_time = self.now();
        self.elapsed_time = 0.0;
        self.running = true;
    }

    /// Stop the clock, keeping the accumulated elapsed time.
    pub fn stop(&mut self) {
        self.get_delta();
        self.running = false;
    }

    /// Seconds since the previous call. Starts the clock if it is stopped.
    pub fn get_delta(&mut self) -> f64 {
        if !self.running {
            self.start();
            return 0.0;
        }

        let new_time = self.now();
        let diff = (new_time - self.old_time).max(0.0);
        self.old_time = new_time;
        self.elapsed_time += diff;
        diff
    }

    /// Seconds accumulated while running.
    #[inline]
    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    /// Check if the clock is running.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }
}
