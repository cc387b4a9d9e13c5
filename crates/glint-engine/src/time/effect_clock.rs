use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Seconds since the previous tick, after clamping.
    pub dt: f32,

    /// Effect time fed to the `t` uniform.
    pub t: f32,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Clock producing the effect time `t`.
///
/// `tick()` follows wall time for interactive hosts; `advance()` steps by a
/// fixed delta for offline rendering and tests. Both clamp `dt` so a stall
/// (debugger, minimized window) does not make effects jump.
#[derive(Debug, Clone)]
pub struct EffectClock {
    last: Instant,
    t: f64,
    frame_index: u64,
    speed: f32,
    dt_min: Duration,
    dt_max: Duration,
    wrap: Option<f64>,
}

impl EffectClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            t: 0.0,
            frame_index: 0,
            speed: 1.0,
            dt_min: Duration::from_micros(100),
            dt_max: Duration::from_millis(250),
            wrap: None,
        }
    }

    /// Starts at a given effect time instead of zero.
    pub fn starting_at(t: f32) -> Self {
        Self { t: t as f64, ..Self::new() }
    }

    pub fn with_clamps(mut self, dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        self.dt_min = dt_min;
        self.dt_max = dt_max;
        self
    }

    /// Multiplier applied to `dt` before it is added to `t`.
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Wraps `t` into `[0, period)` to keep `f32` precision over long sessions.
    pub fn with_wrap(mut self, period: f32) -> Self {
        self.wrap = (period > 0.0).then_some(period as f64);
        self
    }

    #[inline]
    pub fn t(&self) -> f32 {
        self.t as f32
    }

    /// Resets the wall-clock baseline without touching `t`.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Advances by the wall time elapsed since the previous tick.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last);
        self.last = now;
        self.step(dt)
    }

    /// Advances by a fixed `dt` in seconds.
    pub fn advance(&mut self, dt: f32) -> FrameTime {
        let dt = if dt.is_finite() && dt > 0.0 { Duration::from_secs_f32(dt) } else { Duration::ZERO };
        self.step(dt)
    }

    fn step(&mut self, dt: Duration) -> FrameTime {
        let dt = dt.clamp(self.dt_min, self.dt_max).as_secs_f32();

        self.t += (dt * self.speed) as f64;
        if let Some(period) = self.wrap {
            self.t = self.t.rem_euclid(period);
        }

        let ft = FrameTime { dt, t: self.t as f32, frame_index: self.frame_index };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for EffectClock {
    fn default() -> Self {
        Self::new()
    }
}
