//! Effect timing.
//!
//! The shaders animate glow, noise scroll and wavy tint from a single `t`
//! uniform. `EffectClock` owns that value so every renderer in a frame sees the
//! same `t`.

mod effect_clock;

pub use effect_clock::{EffectClock, FrameTime};
