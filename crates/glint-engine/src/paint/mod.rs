//! Color model shared between the shading reference and the renderers.
//!
//! Scope:
//! - straight-alpha linear RGBA (`Rgba`)
//! - the `blend` / `mix` / grayscale-as-alpha helpers every effect is built from

pub mod color;

pub use color::Rgba;
