//! CPU texture storage: the RGBA and grayscale arrays, image loading and
//! procedural noise.

mod noise;
mod store;

pub use noise::{NoiseConfig, generate_noise};
pub use store::{StoreError, TextureStore, TextureStoreConfig};
