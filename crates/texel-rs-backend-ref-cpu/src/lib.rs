//! Host reference engine for texel-rs.
//!
//! [`HostTextureStore`] keeps texture contents in host memory and
//! [`RefCpuEngine`] executes generated kernels against it, one output texel at
//! a time. Both exist to check kernels for correctness, not for speed.

mod engine;
mod store;

pub use engine::RefCpuEngine;
pub use store::{decode_texels, encode_texels, HostTextureStore};
