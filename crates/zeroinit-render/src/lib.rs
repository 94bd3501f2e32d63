//! wgpu backend for the zero-init oracle.
//!
//! [`GraphicsContext`] owns an adapter, device and queue, and implements
//! [`zeroinit_test_utils::TextureDevice`] so the oracle can run every case
//! against real hardware.
//!
//! Reads are implemented with buffer copies (optionally through an
//! intermediate texture), a compute shader that loads each texel, and a
//! full-screen draw that tests depth or stencil for equality. Storage and
//! blending reads report themselves as unsupported.

mod context;
mod context_impl;
pub mod features;
mod probe;
pub mod readback;

pub use context::{GraphicsContext, GraphicsContextDescriptor, GraphicsError};
pub use features::{FeatureSupportResult, GpuFeatures};
pub use readback::{ReadbackError, SubresourceReadback};
