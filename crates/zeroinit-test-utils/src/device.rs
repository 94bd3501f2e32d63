//! Trait abstracting the texture operations a zero-init check needs.
//!
//! The `TextureDevice` trait is the whole surface the oracle touches: create
//! a texture, submit a batch of writes, read one subresource back, destroy it.
//! Both the wgpu context and the in-memory `SoftDevice` implement it.

use std::fmt;
use std::ops::Range;

use wgpu::{TextureAspect, TextureDescriptor};
use zeroinit_core::{ReadMethod, TexelComponents};

use crate::gpu_types::GpuTexture;

/// One write recorded into a submission.
///
/// Every command covers whole subresources and writes the same value to every
/// texel, which is all the zero-init test ever does.
#[derive(Debug, Clone, PartialEq)]
pub enum TextureCommand {
    /// Upload `value` to `layers` of mip `level` with a buffer-to-texture copy.
    CopyFill {
        level: u32,
        layers: Range<u32>,
        value: TexelComponents,
    },
    /// Render pass over one subresource that clears to `value` and stores.
    ClearFill {
        level: u32,
        layer: u32,
        value: TexelComponents,
    },
    /// Render pass over one subresource that loads and discards.
    Discard { level: u32, layer: u32 },
}

/// Which subresource to observe and how.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadRequest {
    pub level: u32,
    pub layer: u32,
    pub method: ReadMethod,
    /// Aspect to read. Copies need a single aspect.
    pub aspect: TextureAspect,
    /// Value compared against by depth and stencil tests.
    pub reference: TexelComponents,
}

/// What a read returned.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// Tightly packed texels in the format's native layout.
    Bytes(Vec<u8>),
    /// Shader-visible RGBA per texel, and per sample when multisampled.
    Texels(Vec<[f64; 4]>),
    /// Per-texel result of an equality test against the reference.
    Comparisons(Vec<bool>),
}

impl Observation {
    pub fn kind(&self) -> &'static str {
        match self {
            Observation::Bytes(_) => "bytes",
            Observation::Texels(_) => "texels",
            Observation::Comparisons(_) => "comparisons",
        }
    }
}

/// Errors reported by a [`TextureDevice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The device cannot run this combination of format, usage and features.
    Unsupported { reason: String },
    /// Allocation failed.
    OutOfMemory { requested: u64 },
    /// The device rejected a call.
    Validation(String),
    /// Mapping a readback buffer failed.
    MapFailed(String),
    /// The handle was not created by this device, or was already destroyed.
    UnknownTexture(usize),
}

impl DeviceError {
    pub fn unsupported(reason: impl Into<String>) -> Self {
        DeviceError::Unsupported {
            reason: reason.into(),
        }
    }

    /// Errors that end a case as skipped rather than failed.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            DeviceError::Unsupported { .. } | DeviceError::OutOfMemory { .. }
        )
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::Unsupported { reason } => write!(f, "Unsupported: {}", reason),
            DeviceError::OutOfMemory { requested } => {
                write!(f, "Out of memory allocating {} bytes", requested)
            }
            DeviceError::Validation(msg) => write!(f, "Validation error: {}", msg),
            DeviceError::MapFailed(msg) => write!(f, "Failed to map buffer: {}", msg),
            DeviceError::UnknownTexture(id) => write!(f, "Unknown texture {}", id),
        }
    }
}

impl std::error::Error for DeviceError {}

/// Texture operations used by the zero-init oracle.
///
/// Methods take `&self` and hand out owned [`GpuTexture`] handles, so one
/// device can be shared across cases behind an `Arc` and used as
/// `&dyn TextureDevice`.
pub trait TextureDevice: Send + Sync {
    /// Human-readable adapter name, for logs.
    fn adapter_name(&self) -> String;

    /// Fail with [`DeviceError::Unsupported`] if `desc` cannot be created or
    /// read back with `method` on this device.
    fn check_support(
        &self,
        desc: &TextureDescriptor<'_>,
        method: ReadMethod,
    ) -> Result<(), DeviceError>;

    fn create_texture(&self, desc: &TextureDescriptor<'_>) -> Result<GpuTexture, DeviceError>;

    /// Encode `commands` in order and submit them as one batch. Returns once
    /// the work is visible to later reads.
    fn submit(&self, texture: &GpuTexture, commands: &[TextureCommand]) -> Result<(), DeviceError>;

    /// Read one subresource. Blocks until the data is on the host.
    fn read(&self, texture: &GpuTexture, request: &ReadRequest) -> Result<Observation, DeviceError>;

    fn destroy_texture(&self, texture: &GpuTexture);

    /// Best-effort release of cached allocations after an out-of-memory error.
    fn reclaim(&self) {}
}
