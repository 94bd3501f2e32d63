//! Test utilities for zeroinit.
//!
//! This crate provides the device seam of the zero-init oracle: the
//! [`TextureDevice`] trait, owned texture handles, and an in-memory reference
//! device for running checks without a GPU.
//!
//! # Overview
//!
//! - [`TextureDevice`] - Trait abstracting texture creation, writes and reads
//! - [`GpuTexture`] - Owned texture handle, real or mock
//! - `SoftDevice` - In-memory implementation with fault injection (requires `mock` feature)
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "mock")]
//! # {
//! use zeroinit_core::{ReadMethod, TexelComponents};
//! use zeroinit_test_utils::{Observation, ReadRequest, SoftDevice, TextureDevice};
//! use wgpu::*;
//!
//! let device = SoftDevice::new();
//! let texture = device
//!     .create_texture(&TextureDescriptor {
//!         label: None,
//!         size: Extent3d { width: 2, height: 2, depth_or_array_layers: 1 },
//!         mip_level_count: 1,
//!         sample_count: 1,
//!         dimension: TextureDimension::D2,
//!         format: TextureFormat::R8Unorm,
//!         usage: TextureUsages::COPY_SRC,
//!         view_formats: &[],
//!     })
//!     .unwrap();
//!
//! let read = ReadRequest {
//!     level: 0,
//!     layer: 0,
//!     method: ReadMethod::CopyToBuffer,
//!     aspect: TextureAspect::All,
//!     reference: TexelComponents::ZERO,
//! };
//! assert_eq!(device.read(&texture, &read).unwrap(), Observation::Bytes(vec![0; 4]));
//! # }
//! ```

pub mod device;
pub mod gpu_types;
#[cfg(feature = "mock")]
pub mod soft_device;

pub use device::*;
pub use gpu_types::*;
#[cfg(feature = "mock")]
pub use soft_device::*;
