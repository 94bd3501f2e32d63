//! Texture zero-initialization conformance oracle.
//!
//! Every subresource of a texture must read as zero until it is written. This
//! crate enumerates the texture shapes, formats and read paths that promise
//! covers ([`texture_zero_cases`]), and checks each one against a
//! [`TextureDevice`](zeroinit_test_utils::TextureDevice): a few subresources
//! are left uninitialized (or written and then discarded) and must read as
//! zero, while the rest are written with canary data and must keep it.
//!
//! # Example
//!
//! ```rust
//! use zeroinit::{Runner, RunnerConfig, texture_zero_cases};
//! use zeroinit_test_utils::SoftDevice;
//!
//! let device = SoftDevice::new();
//! let config = RunnerConfig::new().filter("read_method=CopyToBuffer;format=R8Unorm;");
//! let report = Runner::new(&device, config).run(texture_zero_cases());
//! assert!(report.passed > 0);
//! assert!(report.is_success());
//! ```
//!
//! With the `render` feature (on by default) the same cases run on a real
//! adapter through [`GraphicsContext`].

pub mod config;
pub mod oracle;
pub mod outcome;
pub mod params;
pub mod partition;
pub mod runner;
pub mod state;

pub use config::RunnerConfig;
pub use oracle::{CaseError, CasePhase, ZeroInitCase, run_case};
pub use outcome::{Failure, MAX_REPORTED_MISMATCHES_PER_SUBRESOURCE, Outcome, SkipReason, TexelValue};
pub use params::{CaseParams, TextureZeroParams, texture_zero_cases, texture_zero_params};
pub use partition::SubresourcePartition;
pub use runner::{CaseResult, RunReport, Runner};
pub use state::{InitStrategy, InitializedState};

#[cfg(feature = "render")]
pub use zeroinit_render::{GraphicsContext, GraphicsContextDescriptor, GraphicsError};
