//! zeroinit core
//!
//! Value types and plumbing shared by every zeroinit crate: the subresource
//! coordinate model, the static texture format capability table, the read and
//! uninitialize method enums, and logging/profiling bootstrap.

pub mod alloc;
pub mod format;
pub mod logging;
pub mod method;
pub mod profiling;
pub mod subresource;

pub use format::{Channel, FormatInfo, TexelComponents, format_info};
pub use method::{ReadMethod, UninitializeMethod};
pub use subresource::{MipLevel, Range, RangeDesc, Subresource, SubresourceRange};
