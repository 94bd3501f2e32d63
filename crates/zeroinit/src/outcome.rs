//! Results of running one case.

use std::fmt;

use wgpu::TextureFormat;
use zeroinit_core::{ReadMethod, Subresource};
use zeroinit_test_utils::DeviceError;

use crate::oracle::CasePhase;
use crate::state::InitializedState;

/// Mismatching texels reported per subresource before the rest are summarized.
pub const MAX_REPORTED_MISMATCHES_PER_SUBRESOURCE: usize = 4;

/// How a case ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Pass,
    Fail(Vec<Failure>),
    Skip(SkipReason),
}

impl Outcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Outcome::Fail(_))
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Outcome::Skip(_))
    }

    pub fn failures(&self) -> &[Failure] {
        match self {
            Outcome::Fail(failures) => failures,
            _ => &[],
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Pass => write!(f, "pass"),
            Outcome::Fail(failures) => write!(f, "fail ({} failures)", failures.len()),
            Outcome::Skip(reason) => write!(f, "skip: {}", reason),
        }
    }
}

/// Why a case did not run to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The device lacks a format, feature, usage or read path.
    Unsupported(String),
    /// Creating the texture ran out of memory.
    OutOfMemory { requested: u64 },
    /// The format has no entry in the capability table.
    UnknownFormat(TextureFormat),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Unsupported(reason) => write!(f, "{}", reason),
            SkipReason::OutOfMemory { requested } => {
                write!(f, "out of memory allocating {} bytes", requested)
            }
            SkipReason::UnknownFormat(format) => write!(f, "{:?} is not in the format table", format),
        }
    }
}

/// One texel as observed by a read.
#[derive(Debug, Clone, PartialEq)]
pub enum TexelValue {
    Bytes(Vec<u8>),
    Rgba([f64; 4]),
    /// Result of a depth or stencil equality test.
    Passed(bool),
}

impl fmt::Display for TexelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TexelValue::Bytes(bytes) => write!(f, "{:02x?}", bytes),
            TexelValue::Rgba(rgba) => write!(f, "{:?}", rgba),
            TexelValue::Passed(true) => write!(f, "equal"),
            TexelValue::Passed(false) => write!(f, "not equal"),
        }
    }
}

/// A single reason a case failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    /// A texel differs from the expected state.
    Mismatch {
        subresource: Subresource,
        method: ReadMethod,
        state: InitializedState,
        texel: usize,
        expected: TexelValue,
        actual: TexelValue,
    },
    /// More texels of the subresource mismatched than are listed.
    MoreMismatches {
        subresource: Subresource,
        method: ReadMethod,
        omitted: usize,
    },
    /// The read returned the wrong amount of data.
    WrongSize {
        subresource: Subresource,
        method: ReadMethod,
        expected: usize,
        actual: usize,
    },
    /// The read returned a different kind of observation than the method implies.
    UnexpectedObservation {
        subresource: Subresource,
        method: ReadMethod,
        kind: &'static str,
    },
    /// The device rejected work the case needed.
    Device { phase: CasePhase, error: DeviceError },
    /// Phases were driven out of order.
    OutOfOrder { phase: CasePhase, actual: CasePhase },
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Mismatch {
                subresource,
                method,
                state,
                texel,
                expected,
                actual,
            } => write!(
                f,
                "{} via {}: texel {} expected {} ({}), got {}",
                subresource, method, texel, state, expected, actual
            ),
            Failure::MoreMismatches {
                subresource,
                method,
                omitted,
            } => write!(
                f,
                "{} via {}: {} more mismatching texels",
                subresource, method, omitted
            ),
            Failure::WrongSize {
                subresource,
                method,
                expected,
                actual,
            } => write!(
                f,
                "{} via {}: expected {} elements, got {}",
                subresource, method, expected, actual
            ),
            Failure::UnexpectedObservation {
                subresource,
                method,
                kind,
            } => write!(f, "{} via {}: unexpected {} observation", subresource, method, kind),
            Failure::Device { phase, error } => write!(f, "{} failed: {}", phase, error),
            Failure::OutOfOrder { phase, actual } => {
                write!(f, "cannot enter {} from {}", phase, actual)
            }
        }
    }
}
