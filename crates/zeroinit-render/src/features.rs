//! GPU feature detection and management.
//!
//! Type-safe wrapper around the wgpu features that widen the set of formats
//! and usages a zero-init run can cover, with support for required vs
//! requested features.

use bitflags::bitflags;

bitflags! {
    /// GPU features that can be requested or required.
    ///
    /// Use `GpuFeatures::to_wgpu()` to convert to `wgpu::Features`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct GpuFeatures: u32 {
        /// The `Depth32FloatStencil8` format.
        const DEPTH32FLOAT_STENCIL8 = 1 << 0;

        /// Per-adapter format capabilities beyond the WebGPU baseline, such as
        /// multisampling of formats the baseline leaves single-sampled.
        const TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES = 1 << 1;
    }
}

const FEATURE_MAP: &[(GpuFeatures, wgpu::Features)] = &[
    (
        GpuFeatures::DEPTH32FLOAT_STENCIL8,
        wgpu::Features::DEPTH32FLOAT_STENCIL8,
    ),
    (
        GpuFeatures::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES,
        wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES,
    ),
];

impl GpuFeatures {
    /// Convert to wgpu::Features.
    pub fn to_wgpu(self) -> wgpu::Features {
        FEATURE_MAP
            .iter()
            .filter(|(ours, _)| self.contains(*ours))
            .fold(wgpu::Features::empty(), |acc, (_, theirs)| acc | *theirs)
    }

    /// Convert from wgpu::Features to GpuFeatures.
    ///
    /// Note: Only features that have a corresponding GpuFeatures flag will be included.
    pub fn from_wgpu(features: wgpu::Features) -> Self {
        FEATURE_MAP
            .iter()
            .filter(|(_, theirs)| features.contains(*theirs))
            .fold(GpuFeatures::empty(), |acc, (ours, _)| acc | *ours)
    }

    /// Check if all the specified features are supported by the adapter.
    pub fn check_support(self, adapter: &wgpu::Adapter) -> FeatureSupportResult {
        let adapter_features = GpuFeatures::from_wgpu(adapter.features());
        let missing = self - (self & adapter_features);

        if missing.is_empty() {
            FeatureSupportResult::Supported
        } else {
            FeatureSupportResult::Missing(missing)
        }
    }
}

impl Default for GpuFeatures {
    fn default() -> Self {
        GpuFeatures::empty()
    }
}

/// Result of checking feature support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureSupportResult {
    /// All requested features are supported.
    Supported,
    /// Some features are missing.
    Missing(GpuFeatures),
}

impl FeatureSupportResult {
    /// Returns true if all features are supported.
    pub fn is_supported(&self) -> bool {
        matches!(self, FeatureSupportResult::Supported)
    }

    /// Returns the missing features, if any.
    pub fn missing(&self) -> Option<GpuFeatures> {
        match self {
            FeatureSupportResult::Supported => None,
            FeatureSupportResult::Missing(features) => Some(*features),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpu_features_empty() {
        let features = GpuFeatures::empty();
        assert!(features.is_empty());
        assert_eq!(features.to_wgpu(), wgpu::Features::empty());
    }

    #[test]
    fn test_gpu_features_roundtrip() {
        let features = GpuFeatures::all();
        assert_eq!(GpuFeatures::from_wgpu(features.to_wgpu()), features);
    }

    #[test]
    fn test_unmapped_wgpu_features_are_dropped() {
        let wgpu_features = wgpu::Features::DEPTH32FLOAT_STENCIL8 | wgpu::Features::SHADER_F16;
        assert_eq!(
            GpuFeatures::from_wgpu(wgpu_features),
            GpuFeatures::DEPTH32FLOAT_STENCIL8
        );
    }
}
