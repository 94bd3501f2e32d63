//! Owned texture handle that can be real or mock.

use wgpu::{Extent3d, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages};

/// Creation parameters of a texture, kept next to the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub size: Extent3d,
    pub mip_level_count: u32,
    pub sample_count: u32,
    pub dimension: TextureDimension,
    pub format: TextureFormat,
    pub usage: TextureUsages,
}

impl TextureInfo {
    pub fn from_descriptor(desc: &TextureDescriptor<'_>) -> Self {
        Self {
            size: desc.size,
            mip_level_count: desc.mip_level_count,
            sample_count: desc.sample_count,
            dimension: desc.dimension,
            format: desc.format,
            usage: desc.usage,
        }
    }

    fn from_wgpu(texture: &wgpu::Texture) -> Self {
        Self {
            size: texture.size(),
            mip_level_count: texture.mip_level_count(),
            sample_count: texture.sample_count(),
            dimension: texture.dimension(),
            format: texture.format(),
            usage: texture.usage(),
        }
    }

    /// Size of mip `level`. Array layers are not halved; 3D depth is.
    pub fn mip_size(&self, level: u32) -> Extent3d {
        self.size.mip_level_size(level, self.dimension)
    }

    /// Addressable array layers. A 3D texture has exactly one.
    pub fn array_layer_count(&self) -> u32 {
        match self.dimension {
            TextureDimension::D3 => 1,
            _ => self.size.depth_or_array_layers,
        }
    }

    /// Copy extent of one subresource of `level`: one layer, or every depth
    /// slice for 3D.
    pub fn subresource_extent(&self, level: u32) -> Extent3d {
        let size = self.mip_size(level);
        Extent3d {
            depth_or_array_layers: match self.dimension {
                TextureDimension::D3 => size.depth_or_array_layers,
                _ => 1,
            },
            ..size
        }
    }

    /// Texels in one subresource of `level` (all depth slices for 3D).
    pub fn texel_count(&self, level: u32) -> usize {
        let extent = self.subresource_extent(level);
        extent.width as usize * extent.height as usize * extent.depth_or_array_layers as usize
    }

    pub fn is_multisampled(&self) -> bool {
        self.sample_count > 1
    }

    /// Rough number of bytes the texture occupies, for memory budgets.
    pub fn approximate_bytes(&self) -> u64 {
        let texel = self.format.block_copy_size(None).unwrap_or(4) as u64;
        let layers = self.array_layer_count() as u64;
        (0..self.mip_level_count)
            .map(|level| self.texel_count(level) as u64 * layers)
            .sum::<u64>()
            * texel
            * self.sample_count as u64
    }
}

/// Wrapper around GPU texture that can be real or mock.
///
/// Cheap to clone; clones refer to the same texture.
#[derive(Clone, Debug)]
pub struct GpuTexture {
    inner: GpuTextureInner,
    info: TextureInfo,
}

#[derive(Clone, Debug)]
enum GpuTextureInner {
    Real(wgpu::Texture),
    #[cfg(feature = "mock")]
    Mock { id: usize },
}

impl GpuTexture {
    /// Create from real WGPU texture
    pub fn from_wgpu(texture: wgpu::Texture) -> Self {
        Self {
            info: TextureInfo::from_wgpu(&texture),
            inner: GpuTextureInner::Real(texture),
        }
    }

    /// Create mock texture (for testing)
    #[cfg(feature = "mock")]
    pub fn mock(id: usize, info: TextureInfo) -> Self {
        Self {
            inner: GpuTextureInner::Mock { id },
            info,
        }
    }

    pub fn info(&self) -> &TextureInfo {
        &self.info
    }

    /// The underlying wgpu::Texture, or `None` for a mock.
    pub fn as_wgpu(&self) -> Option<&wgpu::Texture> {
        match &self.inner {
            GpuTextureInner::Real(texture) => Some(texture),
            #[cfg(feature = "mock")]
            GpuTextureInner::Mock { .. } => None,
        }
    }

    /// Check if this is a mock
    #[cfg(feature = "mock")]
    pub fn is_mock(&self) -> bool {
        matches!(self.inner, GpuTextureInner::Mock { .. })
    }

    /// Get mock ID (for test assertions)
    #[cfg(feature = "mock")]
    pub fn mock_id(&self) -> Option<usize> {
        match &self.inner {
            GpuTextureInner::Mock { id } => Some(*id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(dimension: TextureDimension, size: Extent3d, mips: u32) -> TextureInfo {
        TextureInfo {
            size,
            mip_level_count: mips,
            sample_count: 1,
            dimension,
            format: TextureFormat::Rgba8Unorm,
            usage: TextureUsages::COPY_SRC,
        }
    }

    #[test]
    fn test_array_layers_are_not_halved() {
        let info = info(
            TextureDimension::D2,
            Extent3d { width: 32, height: 32, depth_or_array_layers: 7 },
            5,
        );
        assert_eq!(info.mip_size(3), Extent3d { width: 4, height: 4, depth_or_array_layers: 7 });
        assert_eq!(info.array_layer_count(), 7);
        assert_eq!(info.texel_count(3), 16);
    }

    #[test]
    fn test_3d_depth_is_halved() {
        let info = info(
            TextureDimension::D3,
            Extent3d { width: 2, height: 2, depth_or_array_layers: 11 },
            1,
        );
        assert_eq!(info.array_layer_count(), 1);
        assert_eq!(info.texel_count(0), 44);
        assert_eq!(info.mip_size(1).depth_or_array_layers, 5);
    }

    #[test]
    fn test_non_power_of_two_mips_floor() {
        let info = info(
            TextureDimension::D2,
            Extent3d { width: 63, height: 63, depth_or_array_layers: 1 },
            5,
        );
        assert_eq!(info.mip_size(1).width, 31);
        assert_eq!(info.mip_size(4).width, 3);
    }

    #[test]
    fn test_approximate_bytes() {
        let info = info(
            TextureDimension::D2,
            Extent3d { width: 2, height: 2, depth_or_array_layers: 3 },
            2,
        );
        // (4 + 1) texels per layer, 3 layers, 4 bytes each.
        assert_eq!(info.approximate_bytes(), 60);
    }
}
