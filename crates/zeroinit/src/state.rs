//! What a subresource is expected to hold, and how it gets there.

use std::fmt;

use wgpu::TextureUsages;
use zeroinit_core::format::SampleKind;
use zeroinit_core::{FormatInfo, TexelComponents};

/// Depth written as canary. Any value in `(0, 1]` works.
pub const CANARY_DEPTH: f32 = 0.8;

pub const CANARY_STENCIL: u32 = 42;

/// Expected contents of a subresource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitializedState {
    /// Never written, or discarded.
    Zero,
    /// Written by the test with a non-zero sentinel.
    Canary,
}

impl InitializedState {
    /// The logical texel value this state stands for in `format`.
    pub fn components(self, format: &FormatInfo) -> TexelComponents {
        match self {
            InitializedState::Zero => TexelComponents::ZERO,
            InitializedState::Canary => {
                let channel = match format.sample_kind() {
                    SampleKind::Sint => -1.0,
                    _ => 1.0,
                };
                TexelComponents {
                    color: [channel; 4],
                    depth: CANARY_DEPTH,
                    stencil: CANARY_STENCIL,
                }
            }
        }
    }
}

impl fmt::Display for InitializedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitializedState::Zero => write!(f, "zero"),
            InitializedState::Canary => write!(f, "canary"),
        }
    }
}

/// How canary data is written into a subresource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitStrategy {
    /// Buffer-to-texture copy, one per mip level.
    Copy,
    /// Render pass that clears one subresource and stores.
    RenderClear,
}

impl InitStrategy {
    /// Copy when the format accepts a whole-texel upload, else clear.
    pub fn preferred(format: &FormatInfo, sample_count: u32) -> Self {
        if InitStrategy::Copy.is_available(format, sample_count) {
            InitStrategy::Copy
        } else {
            InitStrategy::RenderClear
        }
    }

    pub fn is_available(self, format: &FormatInfo, sample_count: u32) -> bool {
        match self {
            InitStrategy::Copy => {
                sample_count == 1 && format.copy_dst && format.is_encodable(format.copy_aspect())
            }
            InitStrategy::RenderClear => format.renderable,
        }
    }

    /// Usage the texture needs for this strategy to be legal.
    pub fn required_usage(self) -> TextureUsages {
        match self {
            InitStrategy::Copy => TextureUsages::COPY_DST,
            InitStrategy::RenderClear => TextureUsages::RENDER_ATTACHMENT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat;
    use zeroinit_core::format_info;

    fn info(format: TextureFormat) -> &'static FormatInfo {
        format_info(format).unwrap()
    }

    #[test]
    fn test_canary_differs_from_zero_in_every_format() {
        for format in zeroinit_core::format::format_table() {
            let zero = InitializedState::Zero.components(format);
            let canary = InitializedState::Canary.components(format);
            let aspect = format.copy_aspect();
            if format.is_encodable(aspect) {
                assert_ne!(
                    format.encode(aspect, &zero),
                    format.encode(aspect, &canary),
                    "{:?}",
                    format.format
                );
            }
            if format.has_color() {
                assert_ne!(zero.as_loaded(format), canary.as_loaded(format), "{:?}", format.format);
            }
        }
    }

    #[test]
    fn test_sint_canary_is_negative() {
        let canary = InitializedState::Canary.components(info(TextureFormat::R8Sint));
        assert_eq!(canary.color[0], -1.0);
        let canary = InitializedState::Canary.components(info(TextureFormat::R8Uint));
        assert_eq!(canary.color[0], 1.0);
    }

    #[test]
    fn test_strategy_selection() {
        assert_eq!(
            InitStrategy::preferred(info(TextureFormat::Rgba8Unorm), 1),
            InitStrategy::Copy
        );
        assert_eq!(
            InitStrategy::preferred(info(TextureFormat::Rgba8Unorm), 4),
            InitStrategy::RenderClear
        );
        assert_eq!(
            InitStrategy::preferred(info(TextureFormat::Depth32Float), 1),
            InitStrategy::RenderClear
        );
        assert_eq!(
            InitStrategy::preferred(info(TextureFormat::Depth32FloatStencil8), 1),
            InitStrategy::RenderClear
        );
        assert_eq!(
            InitStrategy::preferred(info(TextureFormat::Stencil8), 1),
            InitStrategy::Copy
        );
        assert!(!InitStrategy::RenderClear.is_available(info(TextureFormat::R8Snorm), 1));
    }
}
