//! Static texture format capability table.
//!
//! For every uncompressed format the zero-init test covers, the table records
//! which aspects exist (color, depth, stencil), what the format can be used for
//! (render attachment, copies, storage, multisampling), the device feature it
//! needs, and how a logical texel value is laid out in memory.
//!
//! Capabilities are the ones the API guarantees on every device. A device may
//! still reject a combination at runtime, which the oracle turns into a skip.

use wgpu::{Features, TextureAspect, TextureFormat};

/// A color channel, in logical RGBA order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    R,
    G,
    B,
    A,
}

impl Channel {
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Channel::R => 0,
            Channel::G => 1,
            Channel::B => 2,
            Channel::A => 3,
        }
    }
}

const R: &[Channel] = &[Channel::R];
const RG: &[Channel] = &[Channel::R, Channel::G];
const RGBA: &[Channel] = &[Channel::R, Channel::G, Channel::B, Channel::A];
const BGRA: &[Channel] = &[Channel::B, Channel::G, Channel::R, Channel::A];

/// Per-component storage of a color format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorEncoding {
    Unorm8,
    Snorm8,
    Uint8,
    Sint8,
    Uint16,
    Sint16,
    Float16,
    Uint32,
    Sint32,
    Float32,
    /// Three 10-bit unorm channels and a 2-bit alpha packed into one `u32`.
    Rgb10a2Unorm,
}

impl ColorEncoding {
    fn component_size(self) -> u32 {
        match self {
            ColorEncoding::Unorm8
            | ColorEncoding::Snorm8
            | ColorEncoding::Uint8
            | ColorEncoding::Sint8 => 1,
            ColorEncoding::Uint16 | ColorEncoding::Sint16 | ColorEncoding::Float16 => 2,
            ColorEncoding::Uint32 | ColorEncoding::Sint32 | ColorEncoding::Float32 => 4,
            // Only meaningful per texel.
            ColorEncoding::Rgb10a2Unorm => 1,
        }
    }
}

/// Storage of a depth aspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthEncoding {
    Unorm16,
    Float32,
    /// Implementation-defined layout; never copyable, never encodable.
    Opaque24,
}

/// How a shader sees the texel values of a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    Float,
    Uint,
    Sint,
    Depth,
    Stencil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorLayout {
    /// Channels in memory order.
    pub channels: &'static [Channel],
    pub encoding: ColorEncoding,
}

/// Capabilities and layout of one texture format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    pub format: TextureFormat,
    pub color: Option<ColorLayout>,
    pub depth: Option<DepthEncoding>,
    pub stencil: bool,
    pub renderable: bool,
    pub multisample: bool,
    pub copy_src: bool,
    pub copy_dst: bool,
    pub storage: bool,
    /// Device feature the format requires, if any.
    pub feature: Option<Features>,
}

/// Logical per-channel value of one texel, independent of any format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexelComponents {
    /// R, G, B, A.
    pub color: [f64; 4],
    pub depth: f32,
    pub stencil: u32,
}

impl TexelComponents {
    pub const ZERO: TexelComponents = TexelComponents {
        color: [0.0; 4],
        depth: 0.0,
        stencil: 0,
    };

    /// What a shader load returns for this texel: channels the format lacks
    /// read as `0`, except alpha which reads as `1`.
    pub fn as_loaded(&self, info: &FormatInfo) -> [f64; 4] {
        let mut loaded = [0.0, 0.0, 0.0, 1.0];
        if let Some(layout) = info.color {
            for channel in layout.channels {
                loaded[channel.index()] = self.color[channel.index()];
            }
        }
        loaded
    }
}

impl Default for TexelComponents {
    fn default() -> Self {
        Self::ZERO
    }
}

const fn color(
    format: TextureFormat,
    channels: &'static [Channel],
    encoding: ColorEncoding,
    renderable: bool,
    multisample: bool,
    storage: bool,
) -> FormatInfo {
    FormatInfo {
        format,
        color: Some(ColorLayout { channels, encoding }),
        depth: None,
        stencil: false,
        renderable,
        multisample,
        copy_src: true,
        copy_dst: true,
        storage,
        feature: None,
    }
}

const fn depth_stencil(
    format: TextureFormat,
    depth: Option<DepthEncoding>,
    stencil: bool,
    copy_src: bool,
    copy_dst: bool,
    feature: Option<Features>,
) -> FormatInfo {
    FormatInfo {
        format,
        color: None,
        depth,
        stencil,
        renderable: true,
        multisample: true,
        copy_src,
        copy_dst,
        storage: false,
        feature,
    }
}

use ColorEncoding as E;
use TextureFormat as F;

#[rustfmt::skip]
static FORMAT_TABLE: &[FormatInfo] = &[
    //    format                 channels encoding     render  msaa   storage
    color(F::R8Unorm,            R,    E::Unorm8,       true,  true,  false),
    color(F::R8Snorm,            R,    E::Snorm8,       false, false, false),
    color(F::R8Uint,             R,    E::Uint8,        true,  true,  false),
    color(F::R8Sint,             R,    E::Sint8,        true,  true,  false),
    color(F::R16Uint,            R,    E::Uint16,       true,  true,  false),
    color(F::R16Sint,            R,    E::Sint16,       true,  true,  false),
    color(F::R16Float,           R,    E::Float16,      true,  true,  false),
    color(F::Rg8Unorm,           RG,   E::Unorm8,       true,  true,  false),
    color(F::Rg8Snorm,           RG,   E::Snorm8,       false, false, false),
    color(F::Rg8Uint,            RG,   E::Uint8,        true,  true,  false),
    color(F::Rg8Sint,            RG,   E::Sint8,        true,  true,  false),
    color(F::R32Uint,            R,    E::Uint32,       true,  false, true),
    color(F::R32Sint,            R,    E::Sint32,       true,  false, true),
    color(F::R32Float,           R,    E::Float32,      true,  true,  true),
    color(F::Rg16Uint,           RG,   E::Uint16,       true,  true,  false),
    color(F::Rg16Sint,           RG,   E::Sint16,       true,  true,  false),
    color(F::Rg16Float,          RG,   E::Float16,      true,  true,  false),
    color(F::Rgba8Unorm,         RGBA, E::Unorm8,       true,  true,  true),
    color(F::Rgba8UnormSrgb,     RGBA, E::Unorm8,       true,  true,  false),
    color(F::Rgba8Snorm,         RGBA, E::Snorm8,       false, false, true),
    color(F::Rgba8Uint,          RGBA, E::Uint8,        true,  true,  true),
    color(F::Rgba8Sint,          RGBA, E::Sint8,        true,  true,  true),
    color(F::Bgra8Unorm,         BGRA, E::Unorm8,       true,  true,  false),
    color(F::Bgra8UnormSrgb,     BGRA, E::Unorm8,       true,  true,  false),
    color(F::Rgb10a2Unorm,       RGBA, E::Rgb10a2Unorm, true,  true,  false),
    color(F::Rg32Uint,           RG,   E::Uint32,       true,  false, true),
    color(F::Rg32Sint,           RG,   E::Sint32,       true,  false, true),
    color(F::Rg32Float,          RG,   E::Float32,      true,  false, true),
    color(F::Rgba16Uint,         RGBA, E::Uint16,       true,  true,  true),
    color(F::Rgba16Sint,         RGBA, E::Sint16,       true,  true,  true),
    color(F::Rgba16Float,        RGBA, E::Float16,      true,  true,  true),
    color(F::Rgba32Uint,         RGBA, E::Uint32,       true,  false, true),
    color(F::Rgba32Sint,         RGBA, E::Sint32,       true,  false, true),
    color(F::Rgba32Float,        RGBA, E::Float32,      true,  false, true),
    //            format                  depth                           stencil copy_src copy_dst feature
    depth_stencil(F::Stencil8,             None,                           true,  true,  true,  None),
    depth_stencil(F::Depth16Unorm,         Some(DepthEncoding::Unorm16),   false, true,  true,  None),
    depth_stencil(F::Depth24Plus,          Some(DepthEncoding::Opaque24),  false, false, false, None),
    depth_stencil(F::Depth24PlusStencil8,  Some(DepthEncoding::Opaque24),  true,  false, false, None),
    depth_stencil(F::Depth32Float,         Some(DepthEncoding::Float32),   false, true,  false, None),
    depth_stencil(F::Depth32FloatStencil8, Some(DepthEncoding::Float32),   true,  true,  false,
                  Some(Features::DEPTH32FLOAT_STENCIL8)),
];

/// Look up a format's capabilities. `None` for formats outside the table.
pub fn format_info(format: TextureFormat) -> Option<&'static FormatInfo> {
    FORMAT_TABLE.iter().find(|info| info.format == format)
}

/// Every format in the table, in table order.
pub fn all_formats() -> impl Iterator<Item = TextureFormat> + Clone {
    FORMAT_TABLE.iter().map(|info| info.format)
}

/// Every format in the table.
pub fn format_table() -> &'static [FormatInfo] {
    FORMAT_TABLE
}

impl FormatInfo {
    #[inline]
    pub fn has_color(&self) -> bool {
        self.color.is_some()
    }

    #[inline]
    pub fn has_depth(&self) -> bool {
        self.depth.is_some()
    }

    #[inline]
    pub fn has_stencil(&self) -> bool {
        self.stencil
    }

    pub fn is_depth_stencil(&self) -> bool {
        self.has_depth() && self.has_stencil()
    }

    /// Formats whose depth aspect has no defined byte layout.
    pub fn is_packed_depth(&self) -> bool {
        matches!(self.depth, Some(DepthEncoding::Opaque24))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.sample_kind(), SampleKind::Uint | SampleKind::Sint)
    }

    /// Number of color channels; zero for depth/stencil formats.
    pub fn channel_count(&self) -> usize {
        self.color.map_or(0, |layout| layout.channels.len())
    }

    /// Whether the format defines `channel`.
    pub fn has_channel(&self, channel: Channel) -> bool {
        self.color
            .is_some_and(|layout| layout.channels.contains(&channel))
    }

    pub fn sample_kind(&self) -> SampleKind {
        match self.color.map(|layout| layout.encoding) {
            Some(ColorEncoding::Uint8 | ColorEncoding::Uint16 | ColorEncoding::Uint32) => {
                SampleKind::Uint
            }
            Some(ColorEncoding::Sint8 | ColorEncoding::Sint16 | ColorEncoding::Sint32) => {
                SampleKind::Sint
            }
            Some(_) => SampleKind::Float,
            None if self.has_depth() => SampleKind::Depth,
            None => SampleKind::Stencil,
        }
    }

    /// The single aspect a copy to or from this format must name.
    pub fn copy_aspect(&self) -> TextureAspect {
        match (self.has_color(), self.has_depth(), self.has_stencil()) {
            (false, true, false) => TextureAspect::DepthOnly,
            (false, false, true) => TextureAspect::StencilOnly,
            _ => TextureAspect::All,
        }
    }

    /// Size in bytes of one texel of `aspect`, or `None` if the aspect has no
    /// defined layout.
    pub fn bytes_per_texel(&self, aspect: TextureAspect) -> Option<u32> {
        match self.resolve_aspect(aspect)? {
            ResolvedAspect::Color(layout) => Some(match layout.encoding {
                ColorEncoding::Rgb10a2Unorm => 4,
                encoding => encoding.component_size() * layout.channels.len() as u32,
            }),
            ResolvedAspect::Depth(DepthEncoding::Unorm16) => Some(2),
            ResolvedAspect::Depth(DepthEncoding::Float32) => Some(4),
            ResolvedAspect::Depth(DepthEncoding::Opaque24) => None,
            ResolvedAspect::Stencil => Some(1),
        }
    }

    /// Whether `aspect` of this format can be produced from a logical value.
    pub fn is_encodable(&self, aspect: TextureAspect) -> bool {
        self.bytes_per_texel(aspect).is_some()
    }

    /// Encode one texel of `aspect` into the format's native byte layout.
    ///
    /// Returns `None` for packed depth, for `All` on combined depth-stencil
    /// formats, and for aspects the format lacks.
    pub fn encode(&self, aspect: TextureAspect, texel: &TexelComponents) -> Option<Vec<u8>> {
        let bytes = match self.resolve_aspect(aspect)? {
            ResolvedAspect::Color(layout) => encode_color(layout, &texel.color),
            ResolvedAspect::Depth(DepthEncoding::Unorm16) => {
                let value = (texel.depth.clamp(0.0, 1.0) * 65535.0).round() as u16;
                value.to_le_bytes().to_vec()
            }
            ResolvedAspect::Depth(DepthEncoding::Float32) => texel.depth.to_le_bytes().to_vec(),
            ResolvedAspect::Depth(DepthEncoding::Opaque24) => return None,
            ResolvedAspect::Stencil => vec![texel.stencil.min(u8::MAX as u32) as u8],
        };
        Some(bytes)
    }

    fn resolve_aspect(&self, aspect: TextureAspect) -> Option<ResolvedAspect> {
        match aspect {
            TextureAspect::All => match (self.color, self.depth, self.stencil) {
                (Some(layout), _, _) => Some(ResolvedAspect::Color(layout)),
                (None, Some(depth), false) => Some(ResolvedAspect::Depth(depth)),
                (None, None, true) => Some(ResolvedAspect::Stencil),
                _ => None,
            },
            TextureAspect::DepthOnly => self.depth.map(ResolvedAspect::Depth),
            TextureAspect::StencilOnly => self.stencil.then_some(ResolvedAspect::Stencil),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ResolvedAspect {
    Color(ColorLayout),
    Depth(DepthEncoding),
    Stencil,
}

fn encode_color(layout: ColorLayout, color: &[f64; 4]) -> Vec<u8> {
    if layout.encoding == ColorEncoding::Rgb10a2Unorm {
        let unorm = |v: f64, max: f64| (v.clamp(0.0, 1.0) * max).round() as u32;
        let packed = unorm(color[0], 1023.0)
            | (unorm(color[1], 1023.0) << 10)
            | (unorm(color[2], 1023.0) << 20)
            | (unorm(color[3], 3.0) << 30);
        return packed.to_le_bytes().to_vec();
    }

    let mut bytes = Vec::with_capacity(layout.channels.len() * 4);
    for channel in layout.channels {
        let v = color[channel.index()];
        match layout.encoding {
            ColorEncoding::Unorm8 => bytes.push((v.clamp(0.0, 1.0) * 255.0).round() as u8),
            ColorEncoding::Snorm8 => {
                bytes.push((v.clamp(-1.0, 1.0) * 127.0).round() as i8 as u8)
            }
            ColorEncoding::Uint8 => bytes.push(v.clamp(0.0, u8::MAX as f64) as u8),
            ColorEncoding::Sint8 => {
                bytes.push(v.clamp(i8::MIN as f64, i8::MAX as f64) as i8 as u8)
            }
            ColorEncoding::Uint16 => {
                bytes.extend_from_slice(&(v.clamp(0.0, u16::MAX as f64) as u16).to_le_bytes())
            }
            ColorEncoding::Sint16 => bytes.extend_from_slice(
                &(v.clamp(i16::MIN as f64, i16::MAX as f64) as i16).to_le_bytes(),
            ),
            ColorEncoding::Float16 => {
                bytes.extend_from_slice(&half::f16::from_f64(v).to_le_bytes())
            }
            ColorEncoding::Uint32 => {
                bytes.extend_from_slice(&(v.clamp(0.0, u32::MAX as f64) as u32).to_le_bytes())
            }
            ColorEncoding::Sint32 => bytes.extend_from_slice(
                &(v.clamp(i32::MIN as f64, i32::MAX as f64) as i32).to_le_bytes(),
            ),
            ColorEncoding::Float32 => bytes.extend_from_slice(&(v as f32).to_le_bytes()),
            ColorEncoding::Rgb10a2Unorm => unreachable!("packed formats are handled above"),
        }
    }
    bytes
}
