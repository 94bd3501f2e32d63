//! The parameter matrix of the texture zero-init test.
//!
//! Case axes pick the expensive setup (dimension, read method, format); the
//! subcase axes vary the texture shape and how it is uninitialized. Illegal
//! combinations are pruned as soon as the axes they depend on are bound.

use wgpu::{
    Extent3d, TextureAspect, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages,
};
use zeroinit_core::format::all_formats;
use zeroinit_core::profiling::profile_function;
use zeroinit_core::{FormatInfo, ReadMethod, UninitializeMethod, format_info};
use zeroinit_params::{ParamsBuilder, Subcases};

use crate::state::InitStrategy;

/// Prefix of every case name.
pub const TEST_NAME: &str = "uninitialized_texture_is_zero";

pub const MIP_LEVEL_COUNTS: [u32; 2] = [1, 5];
pub const SAMPLE_COUNTS: [u32; 2] = [1, 4];
pub const ARRAY_LAYER_COUNTS: [u32; 2] = [1, 7];
/// Depth of every 3D texture.
pub const DEPTH_3D: u32 = 11;

const DIMENSIONS: [TextureDimension; 2] = [TextureDimension::D2, TextureDimension::D3];
const ASPECTS: [TextureAspect; 3] = [
    TextureAspect::All,
    TextureAspect::DepthOnly,
    TextureAspect::StencilOnly,
];

/// One record of the matrix, in axis order.
pub type Record = (
    TextureDimension,
    ReadMethod,
    TextureFormat,
    TextureAspect,
    u32,
    u32,
    UninitializeMethod,
    u32,
    bool,
    bool,
);

/// Fully bound parameters of one case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureZeroParams {
    pub dimension: TextureDimension,
    pub read_method: ReadMethod,
    pub format: TextureFormat,
    pub aspect: TextureAspect,
    pub mip_level_count: u32,
    pub sample_count: u32,
    pub uninitialize_method: UninitializeMethod,
    /// Array layers of a 2D texture; always 1 for 3D.
    pub layer_count: u32,
    pub non_power_of_two: bool,
    /// Write canary data to the control subresources right after creation and
    /// check it is still there at the end.
    pub canary_on_creation: bool,
}

impl From<Record> for TextureZeroParams {
    fn from(record: Record) -> Self {
        let (
            dimension,
            read_method,
            format,
            aspect,
            mip_level_count,
            sample_count,
            uninitialize_method,
            layer_count,
            non_power_of_two,
            canary_on_creation,
        ) = record;
        Self {
            dimension,
            read_method,
            format,
            aspect,
            mip_level_count,
            sample_count,
            uninitialize_method,
            layer_count,
            non_power_of_two,
            canary_on_creation,
        }
    }
}

impl TextureZeroParams {
    /// A single-level, single-layer 2D texture read by buffer copy and left
    /// as created. Adjust fields from there.
    pub fn new(format: TextureFormat) -> Self {
        Self {
            dimension: TextureDimension::D2,
            read_method: ReadMethod::CopyToBuffer,
            format,
            aspect: TextureAspect::All,
            mip_level_count: 1,
            sample_count: 1,
            uninitialize_method: UninitializeMethod::Creation,
            layer_count: 1,
            non_power_of_two: false,
            canary_on_creation: false,
        }
    }

    pub fn format_info(&self) -> Option<&'static FormatInfo> {
        format_info(self.format)
    }

    /// Width and height of level 0.
    pub fn width(&self) -> u32 {
        let base = 1u32 << self.mip_level_count;
        if self.non_power_of_two {
            2 * base - 1
        } else {
            base
        }
    }

    pub fn height(&self) -> u32 {
        self.width()
    }

    /// Depth of a 3D texture, or 1.
    pub fn depth(&self) -> u32 {
        match self.dimension {
            TextureDimension::D3 => DEPTH_3D,
            _ => 1,
        }
    }

    pub fn size(&self) -> Extent3d {
        Extent3d {
            width: self.width(),
            height: self.height(),
            depth_or_array_layers: match self.dimension {
                TextureDimension::D3 => self.depth(),
                _ => self.layer_count,
            },
        }
    }

    /// Addressable layers; a 3D texture has one.
    pub fn array_layer_count(&self) -> u32 {
        match self.dimension {
            TextureDimension::D3 => 1,
            _ => self.layer_count,
        }
    }

    /// Usage the case needs with the preferred initialization strategy.
    pub fn required_usage(&self) -> TextureUsages {
        match self.format_info() {
            Some(info) => {
                required_usage(self.read_method, self.uninitialize_method, self.sample_count, info)
            }
            None => read_usage(self.read_method),
        }
    }

    pub fn texture_descriptor(&self) -> TextureDescriptor<'static> {
        TextureDescriptor {
            label: Some(TEST_NAME),
            size: self.size(),
            mip_level_count: self.mip_level_count,
            sample_count: self.sample_count,
            dimension: self.dimension,
            format: self.format,
            usage: self.required_usage(),
            view_formats: &[],
        }
    }

    /// Aspect passed to reads. `All` is narrowed to the single aspect a copy
    /// must name.
    pub fn read_aspect(&self) -> TextureAspect {
        match (self.aspect, self.format_info()) {
            (TextureAspect::All, Some(info)) if self.read_method.is_copy() => info.copy_aspect(),
            (aspect, _) => aspect,
        }
    }
}

fn read_usage(method: ReadMethod) -> TextureUsages {
    match method {
        ReadMethod::CopyToBuffer | ReadMethod::CopyToTexture => TextureUsages::COPY_SRC,
        ReadMethod::Sample => TextureUsages::TEXTURE_BINDING,
        ReadMethod::Storage => TextureUsages::STORAGE_BINDING,
        ReadMethod::DepthTest | ReadMethod::StencilTest | ReadMethod::ColorBlending => {
            TextureUsages::RENDER_ATTACHMENT
        }
    }
}

/// Union of the usage the read, the uninitialize method, multisampling and
/// canary initialization need.
pub fn required_usage(
    method: ReadMethod,
    uninitialize: UninitializeMethod,
    sample_count: u32,
    format: &FormatInfo,
) -> TextureUsages {
    let mut usage = read_usage(method);
    if uninitialize == UninitializeMethod::StoreOpDiscard || sample_count > 1 {
        usage |= TextureUsages::RENDER_ATTACHMENT;
    }
    usage | InitStrategy::preferred(format, sample_count).required_usage()
}

fn usage_is_legal(usage: TextureUsages, format: &FormatInfo) -> bool {
    (!usage.contains(TextureUsages::RENDER_ATTACHMENT) || format.renderable)
        && (!usage.contains(TextureUsages::STORAGE_BINDING) || format.storage)
        && (!usage.contains(TextureUsages::COPY_SRC) || format.copy_src)
        && (!usage.contains(TextureUsages::COPY_DST) || format.copy_dst)
}

/// Read method, format and aspect combinations that cannot be expressed.
fn is_illegal_read(method: ReadMethod, format: &FormatInfo, aspect: TextureAspect) -> bool {
    let aspect_missing = match aspect {
        TextureAspect::DepthOnly => !format.has_depth(),
        TextureAspect::StencilOnly => !format.has_stencil(),
        TextureAspect::All => format.is_depth_stencil(),
        _ => true,
    };
    if aspect_missing {
        return true;
    }

    match method {
        ReadMethod::DepthTest => !format.has_depth() || aspect == TextureAspect::StencilOnly,
        ReadMethod::StencilTest => !format.has_stencil() || aspect == TextureAspect::DepthOnly,
        ReadMethod::ColorBlending => !format.has_color() || format.is_integer(),
        ReadMethod::Sample => !format.has_color(),
        ReadMethod::Storage => !format.has_color(),
        ReadMethod::CopyToBuffer => format.is_packed_depth(),
        ReadMethod::CopyToTexture => format.is_packed_depth() || format.is_depth_stencil(),
    }
}

fn with_info(format: TextureFormat, predicate: impl FnOnce(&FormatInfo) -> bool) -> bool {
    format_info(format).is_some_and(predicate)
}

/// The full matrix, in declaration order.
///
/// ```
/// let params = zeroinit::texture_zero_params();
/// assert_eq!(
///     params.describe(),
///     "dimension, read_method, format | aspect, mip_level_count, sample_count, \
///      uninitialize_method, layer_count, non_power_of_two, canary_on_creation"
/// );
/// ```
pub fn texture_zero_params() -> ParamsBuilder<Record, Subcases> {
    profile_function!();
    ParamsBuilder::new()
        .combine("dimension", DIMENSIONS)
        .combine("read_method", ReadMethod::ALL)
        .combine("format", all_formats().collect::<Vec<_>>())
        .begin_subcases()
        .combine("aspect", ASPECTS)
        .unless(|&(_, method, format, aspect)| {
            with_info(format, |info| is_illegal_read(method, info, aspect))
        })
        .combine("mip_level_count", MIP_LEVEL_COUNTS)
        .combine("sample_count", SAMPLE_COUNTS)
        .unless(|&(_, method, _, _, mips, samples)| {
            samples > 1 && (method.is_copy() || mips > 1 || method == ReadMethod::Storage)
        })
        .combine("uninitialize_method", UninitializeMethod::ALL)
        .unless(|&(dimension, method, format, _, _, samples, uninitialize)| {
            dimension == TextureDimension::D3
                && (samples > 1
                    || with_info(format, |info| !info.has_color())
                    || method.is_attachment()
                    || uninitialize == UninitializeMethod::StoreOpDiscard)
        })
        .expand("layer_count", |&(dimension, ..)| match dimension {
            TextureDimension::D3 => vec![1],
            _ => ARRAY_LAYER_COUNTS.to_vec(),
        })
        .unless(|&(.., samples, _, layers)| samples > 1 && layers > 1)
        .unless(|&(_, method, format, _, _, samples, uninitialize, _)| {
            with_info(format, |info| {
                !usage_is_legal(required_usage(method, uninitialize, samples, info), info)
            })
        })
        .combine("non_power_of_two", [false, true])
        .combine("canary_on_creation", [false, true])
        .filter(|&(_, _, format, _, _, samples, _, _, _, canary)| {
            !canary
                || with_info(format, |info| {
                    InitStrategy::preferred(info, samples).is_available(info, samples)
                })
        })
}

/// A generated case with its name.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseParams {
    pub params: TextureZeroParams,
    /// `uninitialized_texture_is_zero:<case>;<subcase>`
    pub name: String,
    pub case_key: String,
    pub subcase_key: String,
}

/// Every case of the matrix, named.
pub fn texture_zero_cases() -> impl Iterator<Item = CaseParams> {
    let builder = texture_zero_params();
    builder.iter().map(move |record| {
        let case_key = builder.case_key(&record);
        let subcase_key = builder.subcase_key(&record);
        CaseParams {
            params: TextureZeroParams::from(record),
            name: format!("{}:{};{}", TEST_NAME, case_key, subcase_key),
            case_key,
            subcase_key,
        }
    })
}
