//! Shader-based reads: texel loads for sampling, and full-screen equality
//! tests for depth and stencil.

use std::borrow::Cow;

use wgpu::util::DeviceExt;
use zeroinit_core::format::SampleKind;
use zeroinit_core::{FormatInfo, ReadMethod, TexelComponents};
use zeroinit_test_utils::{DeviceError, TextureInfo};

use crate::context::GraphicsContext;
use crate::readback::{SubresourceReadback, map_read};

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct LoadParams {
    level: u32,
    layer: u32,
    width: u32,
    height: u32,
    samples: u32,
    _pad: [u32; 3],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct CompareParams {
    depth: f32,
    _pad: [f32; 3],
}

fn load_shader(texture_type: &str, load: &str) -> String {
    format!(
        r#"
struct Params {{
    level: u32,
    layer: u32,
    width: u32,
    height: u32,
    samples: u32,
}}

@group(0) @binding(0) var src: {texture_type};
@group(0) @binding(1) var<storage, read_write> texels: array<vec4<f32>>;
@group(0) @binding(2) var<uniform> params: Params;

@compute @workgroup_size(1)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {{
    let base = ((id.z * params.height + id.y) * params.width + id.x) * params.samples;
    for (var s = 0u; s < params.samples; s = s + 1u) {{
        texels[base + s] = vec4<f32>({load});
    }}
}}
"#
    )
}

const COMPARE_SHADER: &str = r#"
struct Probe {
    depth: f32,
}

@group(0) @binding(0) var<uniform> probe: Probe;

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> @builtin(position) vec4<f32> {
    let x = f32((index << 1u) & 2u) * 2.0 - 1.0;
    let y = f32(index & 2u) * 2.0 - 1.0;
    return vec4<f32>(x, y, probe.depth, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 1.0, 1.0, 1.0);
}
"#;

/// Load every texel (and sample) of one subresource through a compute shader.
pub(crate) fn load_texels(
    ctx: &GraphicsContext,
    texture: &wgpu::Texture,
    info: &TextureInfo,
    format: &FormatInfo,
    level: u32,
    layer: u32,
) -> Result<Vec<[f64; 4]>, DeviceError> {
    let (scalar, sample_type) = match format.sample_kind() {
        SampleKind::Float => ("f32", wgpu::TextureSampleType::Float { filterable: false }),
        SampleKind::Uint => ("u32", wgpu::TextureSampleType::Uint),
        SampleKind::Sint => ("i32", wgpu::TextureSampleType::Sint),
        SampleKind::Depth | SampleKind::Stencil => {
            return Err(DeviceError::unsupported(
                "sampling depth or stencil aspects is not probed",
            ));
        }
    };

    let (texture_type, load, view_dimension) = match (info.dimension, info.is_multisampled()) {
        (wgpu::TextureDimension::D3, _) => (
            format!("texture_3d<{scalar}>"),
            "textureLoad(src, vec3<i32>(id), i32(params.level))",
            wgpu::TextureViewDimension::D3,
        ),
        (_, true) => (
            format!("texture_multisampled_2d<{scalar}>"),
            "textureLoad(src, vec2<i32>(id.xy), i32(s))",
            wgpu::TextureViewDimension::D2,
        ),
        _ => (
            format!("texture_2d_array<{scalar}>"),
            "textureLoad(src, vec2<i32>(id.xy), i32(params.layer), i32(params.level))",
            wgpu::TextureViewDimension::D2Array,
        ),
    };

    let device = &ctx.device;
    let extent = info.subresource_extent(level);
    let samples = info.sample_count;
    let texel_count = info.texel_count(level) * samples as usize;
    let output_size = (texel_count * std::mem::size_of::<[f32; 4]>()) as u64;

    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("load_texels"),
        source: wgpu::ShaderSource::Wgsl(Cow::Owned(load_shader(&texture_type, load))),
    });

    let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("load_texels"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Texture {
                    sample_type,
                    view_dimension,
                    multisampled: info.is_multisampled(),
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: false },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("load_texels"),
        bind_group_layouts: &[&layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("load_texels"),
        layout: Some(&pipeline_layout),
        module: &module,
        entry_point: Some("main"),
        compilation_options: Default::default(),
        cache: None,
    });

    let view = texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("load_texels"),
        dimension: Some(view_dimension),
        aspect: wgpu::TextureAspect::All,
        ..Default::default()
    });

    let output = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("load_texels_output"),
        size: output_size,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("load_texels_staging"),
        size: output_size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    let params = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("load_texels_params"),
        contents: bytemuck::bytes_of(&LoadParams {
            level,
            layer,
            width: extent.width,
            height: extent.height,
            samples,
            _pad: [0; 3],
        }),
        usage: wgpu::BufferUsages::UNIFORM,
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("load_texels"),
        layout: &layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: output.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: params.as_entire_binding(),
            },
        ],
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("load_texels"),
    });
    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("load_texels"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(extent.width, extent.height, extent.depth_or_array_layers);
    }
    encoder.copy_buffer_to_buffer(&output, 0, &staging, 0, output_size);
    ctx.queue.submit(Some(encoder.finish()));

    let bytes = map_read(device, &staging)?;
    let floats: &[f32] = bytemuck::cast_slice(&bytes);
    Ok(floats
        .chunks_exact(4)
        .map(|t| [t[0] as f64, t[1] as f64, t[2] as f64, t[3] as f64])
        .collect())
}

/// Run a full-screen equality test against the depth or stencil aspect of one
/// subresource. Each texel passes when every sample passes.
pub(crate) fn compare_texels(
    ctx: &GraphicsContext,
    texture: &wgpu::Texture,
    info: &TextureInfo,
    format: &FormatInfo,
    level: u32,
    layer: u32,
    method: ReadMethod,
    reference: &TexelComponents,
) -> Result<Vec<bool>, DeviceError> {
    if info.dimension != wgpu::TextureDimension::D2 {
        return Err(DeviceError::unsupported("depth and stencil tests need a 2D texture"));
    }

    let device = &ctx.device;
    let extent = info.subresource_extent(level);
    let target_format = wgpu::TextureFormat::R8Unorm;

    let (depth_compare, stencil) = match method {
        ReadMethod::DepthTest => (wgpu::CompareFunction::Equal, wgpu::StencilState::default()),
        ReadMethod::StencilTest => {
            let face = wgpu::StencilFaceState {
                compare: wgpu::CompareFunction::Equal,
                fail_op: wgpu::StencilOperation::Keep,
                depth_fail_op: wgpu::StencilOperation::Keep,
                pass_op: wgpu::StencilOperation::Keep,
            };
            (
                wgpu::CompareFunction::Always,
                wgpu::StencilState {
                    front: face,
                    back: face,
                    read_mask: 0xff,
                    write_mask: 0,
                },
            )
        }
        other => {
            return Err(DeviceError::Validation(format!(
                "{} is not a comparison read",
                other
            )));
        }
    };

    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("compare_texels"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(COMPARE_SHADER)),
    });

    let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("compare_texels"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("compare_texels"),
        bind_group_layouts: &[&layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("compare_texels"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[],
        },
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: Some(wgpu::DepthStencilState {
            format: info.format,
            depth_write_enabled: false,
            depth_compare,
            stencil,
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: info.sample_count,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: target_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        multiview: None,
        cache: None,
    });

    let target_desc = |label, sample_count, usage| wgpu::TextureDescriptor {
        label: Some(label),
        size: extent,
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: target_format,
        usage,
        view_formats: &[],
    };
    let resolved = device.create_texture(&target_desc(
        "compare_resolved",
        1,
        wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
    ));
    let multisampled = info.is_multisampled().then(|| {
        device.create_texture(&target_desc(
            "compare_multisampled",
            info.sample_count,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        ))
    });

    let resolved_view = resolved.create_view(&wgpu::TextureViewDescriptor::default());
    let multisampled_view = multisampled
        .as_ref()
        .map(|texture| texture.create_view(&wgpu::TextureViewDescriptor::default()));
    let (color_view, resolve_target) = match &multisampled_view {
        Some(view) => (view, Some(&resolved_view)),
        None => (&resolved_view, None),
    };

    let attachment_view = texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("compare_attachment"),
        dimension: Some(wgpu::TextureViewDimension::D2),
        base_mip_level: level,
        mip_level_count: Some(1),
        base_array_layer: layer,
        array_layer_count: Some(1),
        ..Default::default()
    });

    let params = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("compare_params"),
        contents: bytemuck::bytes_of(&CompareParams {
            depth: reference.depth,
            _pad: [0.0; 3],
        }),
        usage: wgpu::BufferUsages::UNIFORM,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("compare_texels"),
        layout: &layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: params.as_entire_binding(),
        }],
    });

    let keep = wgpu::Operations {
        load: wgpu::LoadOp::Load,
        store: wgpu::StoreOp::Store,
    };

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("compare_texels"),
    });
    {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("compare_texels"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                depth_slice: None,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &attachment_view,
                depth_ops: format.has_depth().then_some(keep),
                stencil_ops: format.has_stencil().then_some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
            }),
            ..Default::default()
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.set_stencil_reference(reference.stencil);
        pass.draw(0..3, 0..1);
    }

    let readback = SubresourceReadback::encode(
        device,
        &mut encoder,
        wgpu::TexelCopyTextureInfo {
            texture: &resolved,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        extent,
    )?;
    ctx.queue.submit(Some(encoder.finish()));

    let bytes = readback.read(device)?;
    Ok(bytes.into_iter().map(|value| value == u8::MAX).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_shader_substitutes_texture_and_load() {
        let source = load_shader("texture_3d<u32>", "textureLoad(src, vec3<i32>(id), 0)");
        assert!(source.contains("var src: texture_3d<u32>;"));
        assert!(source.contains("vec4<f32>(textureLoad(src, vec3<i32>(id), 0))"));
    }

    #[test]
    fn test_uniform_layouts_are_16_byte_multiples() {
        assert_eq!(std::mem::size_of::<LoadParams>() % 16, 0);
        assert_eq!(std::mem::size_of::<CompareParams>(), 16);
    }
}
