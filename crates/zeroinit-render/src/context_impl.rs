//! [`TextureDevice`] implementation for [`GraphicsContext`].
//!
//! Every call runs inside an out-of-memory and a validation error scope, so
//! wgpu errors come back as [`DeviceError`] values instead of reaching the
//! uncaptured error handler.

use std::ops::Range;

use wgpu::util::DeviceExt;
use zeroinit_core::profiling::profile_function;
use zeroinit_core::{FormatInfo, ReadMethod, TexelComponents, format_info};
use zeroinit_test_utils::{
    DeviceError, GpuTexture, Observation, ReadRequest, TextureCommand, TextureDevice, TextureInfo,
};

use crate::context::GraphicsContext;
use crate::probe;
use crate::readback::{SubresourceReadback, padded_bytes_per_row};

fn lookup(format: wgpu::TextureFormat) -> Result<&'static FormatInfo, DeviceError> {
    format_info(format)
        .ok_or_else(|| DeviceError::unsupported(format!("{:?} is not in the format table", format)))
}

fn real_texture(texture: &GpuTexture) -> Result<&wgpu::Texture, DeviceError> {
    texture
        .as_wgpu()
        .ok_or_else(|| DeviceError::Validation("mock texture passed to a wgpu device".into()))
}

fn scope_error(error: wgpu::Error, requested: u64) -> DeviceError {
    match error {
        wgpu::Error::OutOfMemory { .. } => DeviceError::OutOfMemory { requested },
        wgpu::Error::Validation { description, .. } => DeviceError::Validation(description),
        other => DeviceError::Validation(other.to_string()),
    }
}

/// Load or store behavior of a single-subresource render pass.
#[derive(Clone, Copy)]
enum PassOp {
    Clear(TexelComponents),
    Discard,
}

impl GraphicsContext {
    /// Run `f` inside error scopes. `requested` is the allocation size
    /// reported if the out-of-memory scope catches anything.
    fn scoped<T>(
        &self,
        requested: u64,
        f: impl FnOnce() -> Result<T, DeviceError>,
    ) -> Result<T, DeviceError> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let result = f();
        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());

        if let Some(error) = out_of_memory {
            return Err(scope_error(error, requested));
        }
        if let Some(error) = validation {
            return Err(scope_error(error, requested));
        }
        result
    }

    fn encode_copy_fill(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        texture: &wgpu::Texture,
        info: &TextureInfo,
        format: &FormatInfo,
        level: u32,
        layers: &Range<u32>,
        value: &TexelComponents,
    ) -> Result<(), DeviceError> {
        let aspect = format.copy_aspect();
        let texel = format.encode(aspect, value).ok_or_else(|| {
            DeviceError::unsupported(format!("{:?} cannot be written by copy", info.format))
        })?;

        let size = info.mip_size(level);
        let (origin_z, images) = match info.dimension {
            wgpu::TextureDimension::D3 => (0, size.depth_or_array_layers),
            _ => (layers.start, layers.end - layers.start),
        };

        let bytes_per_row = padded_bytes_per_row(size.width * texel.len() as u32);
        let mut row = texel.repeat(size.width as usize);
        row.resize(bytes_per_row as usize, 0);
        let contents = row.repeat((size.height * images) as usize);

        let upload = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("copy_fill"),
                contents: &contents,
                usage: wgpu::BufferUsages::COPY_SRC,
            });

        encoder.copy_buffer_to_texture(
            wgpu::TexelCopyBufferInfo {
                buffer: &upload,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(size.height),
                },
            },
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: level,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: 0,
                    z: origin_z,
                },
                aspect,
            },
            wgpu::Extent3d {
                depth_or_array_layers: images,
                ..size
            },
        );
        Ok(())
    }

    fn encode_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        texture: &wgpu::Texture,
        info: &TextureInfo,
        format: &FormatInfo,
        level: u32,
        layer: u32,
        op: PassOp,
    ) -> Result<(), DeviceError> {
        if info.dimension == wgpu::TextureDimension::D3 {
            return Err(DeviceError::unsupported(
                "render passes over 3D textures are not supported",
            ));
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("subresource_pass"),
            dimension: Some(wgpu::TextureViewDimension::D2),
            base_mip_level: level,
            mip_level_count: Some(1),
            base_array_layer: layer,
            array_layer_count: Some(1),
            ..Default::default()
        });

        let store = match op {
            PassOp::Clear(_) => wgpu::StoreOp::Store,
            PassOp::Discard => wgpu::StoreOp::Discard,
        };

        let color = format.has_color().then(|| {
            let [r, g, b, a] = match op {
                PassOp::Clear(value) => value.color,
                PassOp::Discard => [0.0; 4],
            };
            wgpu::RenderPassColorAttachment {
                view: &view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: match op {
                        PassOp::Clear(_) => wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        PassOp::Discard => wgpu::LoadOp::Load,
                    },
                    store,
                },
            }
        });

        let depth_stencil = (!format.has_color()).then(|| wgpu::RenderPassDepthStencilAttachment {
            view: &view,
            depth_ops: format.has_depth().then(|| wgpu::Operations {
                load: match op {
                    PassOp::Clear(value) => wgpu::LoadOp::Clear(value.depth),
                    PassOp::Discard => wgpu::LoadOp::Load,
                },
                store,
            }),
            stencil_ops: format.has_stencil().then(|| wgpu::Operations {
                load: match op {
                    PassOp::Clear(value) => wgpu::LoadOp::Clear(value.stencil),
                    PassOp::Discard => wgpu::LoadOp::Load,
                },
                store,
            }),
        });

        let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("subresource_pass"),
            color_attachments: &[color],
            depth_stencil_attachment: depth_stencil,
            ..Default::default()
        });
        Ok(())
    }

    /// Copy one subresource (or an intermediate copy of it) to the host.
    fn read_bytes(
        &self,
        texture: &wgpu::Texture,
        info: &TextureInfo,
        request: &ReadRequest,
    ) -> Result<Vec<u8>, DeviceError> {
        let extent = info.subresource_extent(request.level);
        let origin_z = match info.dimension {
            wgpu::TextureDimension::D3 => 0,
            _ => request.layer,
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("read_bytes"),
            });

        let intermediate = match request.method {
            ReadMethod::CopyToTexture => {
                let copy = self.device.create_texture(&wgpu::TextureDescriptor {
                    label: Some("read_bytes_intermediate"),
                    size: extent,
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: info.dimension,
                    format: info.format,
                    usage: wgpu::TextureUsages::COPY_DST | wgpu::TextureUsages::COPY_SRC,
                    view_formats: &[],
                });
                encoder.copy_texture_to_texture(
                    wgpu::TexelCopyTextureInfo {
                        texture,
                        mip_level: request.level,
                        origin: wgpu::Origin3d {
                            x: 0,
                            y: 0,
                            z: origin_z,
                        },
                        aspect: wgpu::TextureAspect::All,
                    },
                    wgpu::TexelCopyTextureInfo {
                        texture: &copy,
                        mip_level: 0,
                        origin: wgpu::Origin3d::ZERO,
                        aspect: wgpu::TextureAspect::All,
                    },
                    extent,
                );
                Some(copy)
            }
            _ => None,
        };

        let source = match &intermediate {
            Some(copy) => wgpu::TexelCopyTextureInfo {
                texture: copy,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: request.aspect,
            },
            None => wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: request.level,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: 0,
                    z: origin_z,
                },
                aspect: request.aspect,
            },
        };

        let readback = SubresourceReadback::encode(&self.device, &mut encoder, source, extent)?;
        self.queue.submit(Some(encoder.finish()));
        let bytes = readback.read(&self.device)?;

        if let Some(copy) = intermediate {
            copy.destroy();
        }
        Ok(bytes)
    }
}

impl TextureDevice for GraphicsContext {
    fn adapter_name(&self) -> String {
        self.info().name
    }

    fn check_support(
        &self,
        desc: &wgpu::TextureDescriptor<'_>,
        method: ReadMethod,
    ) -> Result<(), DeviceError> {
        let format = lookup(desc.format)?;

        if let Some(feature) = format.feature
            && !self.wgpu_features().contains(feature)
        {
            return Err(DeviceError::unsupported(format!(
                "{:?} needs {:?}",
                desc.format, feature
            )));
        }

        if !self.supports_texture_format(desc.format, desc.usage) {
            return Err(DeviceError::unsupported(format!(
                "{:?} does not allow {:?}",
                desc.format, desc.usage
            )));
        }

        if !self.supports_sample_count(desc.format, desc.sample_count) {
            return Err(DeviceError::unsupported(format!(
                "{:?} cannot have {} samples",
                desc.format, desc.sample_count
            )));
        }

        match method {
            ReadMethod::Storage | ReadMethod::ColorBlending => Err(DeviceError::unsupported(
                format!("{} reads are not implemented on this backend", method),
            )),
            ReadMethod::Sample if !format.has_color() => Err(DeviceError::unsupported(
                "sampling depth or stencil aspects is not probed",
            )),
            _ => Ok(()),
        }
    }

    fn create_texture(&self, desc: &wgpu::TextureDescriptor<'_>) -> Result<GpuTexture, DeviceError> {
        profile_function!();
        let requested = TextureInfo::from_descriptor(desc).approximate_bytes();
        let texture = self.scoped(requested, || Ok(self.device.create_texture(desc)))?;
        tracing::trace!(format = ?desc.format, requested, "created texture");
        Ok(GpuTexture::from_wgpu(texture))
    }

    fn submit(&self, texture: &GpuTexture, commands: &[TextureCommand]) -> Result<(), DeviceError> {
        profile_function!();
        let target = real_texture(texture)?;
        let info = texture.info();
        let format = lookup(info.format)?;

        self.scoped(0, || {
            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("texture_commands"),
                });

            for command in commands {
                match command {
                    TextureCommand::CopyFill {
                        level,
                        layers,
                        value,
                    } => self.encode_copy_fill(
                        &mut encoder,
                        target,
                        info,
                        format,
                        *level,
                        layers,
                        value,
                    )?,
                    TextureCommand::ClearFill {
                        level,
                        layer,
                        value,
                    } => self.encode_pass(
                        &mut encoder,
                        target,
                        info,
                        format,
                        *level,
                        *layer,
                        PassOp::Clear(*value),
                    )?,
                    TextureCommand::Discard { level, layer } => self.encode_pass(
                        &mut encoder,
                        target,
                        info,
                        format,
                        *level,
                        *layer,
                        PassOp::Discard,
                    )?,
                }
            }

            self.queue.submit(Some(encoder.finish()));
            Ok(())
        })
    }

    fn read(&self, texture: &GpuTexture, request: &ReadRequest) -> Result<Observation, DeviceError> {
        profile_function!();
        let target = real_texture(texture)?;
        let info = texture.info();
        let format = lookup(info.format)?;

        self.scoped(0, || match request.method {
            ReadMethod::CopyToBuffer | ReadMethod::CopyToTexture => self
                .read_bytes(target, info, request)
                .map(Observation::Bytes),
            ReadMethod::Sample => {
                probe::load_texels(self, target, info, format, request.level, request.layer)
                    .map(Observation::Texels)
            }
            ReadMethod::DepthTest | ReadMethod::StencilTest => probe::compare_texels(
                self,
                target,
                info,
                format,
                request.level,
                request.layer,
                request.method,
                &request.reference,
            )
            .map(Observation::Comparisons),
            ReadMethod::Storage | ReadMethod::ColorBlending => Err(DeviceError::unsupported(
                format!("{} reads are not implemented on this backend", request.method),
            )),
        })
    }

    fn destroy_texture(&self, texture: &GpuTexture) {
        if let Some(texture) = texture.as_wgpu() {
            texture.destroy();
        }
    }

    fn reclaim(&self) {
        if let Err(e) = self.device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        }) {
            tracing::warn!("Device poll during reclaim failed: {}", e);
        }
    }
}
