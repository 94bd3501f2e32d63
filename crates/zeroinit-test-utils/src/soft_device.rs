//! In-memory reference implementation of [`TextureDevice`].
//!
//! `SoftDevice` keeps one logical value per subresource instead of real texel
//! memory. Every write the oracle issues covers a whole subresource with one
//! value, so this is enough to answer every read exactly. A subresource that
//! was never written reads as zero, the way the real API promises.
//!
//! Usage and format rules are enforced the way wgpu validation does, so a case
//! that asks for an illegal combination fails here too. Faults can be injected
//! to check that the oracle notices a broken implementation.

use std::ops::Range;

use parking_lot::Mutex;
use wgpu::{TextureDescriptor, TextureDimension, TextureFormat, TextureUsages};
use zeroinit_core::alloc::HashMap;
use zeroinit_core::{FormatInfo, ReadMethod, TexelComponents, format_info};

use crate::device::{DeviceError, Observation, ReadRequest, TextureCommand, TextureDevice};
use crate::gpu_types::{GpuTexture, TextureInfo};

/// What an uninitialized subresource holds under [`SoftFault::GarbageOnCreate`].
///
/// Non-zero after encoding in every format of the table.
pub const GARBAGE: TexelComponents = TexelComponents {
    color: [3.0; 4],
    depth: 0.5,
    stencil: 7,
};

/// Records a device call for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    CreateTexture {
        id: usize,
        format: TextureFormat,
        usage: TextureUsages,
        mip_level_count: u32,
        sample_count: u32,
    },
    CopyFill {
        id: usize,
        level: u32,
        layers: Range<u32>,
    },
    ClearFill {
        id: usize,
        level: u32,
        layer: u32,
    },
    Discard {
        id: usize,
        level: u32,
        layer: u32,
    },
    Read {
        id: usize,
        level: u32,
        layer: u32,
        method: ReadMethod,
    },
    DestroyTexture {
        id: usize,
    },
    Reclaim,
}

/// Deliberate misbehaviour, for testing that checks catch it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftFault {
    /// New textures hold [`GARBAGE`] instead of zero.
    GarbageOnCreate,
    /// A discard leaves the previous contents in place.
    KeepContentsOnDiscard,
    /// A discard of layer `n` also zeroes layer `n + 1`.
    DiscardSpillsToNextLayer,
}

#[derive(Debug)]
struct SoftTexture {
    info: TextureInfo,
    /// Keyed by `(level, layer)`. Absent means never written.
    contents: HashMap<(u32, u32), TexelComponents>,
    garbage: bool,
}

impl SoftTexture {
    fn value(&self, level: u32, layer: u32) -> TexelComponents {
        match self.contents.get(&(level, layer)) {
            Some(value) => *value,
            None if self.garbage => GARBAGE,
            None => TexelComponents::ZERO,
        }
    }

    fn check_subresource(&self, level: u32, layers: &Range<u32>) -> Result<(), DeviceError> {
        if level >= self.info.mip_level_count || layers.end > self.info.array_layer_count() {
            return Err(DeviceError::Validation(format!(
                "subresource level {} layers {:?} is outside the texture",
                level, layers
            )));
        }
        Ok(())
    }

    fn require_usage(&self, usage: TextureUsages, what: &str) -> Result<(), DeviceError> {
        if self.info.usage.contains(usage) {
            Ok(())
        } else {
            Err(DeviceError::Validation(format!(
                "{} requires {:?} usage",
                what, usage
            )))
        }
    }
}

#[derive(Debug, Default)]
struct SoftState {
    textures: HashMap<usize, SoftTexture>,
    next_id: usize,
}

/// In-memory texture device.
///
/// # Example
///
/// ```rust
/// use zeroinit_test_utils::{SoftDevice, TextureDevice};
/// use wgpu::*;
///
/// let device = SoftDevice::new();
/// let texture = device
///     .create_texture(&TextureDescriptor {
///         label: None,
///         size: Extent3d { width: 4, height: 4, depth_or_array_layers: 1 },
///         mip_level_count: 1,
///         sample_count: 1,
///         dimension: TextureDimension::D2,
///         format: TextureFormat::Rgba8Unorm,
///         usage: TextureUsages::COPY_SRC,
///         view_formats: &[],
///     })
///     .unwrap();
///
/// assert!(texture.is_mock());
/// assert_eq!(device.count_texture_creates(), 1);
/// ```
pub struct SoftDevice {
    calls: Mutex<Vec<DeviceCall>>,
    state: Mutex<SoftState>,
    unsupported_formats: Vec<TextureFormat>,
    unsupported_reads: Vec<ReadMethod>,
    memory_budget: Option<u64>,
    faults: Vec<SoftFault>,
}

impl SoftDevice {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            state: Mutex::new(SoftState::default()),
            unsupported_formats: Vec::new(),
            unsupported_reads: Vec::new(),
            memory_budget: None,
            faults: Vec::new(),
        }
    }

    /// Report `format` as unsupported, as if a feature were missing.
    pub fn with_unsupported_format(mut self, format: TextureFormat) -> Self {
        self.unsupported_formats.push(format);
        self
    }

    /// Report reads through `method` as unsupported.
    pub fn with_unsupported_read(mut self, method: ReadMethod) -> Self {
        self.unsupported_reads.push(method);
        self
    }

    /// Fail creation with [`DeviceError::OutOfMemory`] once live textures
    /// would exceed `bytes`.
    pub fn with_memory_budget(mut self, bytes: u64) -> Self {
        self.memory_budget = Some(bytes);
        self
    }

    pub fn with_fault(mut self, fault: SoftFault) -> Self {
        self.faults.push(fault);
        self
    }

    fn has_fault(&self, fault: SoftFault) -> bool {
        self.faults.contains(&fault)
    }

    /// Get a copy of all recorded calls (for test assertions).
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.lock().clone()
    }

    fn count(&self, predicate: impl Fn(&DeviceCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| predicate(call)).count()
    }

    pub fn count_texture_creates(&self) -> usize {
        self.count(|call| matches!(call, DeviceCall::CreateTexture { .. }))
    }

    pub fn count_copy_fills(&self) -> usize {
        self.count(|call| matches!(call, DeviceCall::CopyFill { .. }))
    }

    pub fn count_clear_fills(&self) -> usize {
        self.count(|call| matches!(call, DeviceCall::ClearFill { .. }))
    }

    pub fn count_discards(&self) -> usize {
        self.count(|call| matches!(call, DeviceCall::Discard { .. }))
    }

    pub fn count_reads(&self) -> usize {
        self.count(|call| matches!(call, DeviceCall::Read { .. }))
    }

    pub fn count_reclaims(&self) -> usize {
        self.count(|call| matches!(call, DeviceCall::Reclaim))
    }

    /// Textures created and not yet destroyed.
    pub fn live_textures(&self) -> usize {
        self.state.lock().textures.len()
    }

    /// Clear recorded calls (useful between test steps).
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Get total number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn record(&self, call: DeviceCall) {
        tracing::trace!(?call, "soft device call");
        self.calls.lock().push(call);
    }
}

impl Default for SoftDevice {
    fn default() -> Self {
        Self::new()
    }
}

fn lookup_format(format: TextureFormat) -> Result<&'static FormatInfo, DeviceError> {
    format_info(format).ok_or_else(|| DeviceError::unsupported(format!("{:?} is not tabled", format)))
}

fn mock_id(texture: &GpuTexture) -> Result<usize, DeviceError> {
    texture.mock_id().ok_or(DeviceError::UnknownTexture(usize::MAX))
}

fn validate_descriptor(desc: &TextureDescriptor<'_>, info: &FormatInfo) -> Result<(), DeviceError> {
    let invalid = |msg: String| Err(DeviceError::Validation(msg));
    let usage = desc.usage;

    if desc.mip_level_count == 0 || desc.mip_level_count > desc.size.max_mips(desc.dimension) {
        return invalid(format!("invalid mip level count {}", desc.mip_level_count));
    }
    if desc.sample_count != 1 && desc.sample_count != 4 {
        return invalid(format!("invalid sample count {}", desc.sample_count));
    }
    if usage.contains(TextureUsages::RENDER_ATTACHMENT) && !info.renderable {
        return invalid(format!("{:?} is not renderable", desc.format));
    }
    if usage.contains(TextureUsages::STORAGE_BINDING) && !info.storage {
        return invalid(format!("{:?} does not support storage", desc.format));
    }
    if usage.contains(TextureUsages::COPY_DST) && !info.copy_dst {
        return invalid(format!("{:?} cannot be a copy destination", desc.format));
    }
    if usage.contains(TextureUsages::COPY_SRC) && !info.copy_src {
        return invalid(format!("{:?} cannot be a copy source", desc.format));
    }
    if desc.dimension == TextureDimension::D3 && (info.has_depth() || info.has_stencil()) {
        return invalid(format!("{:?} cannot be 3D", desc.format));
    }
    if desc.sample_count > 1 {
        if !info.multisample {
            return invalid(format!("{:?} cannot be multisampled", desc.format));
        }
        if !usage.contains(TextureUsages::RENDER_ATTACHMENT)
            || usage.contains(TextureUsages::STORAGE_BINDING)
        {
            return invalid("multisampled textures must be render attachments".into());
        }
        if desc.mip_level_count > 1
            || desc.dimension != TextureDimension::D2
            || desc.size.depth_or_array_layers > 1
        {
            return invalid("multisampled textures must be single-level, single-layer 2D".into());
        }
    }
    Ok(())
}

impl TextureDevice for SoftDevice {
    fn adapter_name(&self) -> String {
        "SoftDevice".to_string()
    }

    fn check_support(
        &self,
        desc: &TextureDescriptor<'_>,
        method: ReadMethod,
    ) -> Result<(), DeviceError> {
        let info = lookup_format(desc.format)?;
        if self.unsupported_formats.contains(&desc.format) {
            return Err(DeviceError::unsupported(format!(
                "{:?} is disabled on this device",
                desc.format
            )));
        }
        if desc.sample_count > 1 && !info.multisample {
            return Err(DeviceError::unsupported(format!(
                "{:?} does not support multisampling",
                desc.format
            )));
        }
        if self.unsupported_reads.contains(&method) {
            return Err(DeviceError::unsupported(format!("{} reads", method)));
        }
        Ok(())
    }

    fn create_texture(&self, desc: &TextureDescriptor<'_>) -> Result<GpuTexture, DeviceError> {
        let format = lookup_format(desc.format)?;
        validate_descriptor(desc, format)?;

        let info = TextureInfo::from_descriptor(desc);
        let requested = info.approximate_bytes();
        let mut state = self.state.lock();

        if let Some(budget) = self.memory_budget {
            let live: u64 = state
                .textures
                .values()
                .map(|texture| texture.info.approximate_bytes())
                .sum();
            if live + requested > budget {
                tracing::debug!(live, requested, budget, "soft device out of memory");
                return Err(DeviceError::OutOfMemory { requested });
            }
        }

        let id = state.next_id;
        state.next_id += 1;
        state.textures.insert(
            id,
            SoftTexture {
                info,
                contents: HashMap::default(),
                garbage: self.has_fault(SoftFault::GarbageOnCreate),
            },
        );
        drop(state);

        self.record(DeviceCall::CreateTexture {
            id,
            format: desc.format,
            usage: desc.usage,
            mip_level_count: desc.mip_level_count,
            sample_count: desc.sample_count,
        });
        Ok(GpuTexture::mock(id, info))
    }

    fn submit(&self, texture: &GpuTexture, commands: &[TextureCommand]) -> Result<(), DeviceError> {
        let id = mock_id(texture)?;
        let mut state = self.state.lock();
        let soft = state
            .textures
            .get_mut(&id)
            .ok_or(DeviceError::UnknownTexture(id))?;
        let format = lookup_format(soft.info.format)?;

        // A rejected command invalidates the whole batch.
        for command in commands {
            match command {
                TextureCommand::CopyFill { level, layers, .. } => {
                    soft.check_subresource(*level, layers)?;
                    soft.require_usage(TextureUsages::COPY_DST, "copy fill")?;
                    if soft.info.is_multisampled() {
                        return Err(DeviceError::Validation(
                            "cannot copy into a multisampled texture".into(),
                        ));
                    }
                    if !format.is_encodable(format.copy_aspect()) {
                        return Err(DeviceError::Validation(format!(
                            "{:?} has no copyable layout",
                            format.format
                        )));
                    }
                }
                TextureCommand::ClearFill { level, layer, .. }
                | TextureCommand::Discard { level, layer } => {
                    soft.check_subresource(*level, &(*layer..*layer + 1))?;
                    soft.require_usage(TextureUsages::RENDER_ATTACHMENT, "render pass")?;
                }
            }
        }

        let mut calls = Vec::with_capacity(commands.len());
        for command in commands {
            match command {
                TextureCommand::CopyFill {
                    level,
                    layers,
                    value,
                } => {
                    for layer in layers.clone() {
                        soft.contents.insert((*level, layer), *value);
                    }
                    calls.push(DeviceCall::CopyFill {
                        id,
                        level: *level,
                        layers: layers.clone(),
                    });
                }
                TextureCommand::ClearFill {
                    level,
                    layer,
                    value,
                } => {
                    soft.contents.insert((*level, *layer), *value);
                    calls.push(DeviceCall::ClearFill {
                        id,
                        level: *level,
                        layer: *layer,
                    });
                }
                TextureCommand::Discard { level, layer } => {
                    if !self.has_fault(SoftFault::KeepContentsOnDiscard) {
                        soft.contents.insert((*level, *layer), TexelComponents::ZERO);
                    }
                    if self.has_fault(SoftFault::DiscardSpillsToNextLayer)
                        && *layer + 1 < soft.info.array_layer_count()
                    {
                        soft.contents
                            .insert((*level, *layer + 1), TexelComponents::ZERO);
                    }
                    calls.push(DeviceCall::Discard {
                        id,
                        level: *level,
                        layer: *layer,
                    });
                }
            }
        }
        drop(state);

        for call in calls {
            self.record(call);
        }
        Ok(())
    }

    fn read(&self, texture: &GpuTexture, request: &ReadRequest) -> Result<Observation, DeviceError> {
        let id = mock_id(texture)?;
        let state = self.state.lock();
        let soft = state.textures.get(&id).ok_or(DeviceError::UnknownTexture(id))?;
        let format = lookup_format(soft.info.format)?;
        let level = request.level;

        soft.check_subresource(level, &(request.layer..request.layer + 1))?;

        let value = soft.value(level, request.layer);
        let texels = soft.info.texel_count(level);

        let observation = match request.method {
            ReadMethod::CopyToBuffer | ReadMethod::CopyToTexture => {
                soft.require_usage(TextureUsages::COPY_SRC, "copy read")?;
                if soft.info.is_multisampled() {
                    return Err(DeviceError::Validation(
                        "cannot copy from a multisampled texture".into(),
                    ));
                }
                let texel = format.encode(request.aspect, &value).ok_or_else(|| {
                    DeviceError::Validation(format!(
                        "{:?} aspect of {:?} cannot be copied",
                        request.aspect, format.format
                    ))
                })?;
                Observation::Bytes(texel.repeat(texels))
            }
            ReadMethod::Sample => {
                soft.require_usage(TextureUsages::TEXTURE_BINDING, "sampling")?;
                let samples = soft.info.sample_count as usize;
                Observation::Texels(vec![value.as_loaded(format); texels * samples])
            }
            ReadMethod::Storage => {
                soft.require_usage(TextureUsages::STORAGE_BINDING, "storage read")?;
                Observation::Texels(vec![value.as_loaded(format); texels])
            }
            ReadMethod::ColorBlending => {
                soft.require_usage(TextureUsages::RENDER_ATTACHMENT, "blend read")?;
                if !format.has_color() {
                    return Err(DeviceError::Validation("blending needs a color format".into()));
                }
                Observation::Texels(vec![value.as_loaded(format); texels])
            }
            ReadMethod::DepthTest => {
                soft.require_usage(TextureUsages::RENDER_ATTACHMENT, "depth test")?;
                if !format.has_depth() {
                    return Err(DeviceError::Validation("depth test needs a depth aspect".into()));
                }
                Observation::Comparisons(vec![value.depth == request.reference.depth; texels])
            }
            ReadMethod::StencilTest => {
                soft.require_usage(TextureUsages::RENDER_ATTACHMENT, "stencil test")?;
                if !format.has_stencil() {
                    return Err(DeviceError::Validation(
                        "stencil test needs a stencil aspect".into(),
                    ));
                }
                Observation::Comparisons(vec![value.stencil == request.reference.stencil; texels])
            }
        };
        drop(state);

        self.record(DeviceCall::Read {
            id,
            level,
            layer: request.layer,
            method: request.method,
        });
        Ok(observation)
    }

    fn destroy_texture(&self, texture: &GpuTexture) {
        let Some(id) = texture.mock_id() else {
            return;
        };
        if self.state.lock().textures.remove(&id).is_some() {
            self.record(DeviceCall::DestroyTexture { id });
        }
    }

    fn reclaim(&self) {
        self.record(DeviceCall::Reclaim);
    }
}
