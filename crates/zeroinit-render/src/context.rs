use crate::features::GpuFeatures;
use std::fmt;
use std::sync::Arc;

/// Errors raised while bringing up a [`GraphicsContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// No adapter matched the descriptor.
    NoAdapter,
    /// The adapter refused to create a device.
    DeviceCreation(String),
    /// Required features the adapter lacks.
    MissingFeatures(GpuFeatures),
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAdapter => write!(f, "No suitable GPU adapter found"),
            Self::DeviceCreation(msg) => write!(f, "Failed to create device: {}", msg),
            Self::MissingFeatures(missing) => {
                write!(f, "Required GPU features are not supported: {:?}", missing)
            }
        }
    }
}

impl std::error::Error for GraphicsError {}

/// A shared graphics context.
///
/// # Ownership Pattern
///
/// ```rust,no_run
/// use zeroinit_render::GraphicsContext;
///
/// let ctx = GraphicsContext::new_owned_sync().unwrap(); // Returns Arc<Self>
/// let ctx2 = ctx.clone(); // Cheap clone (Arc)
/// ```
pub struct GraphicsContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    /// The GPU features that were enabled on this context.
    enabled_features: GpuFeatures,
}

impl GraphicsContext {
    /// Creates a new graphics context with default settings.
    pub async fn new_owned() -> Result<Arc<Self>, GraphicsError> {
        Self::new_owned_with_descriptor(GraphicsContextDescriptor::default()).await
    }

    /// Creates a new graphics context synchronously.
    ///
    /// This blocks the current thread until the context is created.
    pub fn new_owned_sync() -> Result<Arc<Self>, GraphicsError> {
        pollster::block_on(Self::new_owned())
    }

    /// Blocking variant of [`GraphicsContext::new_owned_with_descriptor`].
    pub fn new_owned_with_descriptor_sync(
        descriptor: GraphicsContextDescriptor,
    ) -> Result<Arc<Self>, GraphicsError> {
        pollster::block_on(Self::new_owned_with_descriptor(descriptor))
    }

    /// Creates a new graphics context with custom descriptor.
    pub async fn new_owned_with_descriptor(
        descriptor: GraphicsContextDescriptor,
    ) -> Result<Arc<Self>, GraphicsError> {
        let context = Self::create_context_internal(descriptor).await?;
        Ok(Arc::new(context))
    }

    async fn create_context_internal(
        descriptor: GraphicsContextDescriptor,
    ) -> Result<Self, GraphicsError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: descriptor.backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: descriptor.power_preference,
                compatible_surface: None,
                force_fallback_adapter: descriptor.force_fallback_adapter,
            })
            .await
            .map_err(|_| GraphicsError::NoAdapter)?;

        if let Some(missing) = descriptor
            .required_gpu_features
            .check_support(&adapter)
            .missing()
        {
            tracing::error!(
                "Adapter {:?} lacks required GPU features {:?}",
                adapter.get_info().name,
                missing
            );
            return Err(GraphicsError::MissingFeatures(missing));
        }

        // Determine which requested features are available
        let available_requested =
            descriptor.requested_gpu_features & GpuFeatures::from_wgpu(adapter.features());

        let unavailable_requested = descriptor.requested_gpu_features - available_requested;
        if !unavailable_requested.is_empty() {
            tracing::warn!(
                "Some requested GPU features are not available: {:?}",
                unavailable_requested
            );
        }

        let enabled_features = descriptor.required_gpu_features | available_requested;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: enabled_features.to_wgpu(),
                required_limits: descriptor.limits.clone(),
                label: descriptor.label,
                ..Default::default()
            })
            .await
            .map_err(|e| GraphicsError::DeviceCreation(e.to_string()))?;

        tracing::info!(
            "Created graphics context on {:?} with features: {:?}",
            adapter.get_info().name,
            enabled_features
        );

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            enabled_features,
        })
    }

    /// Get device info
    pub fn info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Get raw wgpu device features
    pub fn wgpu_features(&self) -> wgpu::Features {
        self.device.features()
    }

    /// Check if a specific GPU feature is enabled.
    pub fn has_feature(&self, feature: GpuFeatures) -> bool {
        self.enabled_features.contains(feature)
    }

    /// Check if a texture format is supported for the given usages.
    pub fn supports_texture_format(
        &self,
        format: wgpu::TextureFormat,
        usages: wgpu::TextureUsages,
    ) -> bool {
        self.texture_format_capabilities(format)
            .allowed_usages
            .contains(usages)
    }

    /// Whether `format` can be created with `sample_count` samples.
    pub fn supports_sample_count(&self, format: wgpu::TextureFormat, sample_count: u32) -> bool {
        sample_count == 1
            || self
                .texture_format_capabilities(format)
                .flags
                .sample_count_supported(sample_count)
    }

    /// Capabilities textures of `format` actually get on this device.
    ///
    /// The adapter's own table only applies once
    /// [`GpuFeatures::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES`] is enabled;
    /// otherwise the device validates against the WebGPU baseline.
    pub fn texture_format_capabilities(
        &self,
        format: wgpu::TextureFormat,
    ) -> wgpu::TextureFormatFeatures {
        format_capabilities(
            format,
            self.has_feature(GpuFeatures::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES),
            self.wgpu_features(),
            || self.adapter.get_texture_format_features(format),
        )
    }
}

fn format_capabilities(
    format: wgpu::TextureFormat,
    adapter_specific: bool,
    device_features: wgpu::Features,
    adapter: impl FnOnce() -> wgpu::TextureFormatFeatures,
) -> wgpu::TextureFormatFeatures {
    if adapter_specific {
        adapter()
    } else {
        format.guaranteed_format_features(device_features)
    }
}

/// Descriptor for configuring graphics context creation.
pub struct GraphicsContextDescriptor {
    /// GPU backends to use
    pub backends: wgpu::Backends,
    /// Power preference for adapter selection
    pub power_preference: wgpu::PowerPreference,
    /// Whether to force fallback adapter
    pub force_fallback_adapter: bool,
    /// Required GPU features (creation fails if not available).
    pub required_gpu_features: GpuFeatures,
    /// Requested GPU features (best-effort, logs warning if unavailable).
    ///
    /// Formats gated on a missing feature are skipped, not failed.
    pub requested_gpu_features: GpuFeatures,
    /// Required device limits
    pub limits: wgpu::Limits,
    /// Optional label for debugging
    pub label: Option<&'static str>,
}

impl Default for GraphicsContextDescriptor {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            required_gpu_features: GpuFeatures::empty(),
            requested_gpu_features: GpuFeatures::DEPTH32FLOAT_STENCIL8
                | GpuFeatures::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES,
            limits: wgpu::Limits::default(),
            label: Some("zeroinit"),
        }
    }
}

impl GraphicsContextDescriptor {
    /// Create a new descriptor with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set required GPU features.
    pub fn require_features(mut self, features: GpuFeatures) -> Self {
        self.required_gpu_features = features;
        self
    }

    /// Set requested GPU features (best-effort, warns if unavailable).
    pub fn request_features(mut self, features: GpuFeatures) -> Self {
        self.requested_gpu_features = features;
        self
    }

    /// Add additional requested features.
    pub fn with_requested_features(mut self, features: GpuFeatures) -> Self {
        self.requested_gpu_features |= features;
        self
    }

    /// Set the power preference.
    pub fn power_preference(mut self, preference: wgpu::PowerPreference) -> Self {
        self.power_preference = preference;
        self
    }

    /// Set the backends to use.
    pub fn backends(mut self, backends: wgpu::Backends) -> Self {
        self.backends = backends;
        self
    }

    /// Use the software fallback adapter, if the platform has one.
    pub fn force_fallback_adapter(mut self, force: bool) -> Self {
        self.force_fallback_adapter = force;
        self
    }

    /// Set the device limits.
    pub fn limits(mut self, limits: wgpu::Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the debug label.
    pub fn label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_builder() {
        let desc = GraphicsContextDescriptor::new()
            .require_features(GpuFeatures::DEPTH32FLOAT_STENCIL8)
            .request_features(GpuFeatures::empty())
            .force_fallback_adapter(true)
            .label("test");

        assert_eq!(desc.required_gpu_features, GpuFeatures::DEPTH32FLOAT_STENCIL8);
        assert!(desc.requested_gpu_features.is_empty());
        assert!(desc.force_fallback_adapter);
        assert_eq!(desc.label, Some("test"));
    }

    #[test]
    fn test_default_descriptor_requests_adapter_format_features() {
        let desc = GraphicsContextDescriptor::default();
        assert!(desc.requested_gpu_features.contains(
            GpuFeatures::DEPTH32FLOAT_STENCIL8 | GpuFeatures::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES
        ));
    }

    #[test]
    fn test_format_capabilities_use_baseline_without_adapter_features() {
        let format = wgpu::TextureFormat::Rgba8Unorm;
        let baseline = format.guaranteed_format_features(wgpu::Features::empty());

        let caps = format_capabilities(format, false, wgpu::Features::empty(), || {
            panic!("adapter table consulted without the feature")
        });
        assert_eq!(caps.allowed_usages, baseline.allowed_usages);
        assert_eq!(caps.flags, baseline.flags);
        assert!(caps.allowed_usages.contains(wgpu::TextureUsages::RENDER_ATTACHMENT));
    }

    #[test]
    fn test_format_capabilities_use_adapter_table_when_enabled() {
        let format = wgpu::TextureFormat::R32Float;
        let adapter = wgpu::TextureFormatFeatures {
            allowed_usages: wgpu::TextureUsages::all(),
            flags: wgpu::TextureFormatFeatureFlags::MULTISAMPLE_X4,
        };

        let caps = format_capabilities(format, true, wgpu::Features::empty(), || adapter);
        assert_eq!(caps.allowed_usages, wgpu::TextureUsages::all());
        assert!(caps.flags.sample_count_supported(4));
    }

    #[test]
    fn test_graphics_error_display() {
        let err = GraphicsError::MissingFeatures(GpuFeatures::DEPTH32FLOAT_STENCIL8);
        assert!(err.to_string().contains("DEPTH32FLOAT_STENCIL8"));
        assert_eq!(GraphicsError::NoAdapter.to_string(), "No suitable GPU adapter found");
    }
}
