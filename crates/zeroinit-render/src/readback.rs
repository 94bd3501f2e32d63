//! GPU readback of texture subresources and probe buffers.
//!
//! Copies into a buffer must use rows aligned to
//! [`wgpu::COPY_BYTES_PER_ROW_ALIGNMENT`]; [`SubresourceReadback`] pads on the
//! way out and strips the padding on the way back, so callers always see
//! tightly packed texels.

/// GPU readback error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadbackError {
    /// Buffer mapping failed
    MapFailed(String),
    /// Invalid dimensions
    InvalidDimensions,
    /// Unsupported format
    UnsupportedFormat,
}

impl std::fmt::Display for ReadbackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MapFailed(msg) => write!(f, "Buffer mapping failed: {}", msg),
            Self::InvalidDimensions => write!(f, "Invalid dimensions for readback"),
            Self::UnsupportedFormat => write!(f, "Unsupported texture format for readback"),
        }
    }
}

impl std::error::Error for ReadbackError {}

impl From<ReadbackError> for zeroinit_test_utils::DeviceError {
    fn from(err: ReadbackError) -> Self {
        match &err {
            ReadbackError::MapFailed(msg) => Self::MapFailed(msg.clone()),
            ReadbackError::UnsupportedFormat => Self::unsupported(err.to_string()),
            ReadbackError::InvalidDimensions => Self::Validation(err.to_string()),
        }
    }
}

/// Row pitch to use for a buffer copy of `unpadded` bytes per row.
#[inline]
pub fn padded_bytes_per_row(unpadded: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Map `buffer` for reading, wait for the device, and copy its contents out.
pub fn map_read(device: &wgpu::Device, buffer: &wgpu::Buffer) -> Result<Vec<u8>, ReadbackError> {
    let slice = buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();

    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });

    device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        })
        .map_err(|e| ReadbackError::MapFailed(e.to_string()))?;

    rx.recv()
        .map_err(|e| ReadbackError::MapFailed(e.to_string()))?
        .map_err(|e| ReadbackError::MapFailed(e.to_string()))?;

    let data = slice.get_mapped_range().to_vec();
    buffer.unmap();
    Ok(data)
}

/// Staging buffer holding one copied subresource.
pub struct SubresourceReadback {
    buffer: wgpu::Buffer,
    /// Width and height in texels, depth in images.
    extent: wgpu::Extent3d,
    /// Bytes per row (with padding)
    bytes_per_row: u32,
    bytes_per_texel: u32,
}

impl SubresourceReadback {
    /// Record a copy of `extent` texels at `source` into a new staging buffer.
    ///
    /// The copy only happens once `encoder` is submitted.
    pub fn encode(
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        source: wgpu::TexelCopyTextureInfo<'_>,
        extent: wgpu::Extent3d,
    ) -> Result<Self, ReadbackError> {
        if extent.width == 0 || extent.height == 0 || extent.depth_or_array_layers == 0 {
            return Err(ReadbackError::InvalidDimensions);
        }

        let bytes_per_texel = source
            .texture
            .format()
            .block_copy_size(Some(source.aspect))
            .ok_or(ReadbackError::UnsupportedFormat)?;

        let bytes_per_row = padded_bytes_per_row(extent.width * bytes_per_texel);
        let size = bytes_per_row as u64
            * extent.height as u64
            * extent.depth_or_array_layers as u64;

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("subresource_readback"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        encoder.copy_texture_to_buffer(
            source,
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(extent.height),
                },
            },
            extent,
        );

        Ok(Self {
            buffer,
            extent,
            bytes_per_row,
            bytes_per_texel,
        })
    }

    /// Read the copied texels (blocking), with row padding removed.
    pub fn read(&self, device: &wgpu::Device) -> Result<Vec<u8>, ReadbackError> {
        let data = map_read(device, &self.buffer)?;
        Ok(depad(
            &data,
            self.extent,
            self.bytes_per_row,
            self.extent.width * self.bytes_per_texel,
        ))
    }
}

fn depad(data: &[u8], extent: wgpu::Extent3d, padded: u32, unpadded: u32) -> Vec<u8> {
    let rows = extent.height as usize * extent.depth_or_array_layers as usize;
    let mut result = Vec::with_capacity(rows * unpadded as usize);
    for row in 0..rows {
        let start = row * padded as usize;
        result.extend_from_slice(&data[start..start + unpadded as usize]);
    }
    result
}
