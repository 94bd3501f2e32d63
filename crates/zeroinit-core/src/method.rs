use std::fmt;

/// How the contents of a subresource are observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadMethod {
    /// Texels are loaded by a shader and written out as RGBA values.
    Sample,
    /// The subresource is copied into a buffer.
    CopyToBuffer,
    /// The subresource is copied into another texture, then into a buffer.
    CopyToTexture,
    /// The subresource is bound as a depth attachment and tested for equality.
    DepthTest,
    /// The subresource is bound as a stencil attachment and tested for equality.
    StencilTest,
    /// The subresource is bound as a color attachment under a pass-through blend.
    ColorBlending,
    /// The subresource is bound as a read-only storage texture.
    Storage,
}

impl ReadMethod {
    pub const ALL: [ReadMethod; 7] = [
        ReadMethod::CopyToBuffer,
        ReadMethod::CopyToTexture,
        ReadMethod::Sample,
        ReadMethod::DepthTest,
        ReadMethod::StencilTest,
        ReadMethod::ColorBlending,
        ReadMethod::Storage,
    ];

    /// Reads that return the raw bytes of the subresource.
    pub fn is_copy(self) -> bool {
        matches!(self, ReadMethod::CopyToBuffer | ReadMethod::CopyToTexture)
    }

    /// Reads that bind the texture as a render attachment.
    pub fn is_attachment(self) -> bool {
        matches!(
            self,
            ReadMethod::DepthTest | ReadMethod::StencilTest | ReadMethod::ColorBlending
        )
    }
}

impl fmt::Display for ReadMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How the subresources under test end up uninitialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UninitializeMethod {
    /// The texture was just created and never written.
    Creation,
    /// The subresource was written with canary data, then rendered to with a
    /// `Discard` store op.
    StoreOpDiscard,
}

impl UninitializeMethod {
    pub const ALL: [UninitializeMethod; 2] =
        [UninitializeMethod::Creation, UninitializeMethod::StoreOpDiscard];
}

impl fmt::Display for UninitializeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
