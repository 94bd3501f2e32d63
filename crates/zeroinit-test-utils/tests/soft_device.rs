//! Behaviour of the in-memory reference device.

#![cfg(feature = "mock")]

use static_assertions::assert_impl_all;
use wgpu::*;
use zeroinit_core::{ReadMethod, TexelComponents};
use zeroinit_test_utils::{
    DeviceCall, DeviceError, GARBAGE, Observation, ReadRequest, SoftDevice, SoftFault,
    TextureCommand, TextureDevice,
};

assert_impl_all!(SoftDevice: Send, Sync);

const CANARY: TexelComponents = TexelComponents {
    color: [1.0; 4],
    depth: 0.8,
    stencil: 42,
};

fn desc(format: TextureFormat, layers: u32, usage: TextureUsages) -> TextureDescriptor<'static> {
    TextureDescriptor {
        label: None,
        size: Extent3d {
            width: 4,
            height: 4,
            depth_or_array_layers: layers,
        },
        mip_level_count: 2,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    }
}

fn copy_read(level: u32, layer: u32) -> ReadRequest {
    ReadRequest {
        level,
        layer,
        method: ReadMethod::CopyToBuffer,
        aspect: TextureAspect::All,
        reference: TexelComponents::ZERO,
    }
}

#[test]
fn unwritten_texture_reads_zero() {
    let device = SoftDevice::new();
    let texture = device
        .create_texture(&desc(TextureFormat::Rgba8Unorm, 1, TextureUsages::COPY_SRC))
        .unwrap();

    let level0 = device.read(&texture, &copy_read(0, 0)).unwrap();
    assert_eq!(level0, Observation::Bytes(vec![0; 4 * 4 * 4]));

    let level1 = device.read(&texture, &copy_read(1, 0)).unwrap();
    assert_eq!(level1, Observation::Bytes(vec![0; 2 * 2 * 4]));
}

#[test]
fn copy_fill_writes_only_named_layers() {
    let device = SoftDevice::new();
    let texture = device
        .create_texture(&desc(
            TextureFormat::R8Uint,
            4,
            TextureUsages::COPY_SRC | TextureUsages::COPY_DST,
        ))
        .unwrap();

    device
        .submit(
            &texture,
            &[TextureCommand::CopyFill {
                level: 0,
                layers: 1..3,
                value: CANARY,
            }],
        )
        .unwrap();

    let read = |layer| device.read(&texture, &copy_read(0, layer)).unwrap();
    assert_eq!(read(0), Observation::Bytes(vec![0; 16]));
    assert_eq!(read(1), Observation::Bytes(vec![1; 16]));
    assert_eq!(read(2), Observation::Bytes(vec![1; 16]));
    assert_eq!(read(3), Observation::Bytes(vec![0; 16]));
    assert_eq!(device.count_copy_fills(), 1);
}

#[test]
fn discard_restores_zero() {
    let device = SoftDevice::new();
    let texture = device
        .create_texture(&desc(
            TextureFormat::R8Unorm,
            1,
            TextureUsages::COPY_SRC | TextureUsages::RENDER_ATTACHMENT,
        ))
        .unwrap();

    device
        .submit(
            &texture,
            &[
                TextureCommand::ClearFill {
                    level: 0,
                    layer: 0,
                    value: CANARY,
                },
                TextureCommand::Discard { level: 0, layer: 0 },
            ],
        )
        .unwrap();

    assert_eq!(
        device.read(&texture, &copy_read(0, 0)).unwrap(),
        Observation::Bytes(vec![0; 16])
    );
    assert_eq!(device.count_clear_fills(), 1);
    assert_eq!(device.count_discards(), 1);
}

#[test]
fn rejected_batch_changes_nothing() {
    let device = SoftDevice::new();
    let texture = device
        .create_texture(&desc(
            TextureFormat::R8Unorm,
            1,
            TextureUsages::COPY_SRC | TextureUsages::COPY_DST,
        ))
        .unwrap();

    let result = device.submit(
        &texture,
        &[
            TextureCommand::CopyFill {
                level: 0,
                layers: 0..1,
                value: CANARY,
            },
            // No RENDER_ATTACHMENT usage.
            TextureCommand::Discard { level: 0, layer: 0 },
        ],
    );

    assert!(matches!(result, Err(DeviceError::Validation(_))));
    assert_eq!(
        device.read(&texture, &copy_read(0, 0)).unwrap(),
        Observation::Bytes(vec![0; 16])
    );
}

#[test]
fn illegal_usage_is_a_validation_error() {
    let device = SoftDevice::new();
    let result = device.create_texture(&desc(
        TextureFormat::R8Snorm,
        1,
        TextureUsages::RENDER_ATTACHMENT,
    ));
    assert!(matches!(result, Err(DeviceError::Validation(_))));

    let result = device.create_texture(&desc(
        TextureFormat::Depth24Plus,
        1,
        TextureUsages::COPY_SRC,
    ));
    assert!(matches!(result, Err(DeviceError::Validation(_))));
    assert_eq!(device.count_texture_creates(), 0);
}

#[test]
fn unsupported_format_is_reported_as_skip() {
    let device = SoftDevice::new().with_unsupported_format(TextureFormat::Depth32FloatStencil8);
    let result = device.check_support(
        &desc(TextureFormat::Depth32FloatStencil8, 1, TextureUsages::RENDER_ATTACHMENT),
        ReadMethod::DepthTest,
    );
    assert!(result.unwrap_err().is_skip());
}

#[test]
fn memory_budget_limits_live_textures() {
    // 4x4 + 2x2 texels of 4 bytes: 80 bytes per texture.
    let device = SoftDevice::new().with_memory_budget(100);
    let usage = TextureUsages::COPY_SRC;

    let first = device
        .create_texture(&desc(TextureFormat::Rgba8Unorm, 1, usage))
        .unwrap();
    let second = device.create_texture(&desc(TextureFormat::Rgba8Unorm, 1, usage));
    assert_eq!(second.unwrap_err(), DeviceError::OutOfMemory { requested: 80 });

    device.destroy_texture(&first);
    assert_eq!(device.live_textures(), 0);
    assert!(
        device
            .create_texture(&desc(TextureFormat::Rgba8Unorm, 1, usage))
            .is_ok()
    );
}

#[test]
fn garbage_fault_shows_through_reads() {
    let device = SoftDevice::new().with_fault(SoftFault::GarbageOnCreate);
    let texture = device
        .create_texture(&desc(
            TextureFormat::Rgba8Unorm,
            1,
            TextureUsages::TEXTURE_BINDING,
        ))
        .unwrap();

    let sample = ReadRequest {
        method: ReadMethod::Sample,
        ..copy_read(0, 0)
    };
    match device.read(&texture, &sample).unwrap() {
        Observation::Texels(texels) => {
            assert_eq!(texels.len(), 16);
            assert!(texels.iter().all(|t| *t == GARBAGE.color));
        }
        other => panic!("unexpected observation {:?}", other),
    }
}

#[test]
fn spilling_discard_zeroes_the_next_layer() {
    let device = SoftDevice::new().with_fault(SoftFault::DiscardSpillsToNextLayer);
    let texture = device
        .create_texture(&desc(
            TextureFormat::R8Unorm,
            2,
            TextureUsages::COPY_SRC | TextureUsages::RENDER_ATTACHMENT,
        ))
        .unwrap();

    device
        .submit(
            &texture,
            &[
                TextureCommand::ClearFill {
                    level: 0,
                    layer: 1,
                    value: CANARY,
                },
                TextureCommand::Discard { level: 0, layer: 0 },
            ],
        )
        .unwrap();

    assert_eq!(
        device.read(&texture, &copy_read(0, 1)).unwrap(),
        Observation::Bytes(vec![0; 16])
    );
}

#[test]
fn depth_test_compares_against_reference() {
    let device = SoftDevice::new();
    let texture = device
        .create_texture(&desc(
            TextureFormat::Depth32Float,
            1,
            TextureUsages::RENDER_ATTACHMENT,
        ))
        .unwrap();
    device
        .submit(
            &texture,
            &[TextureCommand::ClearFill {
                level: 0,
                layer: 0,
                value: CANARY,
            }],
        )
        .unwrap();

    let mut request = ReadRequest {
        method: ReadMethod::DepthTest,
        aspect: TextureAspect::DepthOnly,
        ..copy_read(0, 0)
    };
    assert_eq!(
        device.read(&texture, &request).unwrap(),
        Observation::Comparisons(vec![false; 16])
    );

    request.reference = CANARY;
    assert_eq!(
        device.read(&texture, &request).unwrap(),
        Observation::Comparisons(vec![true; 16])
    );
}

#[test]
fn calls_are_recorded_in_order() {
    let device = SoftDevice::new();
    let texture = device
        .create_texture(&desc(TextureFormat::R8Unorm, 1, TextureUsages::COPY_SRC))
        .unwrap();
    device.read(&texture, &copy_read(0, 0)).unwrap();
    device.destroy_texture(&texture);
    device.reclaim();

    let calls = device.calls();
    assert_eq!(calls.len(), 4);
    assert!(matches!(calls[0], DeviceCall::CreateTexture { id: 0, .. }));
    assert!(matches!(calls[1], DeviceCall::Read { id: 0, level: 0, .. }));
    assert_eq!(calls[2], DeviceCall::DestroyTexture { id: 0 });
    assert_eq!(calls[3], DeviceCall::Reclaim);

    device.clear_calls();
    assert_eq!(device.call_count(), 0);
}
