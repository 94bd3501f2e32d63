//! End-to-end oracle scenarios on the in-memory device.

use wgpu::{TextureAspect, TextureFormat};
use zeroinit::{
    CaseError, CasePhase, Failure, InitStrategy, InitializedState, Outcome, SubresourcePartition,
    TexelValue, TextureZeroParams, ZeroInitCase, run_case,
};
use zeroinit_core::{ReadMethod, SubresourceRange, TexelComponents, UninitializeMethod};
use zeroinit_test_utils::{DeviceCall, Observation, ReadRequest, SoftDevice, TextureDevice};

fn copy_read(level: u32, layer: u32, aspect: TextureAspect) -> ReadRequest {
    ReadRequest {
        level,
        layer,
        method: ReadMethod::CopyToBuffer,
        aspect,
        reference: TexelComponents::ZERO,
    }
}

#[test]
fn fresh_single_subresource_copies_out_as_zero() {
    let device = SoftDevice::new();
    let params = TextureZeroParams::new(TextureFormat::Rgba8Unorm);

    let mut case = ZeroInitCase::new(&device, params).unwrap();
    assert!(case.execute().unwrap().is_empty());
    assert_eq!(case.phase(), CasePhase::Verified);

    let texture = case.texture().unwrap();
    let observation = device.read(texture, &copy_read(0, 0, TextureAspect::All)).unwrap();
    // 2x2 texels, 4 bytes each.
    assert_eq!(observation, Observation::Bytes(vec![0; 16]));
}

#[test]
fn explicit_ranges_read_zero_and_controls_keep_canary() {
    let device = SoftDevice::new();
    let params = TextureZeroParams {
        mip_level_count: 5,
        layer_count: 7,
        canary_on_creation: true,
        ..TextureZeroParams::new(TextureFormat::Rgba8Unorm)
    };
    let partition = SubresourcePartition::from_uninitialized(
        5,
        7,
        vec![
            SubresourceRange::new(0..2, 2..4),
            SubresourceRange::new(3..4, 6..7),
        ],
    );

    let mut case = ZeroInitCase::new(&device, params)
        .unwrap()
        .with_partition(partition);
    assert!(case.execute().unwrap().is_empty());

    // Every subresource is read exactly once.
    assert_eq!(device.count_reads(), 35);
    // One copy per run of control layers: levels 0 and 1 have two runs each.
    assert_eq!(device.count_copy_fills(), 7);

    let texture = case.texture().unwrap();
    for (level, layer, expected) in [(0, 2, 0u8), (1, 3, 0), (3, 6, 0), (0, 0, 0xff), (3, 5, 0xff)] {
        let Observation::Bytes(bytes) = device
            .read(texture, &copy_read(level, layer, TextureAspect::All))
            .unwrap()
        else {
            panic!("copy read did not return bytes");
        };
        assert!(bytes.iter().all(|&b| b == expected), "level {level} layer {layer}");
    }
}

#[test]
fn discard_erases_canary() {
    let device = SoftDevice::new();
    let params = TextureZeroParams {
        uninitialize_method: UninitializeMethod::StoreOpDiscard,
        ..TextureZeroParams::new(TextureFormat::Rgba8Unorm)
    };

    assert_eq!(run_case(&device, &params), Outcome::Pass);
    assert_eq!(device.count_copy_fills(), 1);
    assert_eq!(device.count_discards(), 1);

    let calls = device.calls();
    let fill = calls
        .iter()
        .position(|c| matches!(c, DeviceCall::CopyFill { .. }))
        .unwrap();
    let discard = calls
        .iter()
        .position(|c| matches!(c, DeviceCall::Discard { .. }))
        .unwrap();
    assert!(fill < discard);
}

#[test]
fn format_without_copy_dst_is_cleared_by_render_pass() {
    let device = SoftDevice::new();
    let params = TextureZeroParams {
        aspect: TextureAspect::DepthOnly,
        layer_count: 7,
        canary_on_creation: true,
        ..TextureZeroParams::new(TextureFormat::Depth32Float)
    };

    let mut case = ZeroInitCase::new(&device, params).unwrap();
    assert_eq!(case.strategy(), InitStrategy::RenderClear);
    assert!(case.execute().unwrap().is_empty());
    assert_eq!(device.count_copy_fills(), 0);
    // Layers 0, 1, 4 and 5 are controls.
    assert_eq!(device.count_clear_fills(), 4);

    let texture = case.texture().unwrap();
    let observation = device
        .read(texture, &copy_read(0, 0, TextureAspect::DepthOnly))
        .unwrap();
    assert_eq!(observation, Observation::Bytes(0.8f32.to_le_bytes().repeat(4)));
}

#[test]
fn copy_and_clear_strategies_leave_identical_bytes() {
    let device = SoftDevice::new();
    let params = TextureZeroParams {
        layer_count: 7,
        canary_on_creation: true,
        ..TextureZeroParams::new(TextureFormat::Rgba8Unorm)
    };

    let mut copied = ZeroInitCase::new(&device, params)
        .unwrap()
        .with_strategy(InitStrategy::Copy);
    let mut cleared = ZeroInitCase::new(&device, params)
        .unwrap()
        .with_strategy(InitStrategy::RenderClear);
    assert!(copied.execute().unwrap().is_empty());
    assert!(cleared.execute().unwrap().is_empty());
    assert!(device.count_copy_fills() > 0);
    assert!(device.count_clear_fills() > 0);

    for layer in 0..7 {
        let read = copy_read(0, layer, TextureAspect::All);
        assert_eq!(
            device.read(copied.texture().unwrap(), &read).unwrap(),
            device.read(cleared.texture().unwrap(), &read).unwrap(),
            "layer {layer}"
        );
    }
}

#[test]
fn clear_only_formats_read_like_copy_filled_formats() {
    let device = SoftDevice::new();
    // Each pair shares the tested aspect's layout; the first can only be cleared.
    for (cleared_format, copied_format, method, cleared_aspect, copied_aspect) in [
        (
            TextureFormat::Depth24PlusStencil8,
            TextureFormat::Stencil8,
            ReadMethod::StencilTest,
            TextureAspect::StencilOnly,
            TextureAspect::All,
        ),
        (
            TextureFormat::Depth32Float,
            TextureFormat::Depth16Unorm,
            ReadMethod::DepthTest,
            TextureAspect::DepthOnly,
            TextureAspect::DepthOnly,
        ),
    ] {
        let params = |format, aspect| TextureZeroParams {
            read_method: method,
            aspect,
            layer_count: 7,
            canary_on_creation: true,
            ..TextureZeroParams::new(format)
        };

        let mut cleared = ZeroInitCase::new(&device, params(cleared_format, cleared_aspect)).unwrap();
        let mut copied = ZeroInitCase::new(&device, params(copied_format, copied_aspect)).unwrap();
        assert_eq!(cleared.strategy(), InitStrategy::RenderClear, "{cleared_format:?}");
        assert!(!InitStrategy::Copy.is_available(
            zeroinit_core::format_info(cleared_format).unwrap(),
            1
        ));
        assert_eq!(copied.strategy(), InitStrategy::Copy, "{copied_format:?}");
        assert!(cleared.execute().unwrap().is_empty());
        assert!(copied.execute().unwrap().is_empty());

        // Layer 0 is a control holding canary in both textures.
        let canary = |format| {
            InitializedState::Canary.components(zeroinit_core::format_info(format).unwrap())
        };
        let read = |aspect, reference| ReadRequest {
            level: 0,
            layer: 0,
            method,
            aspect,
            reference,
        };
        let from_clear = device
            .read(cleared.texture().unwrap(), &read(cleared_aspect, canary(cleared_format)))
            .unwrap();
        let from_copy = device
            .read(copied.texture().unwrap(), &read(copied_aspect, canary(copied_format)))
            .unwrap();
        assert_eq!(from_clear, Observation::Comparisons(vec![true; 4]));
        assert_eq!(from_clear, from_copy, "{cleared_format:?} vs {copied_format:?}");
    }
}

#[test]
fn verify_is_idempotent() {
    let device = SoftDevice::new();
    let params = TextureZeroParams {
        mip_level_count: 5,
        layer_count: 7,
        canary_on_creation: true,
        uninitialize_method: UninitializeMethod::StoreOpDiscard,
        ..TextureZeroParams::new(TextureFormat::Rg16Float)
    };

    let mut case = ZeroInitCase::new(&device, params).unwrap();
    let first = case.execute().unwrap();
    let second = case.verify().unwrap();
    assert!(first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn shader_reads_cover_every_sample() {
    let device = SoftDevice::new();
    let params = TextureZeroParams {
        read_method: ReadMethod::Sample,
        sample_count: 4,
        canary_on_creation: true,
        ..TextureZeroParams::new(TextureFormat::Rgba8Unorm)
    };

    let mut case = ZeroInitCase::new(&device, params).unwrap();
    assert_eq!(case.strategy(), InitStrategy::RenderClear);
    assert!(case.execute().unwrap().is_empty());
}

#[test]
fn depth_and_stencil_tests_pass_on_a_conforming_device() {
    let device = SoftDevice::new();
    for (format, method, aspect) in [
        (TextureFormat::Depth16Unorm, ReadMethod::DepthTest, TextureAspect::DepthOnly),
        (TextureFormat::Depth24PlusStencil8, ReadMethod::StencilTest, TextureAspect::StencilOnly),
        (TextureFormat::Stencil8, ReadMethod::StencilTest, TextureAspect::All),
    ] {
        let params = TextureZeroParams {
            read_method: method,
            aspect,
            layer_count: 7,
            canary_on_creation: true,
            uninitialize_method: UninitializeMethod::StoreOpDiscard,
            ..TextureZeroParams::new(format)
        };
        assert_eq!(run_case(&device, &params), Outcome::Pass, "{format:?}");
    }
    assert_eq!(device.live_textures(), 0);
}

#[test]
fn phases_must_run_in_order() {
    let device = SoftDevice::new();
    let mut case =
        ZeroInitCase::new(&device, TextureZeroParams::new(TextureFormat::R8Unorm)).unwrap();

    assert_eq!(
        case.verify().unwrap_err(),
        CaseError::PhaseOrder {
            phase: CasePhase::Verified,
            actual: CasePhase::Planned,
        }
    );

    case.build().unwrap();
    assert!(matches!(case.build(), Err(CaseError::PhaseOrder { .. })));

    // Pre-initialization is optional.
    case.uninitialize().unwrap();
    assert!(matches!(case.pre_initialize(), Err(CaseError::PhaseOrder { .. })));
    assert!(case.verify().unwrap().is_empty());
}

#[test]
fn dropping_a_case_destroys_its_texture() {
    let device = SoftDevice::new();
    {
        let mut case =
            ZeroInitCase::new(&device, TextureZeroParams::new(TextureFormat::R8Unorm)).unwrap();
        case.build().unwrap();
        assert_eq!(device.live_textures(), 1);
    }
    assert_eq!(device.live_textures(), 0);
    assert!(device.calls().iter().any(|c| matches!(c, DeviceCall::DestroyTexture { .. })));
}

#[test]
fn canary_controls_report_the_expected_state() {
    let device = SoftDevice::new().with_fault(zeroinit_test_utils::SoftFault::DiscardSpillsToNextLayer);
    let params = TextureZeroParams {
        layer_count: 7,
        canary_on_creation: true,
        uninitialize_method: UninitializeMethod::StoreOpDiscard,
        ..TextureZeroParams::new(TextureFormat::R8Uint)
    };

    let Outcome::Fail(failures) = run_case(&device, &params) else {
        panic!("spilling discard was not detected");
    };
    // Discarding layer 3 zeroes control layer 4.
    assert!(failures.iter().any(|f| matches!(
        f,
        Failure::Mismatch {
            subresource,
            state: InitializedState::Canary,
            expected: TexelValue::Bytes(expected),
            actual: TexelValue::Bytes(actual),
            ..
        } if subresource.slice == 4 && expected == &vec![1] && actual == &vec![0]
    )));
}
