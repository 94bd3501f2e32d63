//! A broken device must not pass.

use wgpu::{TextureAspect, TextureFormat};
use zeroinit::{
    Failure, InitializedState, MAX_REPORTED_MISMATCHES_PER_SUBRESOURCE, Outcome, TexelValue,
    TextureZeroParams, run_case,
};
use zeroinit_core::{ReadMethod, Subresource, UninitializeMethod};
use zeroinit_test_utils::{SoftDevice, SoftFault};

#[test]
fn garbage_on_creation_is_reported_per_subresource() {
    let device = SoftDevice::new().with_fault(SoftFault::GarbageOnCreate);
    let params = TextureZeroParams {
        mip_level_count: 5,
        ..TextureZeroParams::new(TextureFormat::Rgba8Unorm)
    };

    let Outcome::Fail(failures) = run_case(&device, &params) else {
        panic!("garbage was not detected");
    };

    // Levels 0, 1 and 3 are under test: 32x32, 16x16 and 4x4 texels.
    let omitted: Vec<(u32, usize)> = failures
        .iter()
        .filter_map(|f| match f {
            Failure::MoreMismatches {
                subresource,
                omitted,
                ..
            } => Some((subresource.level, *omitted)),
            _ => None,
        })
        .collect();
    assert_eq!(omitted, vec![(0, 1020), (1, 252), (3, 12)]);

    let mismatches = failures
        .iter()
        .filter(|f| matches!(f, Failure::Mismatch { .. }))
        .count();
    assert_eq!(mismatches, 3 * MAX_REPORTED_MISMATCHES_PER_SUBRESOURCE);

    assert_eq!(
        failures[0],
        Failure::Mismatch {
            subresource: Subresource { level: 0, slice: 0 },
            method: ReadMethod::CopyToBuffer,
            state: InitializedState::Zero,
            texel: 0,
            expected: TexelValue::Bytes(vec![0; 4]),
            actual: TexelValue::Bytes(vec![0xff; 4]),
        }
    );
}

#[test]
fn discard_that_keeps_contents_is_caught() {
    let device = SoftDevice::new().with_fault(SoftFault::KeepContentsOnDiscard);
    let discard = TextureZeroParams {
        uninitialize_method: UninitializeMethod::StoreOpDiscard,
        ..TextureZeroParams::new(TextureFormat::R8Unorm)
    };
    let created = TextureZeroParams::new(TextureFormat::R8Unorm);

    let outcome = run_case(&device, &discard);
    assert!(outcome.is_fail());
    assert!(outcome.failures().iter().all(|f| matches!(
        f,
        Failure::Mismatch {
            state: InitializedState::Zero,
            actual: TexelValue::Bytes(actual),
            ..
        } if actual == &vec![0xff]
    )));

    // The fault only affects discards.
    assert_eq!(run_case(&device, &created), Outcome::Pass);
}

#[test]
fn shader_reads_compare_loaded_values() {
    let device = SoftDevice::new().with_fault(SoftFault::GarbageOnCreate);
    let params = TextureZeroParams {
        read_method: ReadMethod::Sample,
        ..TextureZeroParams::new(TextureFormat::R8Uint)
    };

    let outcome = run_case(&device, &params);
    let Some(Failure::Mismatch {
        expected, actual, ..
    }) = outcome.failures().first()
    else {
        panic!("expected a mismatch, got {outcome}");
    };
    assert_eq!(expected, &TexelValue::Rgba([0.0, 0.0, 0.0, 1.0]));
    let TexelValue::Rgba(actual) = actual else {
        panic!("sampled reads report loaded values");
    };
    assert_eq!(actual[0], 3.0);
}

#[test]
fn failed_depth_comparisons_are_reported() {
    let device = SoftDevice::new().with_fault(SoftFault::GarbageOnCreate);
    let params = TextureZeroParams {
        read_method: ReadMethod::DepthTest,
        aspect: TextureAspect::DepthOnly,
        ..TextureZeroParams::new(TextureFormat::Depth32Float)
    };

    let outcome = run_case(&device, &params);
    assert!(outcome.failures().iter().any(|f| matches!(
        f,
        Failure::Mismatch {
            expected: TexelValue::Passed(true),
            actual: TexelValue::Passed(false),
            ..
        }
    )));
}

#[test]
fn failure_messages_name_the_subresource() {
    let device = SoftDevice::new().with_fault(SoftFault::GarbageOnCreate);
    let outcome = run_case(&device, &TextureZeroParams::new(TextureFormat::R8Unorm));
    let text = outcome.failures()[0].to_string();
    assert!(text.contains("level 0 slice 0"), "{text}");
    assert!(text.contains("zero"), "{text}");
}
