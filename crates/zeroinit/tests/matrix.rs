//! Shape of the generated matrix, and a sampled sweep over it.

use std::collections::HashSet;

use wgpu::{TextureDimension, TextureFormat};
use zeroinit::{Runner, RunnerConfig, texture_zero_cases};
use zeroinit_core::{ReadMethod, UninitializeMethod, format_info};
use zeroinit_test_utils::SoftDevice;

#[test]
fn every_read_method_is_covered() {
    let methods: HashSet<ReadMethod> = texture_zero_cases().map(|c| c.params.read_method).collect();
    for method in ReadMethod::ALL {
        assert!(methods.contains(&method), "{method} has no cases");
    }
}

#[test]
fn color_depth_and_stencil_formats_are_covered() {
    let formats: HashSet<TextureFormat> = texture_zero_cases().map(|c| c.params.format).collect();
    for format in [
        TextureFormat::R8Unorm,
        TextureFormat::Rgba32Float,
        TextureFormat::Rgb10a2Unorm,
        TextureFormat::Depth24Plus,
        TextureFormat::Stencil8,
        TextureFormat::Depth24PlusStencil8,
    ] {
        assert!(formats.contains(&format), "{format:?} has no cases");
    }
}

#[test]
fn case_names_are_unique() {
    let mut names = HashSet::new();
    for case in texture_zero_cases() {
        assert!(case.name.starts_with("uninitialized_texture_is_zero:"));
        assert!(names.insert(case.name.clone()), "duplicate case {}", case.name);
    }
}

#[test]
fn pruned_combinations_never_appear() {
    for case in texture_zero_cases() {
        let p = case.params;
        let info = format_info(p.format).unwrap();

        if p.sample_count > 1 {
            assert!(!p.read_method.is_copy(), "{}", case.name);
            assert_ne!(p.read_method, ReadMethod::Storage, "{}", case.name);
            assert_eq!(p.mip_level_count, 1, "{}", case.name);
            assert_eq!(p.layer_count, 1, "{}", case.name);
        }
        if p.dimension == TextureDimension::D3 {
            assert!(info.has_color(), "{}", case.name);
            assert_eq!(p.layer_count, 1, "{}", case.name);
            assert_eq!(p.sample_count, 1, "{}", case.name);
            assert!(!p.read_method.is_attachment(), "{}", case.name);
            assert_eq!(p.uninitialize_method, UninitializeMethod::Creation, "{}", case.name);
        }
        if p.read_method == ReadMethod::DepthTest {
            assert!(info.has_depth(), "{}", case.name);
        }
        if p.read_method == ReadMethod::StencilTest {
            assert!(info.has_stencil(), "{}", case.name);
        }
        if p.read_method == ReadMethod::ColorBlending {
            assert!(info.has_color() && !info.is_integer(), "{}", case.name);
        }
    }
}

#[test]
fn sampled_sweep_passes_on_a_conforming_device() {
    let device = SoftDevice::new();
    let report = Runner::new(&device, RunnerConfig::new()).run(texture_zero_cases().step_by(7));

    let failures: Vec<String> = report
        .failures()
        .map(|r| format!("{}: {:?}", r.name, r.outcome.failures()))
        .collect();
    assert!(failures.is_empty(), "{failures:#?}");
    assert!(report.passed > 0);
    assert_eq!(device.live_textures(), 0);
}
