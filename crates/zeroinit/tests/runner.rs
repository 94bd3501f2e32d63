//! Runner behaviour: filtering, skips, early stop and grouping.

use std::collections::HashSet;

use zeroinit::{Outcome, Runner, RunnerConfig, SkipReason, texture_zero_cases};
use zeroinit_core::ReadMethod;
use zeroinit_test_utils::{SoftDevice, SoftFault};

#[test]
fn filter_selects_by_name() {
    let device = SoftDevice::new();
    let total = texture_zero_cases().count();
    let config = RunnerConfig::new().filter("format=R8Unorm;");

    let report = Runner::new(&device, config).run(texture_zero_cases());
    assert!(!report.results.is_empty());
    assert_eq!(report.results.len() + report.filtered, total);
    assert!(report.results.iter().all(|r| r.name.contains("format=R8Unorm;")));
    assert!(report.is_success());
}

#[test]
fn out_of_memory_skips_and_reclaims() {
    let device = SoftDevice::new().with_memory_budget(0);
    let report = Runner::new(&device, RunnerConfig::new()).run(texture_zero_cases().take(3));

    assert_eq!(report.skipped, 3);
    assert!(report.is_success());
    assert!(report.results.iter().all(|r| matches!(
        r.outcome,
        Outcome::Skip(SkipReason::OutOfMemory { requested }) if requested > 0
    )));
    assert_eq!(device.count_reclaims(), 3);
    assert_eq!(device.live_textures(), 0);
}

#[test]
fn reclaim_can_be_disabled() {
    let device = SoftDevice::new().with_memory_budget(0);
    let config = RunnerConfig::new().reclaim_on_oom(false);
    let report = Runner::new(&device, config).run(texture_zero_cases().take(3));

    assert_eq!(report.skipped, 3);
    assert_eq!(device.count_reclaims(), 0);
}

#[test]
fn unsupported_reads_skip_without_stopping_siblings() {
    let device = SoftDevice::new().with_unsupported_read(ReadMethod::Storage);
    let config = RunnerConfig::new().filter("format=Rgba8Unorm;");
    let report = Runner::new(&device, config).run(texture_zero_cases());

    assert!(report.skipped > 0);
    assert!(report.passed > 0);
    assert_eq!(report.failed, 0);
    for result in &report.results {
        let storage = result.case_key.contains("read_method=Storage");
        assert_eq!(result.outcome.is_skip(), storage, "{}", result.name);
    }
}

#[test]
fn unsupported_format_is_skipped() {
    let device = SoftDevice::new().with_unsupported_format(wgpu::TextureFormat::Rg8Unorm);
    let config = RunnerConfig::new().filter("format=Rg8Unorm;");
    let report = Runner::new(&device, config).run(texture_zero_cases());

    assert!(!report.results.is_empty());
    assert_eq!(report.skipped, report.results.len());
    assert_eq!(device.count_texture_creates(), 0);
}

#[test]
fn stop_on_failure_ends_the_run() {
    let device = SoftDevice::new().with_fault(SoftFault::GarbageOnCreate);
    let config = RunnerConfig::new().stop_on_failure(true);
    let report = Runner::new(&device, config).run(texture_zero_cases().take(20));

    assert!(report.stopped_early);
    assert_eq!(report.failed, 1);
    assert!(report.results.last().unwrap().outcome.is_fail());
    assert_eq!(report.failures().count(), 1);
}

#[test]
fn failures_do_not_stop_by_default() {
    let device = SoftDevice::new().with_fault(SoftFault::GarbageOnCreate);
    let report = Runner::new(&device, RunnerConfig::new()).run(texture_zero_cases().take(20));

    assert!(!report.stopped_early);
    assert_eq!(report.results.len(), 20);
    assert!(report.failed > 1);
    assert!(!report.is_success());
}

#[test]
fn results_group_by_case() {
    let device = SoftDevice::new();
    let config = RunnerConfig::new().filter("format=R8Unorm;");
    let report = Runner::new(&device, config).run(texture_zero_cases());

    let groups = report.by_case();
    assert!(groups.len() > 1);

    let mut seen = HashSet::new();
    let mut members = 0;
    for (key, results) in &groups {
        assert!(seen.insert(*key), "case {key} appears twice");
        assert!(results.iter().all(|r| r.case_key == *key));
        members += results.len();
    }
    assert_eq!(members, report.results.len());
}
