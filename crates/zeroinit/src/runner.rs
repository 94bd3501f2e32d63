//! Runs generated cases one after another and collects their outcomes.

use std::time::{Duration, Instant};

use zeroinit_core::profiling::profile_function;
use zeroinit_test_utils::TextureDevice;

use crate::config::RunnerConfig;
use crate::oracle::run_case;
use crate::outcome::{Outcome, SkipReason};
use crate::params::CaseParams;

/// Outcome of one named case.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseResult {
    pub name: String,
    pub case_key: String,
    pub subcase_key: String,
    pub outcome: Outcome,
    pub elapsed: Duration,
}

/// Everything a run produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub results: Vec<CaseResult>,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Cases not run because of the filter.
    pub filtered: usize,
    /// The run ended early on a failure.
    pub stopped_early: bool,
}

impl RunReport {
    fn record(&mut self, result: CaseResult) {
        match result.outcome {
            Outcome::Pass => self.passed += 1,
            Outcome::Fail(_) => self.failed += 1,
            Outcome::Skip(_) => self.skipped += 1,
        }
        self.results.push(result);
    }

    /// No case failed.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseResult> {
        self.results.iter().filter(|r| r.outcome.is_fail())
    }

    /// Results grouped under their case key, in run order.
    pub fn by_case(&self) -> Vec<(&str, Vec<&CaseResult>)> {
        let mut groups: Vec<(&str, Vec<&CaseResult>)> = Vec::new();
        for result in &self.results {
            match groups.last_mut() {
                Some((key, members)) if *key == result.case_key => members.push(result),
                _ => groups.push((result.case_key.as_str(), vec![result])),
            }
        }
        groups
    }
}

/// Drives cases through the oracle on one device.
pub struct Runner<'a> {
    device: &'a dyn TextureDevice,
    config: RunnerConfig,
}

impl<'a> Runner<'a> {
    pub fn new(device: &'a dyn TextureDevice, config: RunnerConfig) -> Self {
        Self { device, config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run every selected case in order. Skips and failures never stop
    /// sibling cases unless `stop_on_failure` is set.
    pub fn run(&self, cases: impl IntoIterator<Item = CaseParams>) -> RunReport {
        profile_function!();
        tracing::info!("Running zero-init cases on {}", self.device.adapter_name());

        let mut report = RunReport::default();
        for case in cases {
            if !self.config.matches(&case.name) {
                report.filtered += 1;
                continue;
            }

            let start = Instant::now();
            let outcome = run_case(self.device, &case.params);
            let elapsed = start.elapsed();

            match &outcome {
                Outcome::Pass => tracing::debug!("{} passed in {:?}", case.name, elapsed),
                Outcome::Skip(reason) => {
                    tracing::warn!("{} skipped: {}", case.name, reason);
                    if matches!(reason, SkipReason::OutOfMemory { .. }) && self.config.reclaim_on_oom {
                        self.device.reclaim();
                    }
                }
                Outcome::Fail(failures) => {
                    tracing::error!("{} failed", case.name);
                    for failure in failures {
                        tracing::error!("  {}", failure);
                    }
                }
            }

            let failed = outcome.is_fail();
            report.record(CaseResult {
                name: case.name,
                case_key: case.case_key,
                subcase_key: case.subcase_key,
                outcome,
                elapsed,
            });

            if failed && self.config.stop_on_failure {
                report.stopped_early = true;
                break;
            }
        }

        tracing::info!(
            passed = report.passed,
            failed = report.failed,
            skipped = report.skipped,
            filtered = report.filtered,
            "Zero-init run finished"
        );
        report
    }
}
