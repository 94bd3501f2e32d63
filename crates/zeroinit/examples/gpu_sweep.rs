//! GPU Sweep - run the zero-init matrix on the default adapter
//!
//! Run every case:
//!   cargo run -p zeroinit --example gpu_sweep
//!
//! Narrow the run with a case name substring and stop at the first failure:
//!   ZEROINIT_FILTER="read_method=Sample;format=Rgba8Unorm;" ZEROINIT_STOP_ON_FAILURE=1 \
//!     cargo run -p zeroinit --example gpu_sweep
//!
//! With `--features profiling`, each case is a puffin frame served on
//! 127.0.0.1:8585 for puffin_viewer.

use std::process::ExitCode;

use zeroinit::{GraphicsContext, Runner, RunnerConfig, texture_zero_cases};
#[cfg(feature = "profiling")]
use zeroinit_core::profiling::{ProfilingBackend, init_profiling};

fn main() -> ExitCode {
    let config = RunnerConfig::from_env();
    config.init_logging();
    #[cfg(feature = "profiling")]
    init_profiling(ProfilingBackend::PuffinHttp);

    let context = match GraphicsContext::new_owned_sync() {
        Ok(context) => context,
        Err(err) => {
            tracing::error!("Failed to create graphics context: {}", err);
            return ExitCode::FAILURE;
        }
    };
    let adapter = context.info();
    tracing::info!("Adapter: {} ({:?})", adapter.name, adapter.backend);

    let report = Runner::new(&*context, config).run(texture_zero_cases());

    for result in report.failures() {
        tracing::error!("FAIL {}", result.name);
    }
    println!(
        "{} passed, {} failed, {} skipped, {} filtered out",
        report.passed, report.failed, report.skipped, report.filtered
    );

    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
