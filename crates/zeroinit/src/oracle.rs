//! Drives one case of the zero-init test through its phases.
//!
//! `Planned → Built → (PreInitialized) → Uninitialized → Verified`. Verification
//! may run again from `Verified`; every other transition goes forward only.
//!
//! The texture is created fresh in `build` and destroyed when the case is
//! dropped, so no two cases ever share a resource.

use std::fmt;

use zeroinit_core::format::Channel;
use zeroinit_core::profiling::{finish_case, profile_function, profile_scope};
use zeroinit_core::{FormatInfo, ReadMethod, Subresource, SubresourceRange, UninitializeMethod};
use zeroinit_test_utils::{
    DeviceError, GpuTexture, Observation, ReadRequest, TextureCommand, TextureDevice,
};

use crate::outcome::{
    Failure, MAX_REPORTED_MISMATCHES_PER_SUBRESOURCE, Outcome, SkipReason, TexelValue,
};
use crate::params::TextureZeroParams;
use crate::partition::SubresourcePartition;
use crate::state::{InitStrategy, InitializedState};

/// Tolerance for shader-visible values.
const EPSILON: f64 = 1e-5;

const CHANNELS: [Channel; 4] = [Channel::R, Channel::G, Channel::B, Channel::A];

/// Where a case is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CasePhase {
    Planned,
    Built,
    PreInitialized,
    Uninitialized,
    Verified,
}

impl fmt::Display for CasePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CasePhase::Planned => "planned",
            CasePhase::Built => "build",
            CasePhase::PreInitialized => "pre-initialize",
            CasePhase::Uninitialized => "uninitialize",
            CasePhase::Verified => "verify",
        };
        f.write_str(name)
    }
}

/// Why a phase could not complete.
#[derive(Debug, Clone, PartialEq)]
pub enum CaseError {
    /// The case cannot run on this device.
    Skip(SkipReason),
    /// The device rejected work.
    Device { phase: CasePhase, error: DeviceError },
    /// `phase` was entered from `actual`, which does not lead to it.
    PhaseOrder { phase: CasePhase, actual: CasePhase },
}

impl CaseError {
    /// Unsupported and out-of-memory errors skip; everything else fails.
    fn device(phase: CasePhase, error: DeviceError) -> Self {
        match error {
            DeviceError::Unsupported { reason } => CaseError::Skip(SkipReason::Unsupported(reason)),
            DeviceError::OutOfMemory { requested } => {
                CaseError::Skip(SkipReason::OutOfMemory { requested })
            }
            error => CaseError::Device { phase, error },
        }
    }
}

impl fmt::Display for CaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseError::Skip(reason) => write!(f, "skipped: {}", reason),
            CaseError::Device { phase, error } => write!(f, "{} failed: {}", phase, error),
            CaseError::PhaseOrder { phase, actual } => {
                write!(f, "cannot enter {} from {}", phase, actual)
            }
        }
    }
}

impl std::error::Error for CaseError {}

impl From<CaseError> for Outcome {
    fn from(err: CaseError) -> Self {
        match err {
            CaseError::Skip(reason) => Outcome::Skip(reason),
            CaseError::Device { phase, error } => Outcome::Fail(vec![Failure::Device { phase, error }]),
            CaseError::PhaseOrder { phase, actual } => {
                Outcome::Fail(vec![Failure::OutOfOrder { phase, actual }])
            }
        }
    }
}

/// One case of the zero-init test bound to a device.
pub struct ZeroInitCase<'a> {
    device: &'a dyn TextureDevice,
    params: TextureZeroParams,
    format: &'static FormatInfo,
    partition: SubresourcePartition,
    strategy: InitStrategy,
    texture: Option<GpuTexture>,
    phase: CasePhase,
}

impl<'a> ZeroInitCase<'a> {
    /// Plan a case with the fixed partition and the preferred strategy.
    pub fn new(device: &'a dyn TextureDevice, params: TextureZeroParams) -> Result<Self, CaseError> {
        let format = params
            .format_info()
            .ok_or(CaseError::Skip(SkipReason::UnknownFormat(params.format)))?;
        Ok(Self {
            device,
            partition: SubresourcePartition::for_counts(
                params.mip_level_count,
                params.array_layer_count(),
            ),
            strategy: InitStrategy::preferred(format, params.sample_count),
            params,
            format,
            texture: None,
            phase: CasePhase::Planned,
        })
    }

    /// Replace the partition. Only before `build`.
    pub fn with_partition(mut self, partition: SubresourcePartition) -> Self {
        self.partition = partition;
        self
    }

    /// Force an initialization strategy. Only before `build`.
    pub fn with_strategy(mut self, strategy: InitStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn params(&self) -> &TextureZeroParams {
        &self.params
    }

    pub fn partition(&self) -> &SubresourcePartition {
        &self.partition
    }

    pub fn strategy(&self) -> InitStrategy {
        self.strategy
    }

    pub fn phase(&self) -> CasePhase {
        self.phase
    }

    pub fn texture(&self) -> Option<&GpuTexture> {
        self.texture.as_ref()
    }

    fn expect_phase(&self, phase: CasePhase, allowed: &[CasePhase]) -> Result<(), CaseError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(CaseError::PhaseOrder {
                phase,
                actual: self.phase,
            })
        }
    }

    fn built_texture(&self, phase: CasePhase) -> Result<&GpuTexture, CaseError> {
        self.texture.as_ref().ok_or(CaseError::PhaseOrder {
            phase,
            actual: CasePhase::Planned,
        })
    }

    /// Check support and create the texture.
    pub fn build(&mut self) -> Result<(), CaseError> {
        profile_function!();
        self.expect_phase(CasePhase::Built, &[CasePhase::Planned])?;

        let mut desc = self.params.texture_descriptor();
        let writes = self.params.canary_on_creation
            || self.params.uninitialize_method == UninitializeMethod::StoreOpDiscard;
        if writes {
            if !self.strategy.is_available(self.format, self.params.sample_count) {
                return Err(CaseError::Skip(SkipReason::Unsupported(format!(
                    "{:?} cannot be initialized with {:?}",
                    self.params.format, self.strategy
                ))));
            }
            desc.usage |= self.strategy.required_usage();
        }

        self.device
            .check_support(&desc, self.params.read_method)
            .map_err(|e| CaseError::device(CasePhase::Built, e))?;

        let texture = self
            .device
            .create_texture(&desc)
            .map_err(|e| CaseError::device(CasePhase::Built, e))?;

        tracing::debug!(
            format = ?self.params.format,
            usage = ?desc.usage,
            strategy = ?self.strategy,
            "built texture"
        );
        self.texture = Some(texture);
        self.phase = CasePhase::Built;
        Ok(())
    }

    fn fill_commands(
        &self,
        ranges: &[SubresourceRange],
        state: InitializedState,
    ) -> Vec<TextureCommand> {
        let value = state.components(self.format);
        match self.strategy {
            InitStrategy::Copy => ranges
                .iter()
                .flat_map(SubresourceRange::mip_levels)
                .map(|mip| TextureCommand::CopyFill {
                    level: mip.level,
                    layers: mip.slices,
                    value,
                })
                .collect(),
            InitStrategy::RenderClear => ranges
                .iter()
                .flat_map(SubresourceRange::each)
                .map(|s| TextureCommand::ClearFill {
                    level: s.level,
                    layer: s.slice,
                    value,
                })
                .collect(),
        }
    }

    fn submit(&self, phase: CasePhase, commands: &[TextureCommand]) -> Result<(), CaseError> {
        if commands.is_empty() {
            return Ok(());
        }
        let texture = self.built_texture(phase)?;
        self.device
            .submit(texture, commands)
            .map_err(|e| CaseError::device(phase, e))
    }

    /// Write canary data to the control subresources if the case asks for it.
    pub fn pre_initialize(&mut self) -> Result<(), CaseError> {
        profile_function!();
        self.expect_phase(CasePhase::PreInitialized, &[CasePhase::Built])?;

        if self.params.canary_on_creation {
            let commands = self.fill_commands(self.partition.initialized(), InitializedState::Canary);
            tracing::trace!(commands = commands.len(), "pre-initializing controls");
            self.submit(CasePhase::PreInitialized, &commands)?;
        }
        self.phase = CasePhase::PreInitialized;
        Ok(())
    }

    /// Put the subresources under test into the uninitialized state.
    pub fn uninitialize(&mut self) -> Result<(), CaseError> {
        profile_function!();
        self.expect_phase(
            CasePhase::Uninitialized,
            &[CasePhase::Built, CasePhase::PreInitialized],
        )?;

        match self.params.uninitialize_method {
            UninitializeMethod::Creation => {}
            UninitializeMethod::StoreOpDiscard => {
                let mut commands =
                    self.fill_commands(self.partition.uninitialized(), InitializedState::Canary);
                commands.extend(self.partition.uninitialized_subresources().map(|s| {
                    TextureCommand::Discard {
                        level: s.level,
                        layer: s.slice,
                    }
                }));
                self.submit(CasePhase::Uninitialized, &commands)?;
            }
        }
        self.phase = CasePhase::Uninitialized;
        Ok(())
    }

    /// Read every subresource under test (expecting zero) and, if controls
    /// were written, every control (expecting canary).
    ///
    /// Can be repeated; reads do not change the texture.
    pub fn verify(&mut self) -> Result<Vec<Failure>, CaseError> {
        profile_function!();
        self.expect_phase(
            CasePhase::Verified,
            &[CasePhase::Uninitialized, CasePhase::Verified],
        )?;

        let mut failures = Vec::new();
        {
            profile_scope!("verify_uninitialized");
            for subresource in self.partition.uninitialized_subresources() {
                failures.extend(self.check_subresource(subresource, InitializedState::Zero)?);
            }
        }
        if self.params.canary_on_creation {
            profile_scope!("verify_controls");
            for subresource in self.partition.initialized_subresources() {
                failures.extend(self.check_subresource(subresource, InitializedState::Canary)?);
            }
        }

        self.phase = CasePhase::Verified;
        Ok(failures)
    }

    /// Every phase in order.
    pub fn execute(&mut self) -> Result<Vec<Failure>, CaseError> {
        self.build()?;
        self.pre_initialize()?;
        self.uninitialize()?;
        self.verify()
    }

    fn check_subresource(
        &self,
        subresource: Subresource,
        state: InitializedState,
    ) -> Result<Vec<Failure>, CaseError> {
        let texture = self.built_texture(CasePhase::Verified)?;
        let method = self.params.read_method;
        let expected = state.components(self.format);
        let request = ReadRequest {
            level: subresource.level,
            layer: subresource.slice,
            method,
            aspect: self.params.read_aspect(),
            reference: expected,
        };

        let observation = self
            .device
            .read(texture, &request)
            .map_err(|e| CaseError::device(CasePhase::Verified, e))?;
        let texels = texture.info().texel_count(subresource.level);
        let mut report = MismatchReport::new(subresource, method, state);

        match (method, observation) {
            (ReadMethod::CopyToBuffer | ReadMethod::CopyToTexture, Observation::Bytes(bytes)) => {
                let texel = self.format.encode(request.aspect, &expected).ok_or_else(|| {
                    CaseError::Skip(SkipReason::Unsupported(format!(
                        "{:?} aspect of {:?} has no byte layout",
                        request.aspect, self.params.format
                    )))
                })?;
                if bytes.len() != texel.len() * texels {
                    return Ok(vec![report.wrong_size(texel.len() * texels, bytes.len())]);
                }
                for (index, actual) in bytes.chunks_exact(texel.len()).enumerate() {
                    if actual != texel.as_slice() {
                        report.push(
                            index,
                            TexelValue::Bytes(texel.clone()),
                            TexelValue::Bytes(actual.to_vec()),
                        );
                    }
                }
            }
            (
                ReadMethod::Sample | ReadMethod::Storage | ReadMethod::ColorBlending,
                Observation::Texels(values),
            ) => {
                let count = match method {
                    ReadMethod::Sample => texels * self.params.sample_count as usize,
                    _ => texels,
                };
                if values.len() != count {
                    return Ok(vec![report.wrong_size(count, values.len())]);
                }
                let loaded = expected.as_loaded(self.format);
                for (index, actual) in values.iter().enumerate() {
                    let differs = CHANNELS.iter().any(|&channel| {
                        let i = channel.index();
                        self.format.has_channel(channel) && (actual[i] - loaded[i]).abs() > EPSILON
                    });
                    if differs {
                        report.push(index, TexelValue::Rgba(loaded), TexelValue::Rgba(*actual));
                    }
                }
            }
            (ReadMethod::DepthTest | ReadMethod::StencilTest, Observation::Comparisons(results)) => {
                if results.len() != texels {
                    return Ok(vec![report.wrong_size(texels, results.len())]);
                }
                for (index, passed) in results.iter().enumerate() {
                    if !passed {
                        report.push(index, TexelValue::Passed(true), TexelValue::Passed(false));
                    }
                }
            }
            (_, observation) => {
                return Ok(vec![Failure::UnexpectedObservation {
                    subresource,
                    method,
                    kind: observation.kind(),
                }]);
            }
        }

        Ok(report.finish())
    }
}

impl Drop for ZeroInitCase<'_> {
    fn drop(&mut self) {
        if let Some(texture) = self.texture.take() {
            self.device.destroy_texture(&texture);
        }
    }
}

/// Collects mismatches of one subresource, keeping the first few.
struct MismatchReport {
    subresource: Subresource,
    method: ReadMethod,
    state: InitializedState,
    failures: Vec<Failure>,
    omitted: usize,
}

impl MismatchReport {
    fn new(subresource: Subresource, method: ReadMethod, state: InitializedState) -> Self {
        Self {
            subresource,
            method,
            state,
            failures: Vec::new(),
            omitted: 0,
        }
    }

    fn push(&mut self, texel: usize, expected: TexelValue, actual: TexelValue) {
        if self.failures.len() < MAX_REPORTED_MISMATCHES_PER_SUBRESOURCE {
            self.failures.push(Failure::Mismatch {
                subresource: self.subresource,
                method: self.method,
                state: self.state,
                texel,
                expected,
                actual,
            });
        } else {
            self.omitted += 1;
        }
    }

    fn wrong_size(&self, expected: usize, actual: usize) -> Failure {
        Failure::WrongSize {
            subresource: self.subresource,
            method: self.method,
            expected,
            actual,
        }
    }

    fn finish(mut self) -> Vec<Failure> {
        if self.omitted > 0 {
            self.failures.push(Failure::MoreMismatches {
                subresource: self.subresource,
                method: self.method,
                omitted: self.omitted,
            });
        }
        self.failures
    }
}

/// Run one case to completion on `device`.
pub fn run_case(device: &dyn TextureDevice, params: &TextureZeroParams) -> Outcome {
    profile_function!();
    let result = ZeroInitCase::new(device, *params).and_then(|mut case| case.execute());
    finish_case();

    match result {
        Ok(failures) if failures.is_empty() => Outcome::Pass,
        Ok(failures) => Outcome::Fail(failures),
        Err(err) => err.into(),
    }
}
