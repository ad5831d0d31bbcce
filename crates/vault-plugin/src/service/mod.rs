//! Vault reporting plugin - core business logic
//!
//! # Round flow
//! - query: nothing to agree on up front, always empty
//! - observation: answer the oldest pending requests from the local store
//! - validate_observation / observation_quorum: structural checks, 2f+1
//! - state_transition: aggregate per request id, apply agreed writes
//! - reports: one signed report per outcome

mod factory;
mod intake;
mod observation;
mod reports;
mod state_transition;
mod transmitter;
mod validation;


pub use factory::ReportingPluginFactory;
pub use intake::{
    validate_create_secrets_request, validate_delete_secrets_request,
    validate_get_secrets_request, validate_list_secret_identifiers_request, validate_request,
    validate_update_secrets_request, RequestIntake,
};
pub use transmitter::{response_from_report, VaultTransmitter};

use crate::domain::{
    AttributedObservation, OutcomeContext, PluginConfig, PluginError, PluginResult,
    ReportWithInfo, RoundContext,
};
use crate::ports::{KeyValueReadWriter, KeyValueReader, ReportingPlugin, RequestQueue};
use std::sync::Arc;
use tracing::debug;
use vault_crypto::KeyMaterial;

/// One instance per OCR configuration.
pub struct VaultReportingPlugin {
    queue: Arc<dyn RequestQueue>,
    config: PluginConfig,
    n: usize,
    f: usize,
    key_material: KeyMaterial,
}

/// Dependencies for VaultReportingPlugin
pub struct PluginDependencies {
    pub queue: Arc<dyn RequestQueue>,
    pub config: PluginConfig,
    /// Committee size
    pub n: usize,
    /// Maximum number of faulty oracles
    pub f: usize,
    pub key_material: KeyMaterial,
}

impl VaultReportingPlugin {
    pub fn new(deps: PluginDependencies) -> Self {
        Self {
            queue: deps.queue,
            config: deps.config,
            n: deps.n,
            f: deps.f,
            key_material: deps.key_material,
        }
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }
}

impl ReportingPlugin for VaultReportingPlugin {
    fn query(&self, _ctx: &RoundContext, _outctx: &OutcomeContext) -> PluginResult<Vec<u8>> {
        Ok(Vec::new())
    }

    fn observation(
        &self,
        ctx: &RoundContext,
        outctx: &OutcomeContext,
        _query: &[u8],
        kv: &dyn KeyValueReader,
    ) -> PluginResult<Vec<u8>> {
        self.build_observations(ctx, outctx.seq_nr, kv)
    }

    fn validate_observation(
        &self,
        ctx: &RoundContext,
        _outctx: &OutcomeContext,
        _query: &[u8],
        ao: &AttributedObservation,
    ) -> PluginResult<()> {
        ctx.check()?;
        self.check_observation(&ao.observation).inspect_err(|e| {
            debug!(observer = ao.observer, error = %e, "rejected observation");
        })
    }

    fn observation_quorum(
        &self,
        _ctx: &RoundContext,
        _outctx: &OutcomeContext,
        _query: &[u8],
        aos: &[AttributedObservation],
    ) -> PluginResult<bool> {
        Ok(self.has_quorum(aos.len()))
    }

    fn state_transition(
        &self,
        ctx: &RoundContext,
        outctx: &OutcomeContext,
        _query: &[u8],
        aos: &[AttributedObservation],
        kv: &dyn KeyValueReadWriter,
    ) -> PluginResult<Vec<u8>> {
        self.apply_state_transition(ctx, outctx.seq_nr, aos, kv)
    }

    fn committed(
        &self,
        _ctx: &RoundContext,
        _seq_nr: u64,
        _kv: &dyn KeyValueReader,
    ) -> PluginResult<()> {
        Err(PluginError::NotImplemented)
    }

    fn reports(
        &self,
        ctx: &RoundContext,
        seq_nr: u64,
        reports_plus_precursor: &[u8],
    ) -> PluginResult<Vec<ReportWithInfo>> {
        self.build_reports(ctx, seq_nr, reports_plus_precursor)
    }

    fn should_accept_attested_report(
        &self,
        _ctx: &RoundContext,
        _seq_nr: u64,
        _report: &ReportWithInfo,
    ) -> PluginResult<bool> {
        Ok(true)
    }

    fn should_transmit_accepted_report(
        &self,
        _ctx: &RoundContext,
        _seq_nr: u64,
        _report: &ReportWithInfo,
    ) -> PluginResult<bool> {
        Ok(true)
    }

    fn close(&self) -> PluginResult<()> {
        Ok(())
    }
}
