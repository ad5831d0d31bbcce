//! Driving ports (inbound API)
//!
//! The OCR host calls the phases of [`ReportingPlugin`] in order for every
//! round: query, observation, validate_observation / observation_quorum,
//! state_transition, reports. Attested reports are then handed to a
//! [`ContractTransmitter`].

use crate::domain::{
    AttributedObservation, AttributedOnchainSignature, OutcomeContext, PluginResult,
    ReportWithInfo, RoundContext,
};
use crate::ports::{KeyValueReadWriter, KeyValueReader};
use async_trait::async_trait;

/// OCR3.1 reporting plugin contract.
///
/// Every phase runs to completion on the calling thread.
pub trait ReportingPlugin: Send + Sync {
    fn query(&self, ctx: &RoundContext, outctx: &OutcomeContext) -> PluginResult<Vec<u8>>;

    fn observation(
        &self,
        ctx: &RoundContext,
        outctx: &OutcomeContext,
        query: &[u8],
        kv: &dyn KeyValueReader,
    ) -> PluginResult<Vec<u8>>;

    fn validate_observation(
        &self,
        ctx: &RoundContext,
        outctx: &OutcomeContext,
        query: &[u8],
        ao: &AttributedObservation,
    ) -> PluginResult<()>;

    fn observation_quorum(
        &self,
        ctx: &RoundContext,
        outctx: &OutcomeContext,
        query: &[u8],
        aos: &[AttributedObservation],
    ) -> PluginResult<bool>;

    /// Aggregate observations, apply writes and return the encoded outcomes.
    fn state_transition(
        &self,
        ctx: &RoundContext,
        outctx: &OutcomeContext,
        query: &[u8],
        aos: &[AttributedObservation],
        kv: &dyn KeyValueReadWriter,
    ) -> PluginResult<Vec<u8>>;

    fn committed(&self, ctx: &RoundContext, seq_nr: u64, kv: &dyn KeyValueReader)
        -> PluginResult<()>;

    fn reports(
        &self,
        ctx: &RoundContext,
        seq_nr: u64,
        reports_plus_precursor: &[u8],
    ) -> PluginResult<Vec<ReportWithInfo>>;

    fn should_accept_attested_report(
        &self,
        ctx: &RoundContext,
        seq_nr: u64,
        report: &ReportWithInfo,
    ) -> PluginResult<bool>;

    fn should_transmit_accepted_report(
        &self,
        ctx: &RoundContext,
        seq_nr: u64,
        report: &ReportWithInfo,
    ) -> PluginResult<bool>;

    fn close(&self) -> PluginResult<()>;
}

/// Receives attested reports from the host.
#[async_trait]
pub trait ContractTransmitter: Send + Sync {
    async fn transmit(
        &self,
        config_digest: [u8; 32],
        seq_nr: u64,
        report: ReportWithInfo,
        signatures: Vec<AttributedOnchainSignature>,
    ) -> PluginResult<()>;

    async fn from_account(&self) -> PluginResult<String>;
}
