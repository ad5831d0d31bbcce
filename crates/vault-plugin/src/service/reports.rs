//! Report generation: one signed report per outcome.
//!
//! GetSecrets responses are encoded as protobuf so clients can pick apart the
//! per-oracle shares. Every other kind is canonical JSON.

use super::VaultReportingPlugin;
use crate::domain::{PluginError, PluginResult, ReportWithInfo, RoundContext};
use crate::metrics;
use prost::Message;
use tracing::debug;
use vault_types::{
    to_canonical_json, Outcome, Outcomes, ReportFormat, ReportInfo, RequestType, ResponsePayload,
};

fn missing_response() -> PluginError {
    PluginError::InvalidReport("response cannot be nil".to_string())
}

fn wrap(id: &str, kind: RequestType, format: ReportFormat, report: Vec<u8>) -> ReportWithInfo {
    ReportWithInfo {
        report,
        info: ReportInfo::new(id, kind, format).to_envelope(),
    }
}

/// Build the report for one outcome, or `None` for an unknown request kind.
pub(crate) fn report_for_outcome(o: &Outcome) -> PluginResult<Option<ReportWithInfo>> {
    let kind = o.request_type();
    let report = match kind {
        RequestType::GetSecrets => {
            let Some(ResponsePayload::GetSecrets(resp)) = &o.response else {
                return Err(missing_response());
            };
            wrap(&o.id, kind, ReportFormat::Protobuf, resp.encode_to_vec())
        }
        RequestType::CreateSecrets => {
            let Some(ResponsePayload::CreateSecrets(resp)) = &o.response else {
                return Err(missing_response());
            };
            wrap(&o.id, kind, ReportFormat::Json, to_canonical_json(resp)?)
        }
        RequestType::UpdateSecrets => {
            let Some(ResponsePayload::UpdateSecrets(resp)) = &o.response else {
                return Err(missing_response());
            };
            wrap(&o.id, kind, ReportFormat::Json, to_canonical_json(resp)?)
        }
        RequestType::DeleteSecrets => {
            let Some(ResponsePayload::DeleteSecrets(resp)) = &o.response else {
                return Err(missing_response());
            };
            wrap(&o.id, kind, ReportFormat::Json, to_canonical_json(resp)?)
        }
        RequestType::ListSecretIdentifiers => {
            let Some(ResponsePayload::ListSecretIdentifiers(resp)) = &o.response else {
                return Err(missing_response());
            };
            wrap(&o.id, kind, ReportFormat::Json, to_canonical_json(resp)?)
        }
        RequestType::Unspecified => return Ok(None),
    };
    Ok(Some(report))
}

impl VaultReportingPlugin {
    pub(crate) fn build_reports(
        &self,
        ctx: &RoundContext,
        seq_nr: u64,
        reports_plus_precursor: &[u8],
    ) -> PluginResult<Vec<ReportWithInfo>> {
        let outcomes =
            Outcomes::decode(reports_plus_precursor).map_err(PluginError::OutcomeDecode)?;

        let mut reports = Vec::with_capacity(outcomes.outcomes.len());
        for o in &outcomes.outcomes {
            ctx.check()?;
            if let Some(report) = report_for_outcome(o)? {
                reports.push(report);
            }
        }

        if !reports.is_empty() {
            debug!(seq_nr, count = reports.len(), "reports complete");
            metrics::record_reports_generated(reports.len());
        }
        Ok(reports)
    }
}
