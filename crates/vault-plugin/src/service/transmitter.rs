//! Transmitter: routes attested reports back to the callers waiting on them.

use crate::domain::{AttributedOnchainSignature, PluginError, PluginResult, ReportWithInfo};
use crate::ports::{ContractTransmitter, RequestQueue};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use vault_types::{build_report_context, ReportFormat, ReportInfo, VaultResponse};

/// Delivers each attested report to the local request queue.
///
/// Reports for requests submitted at other nodes find no waiter here and are
/// dropped.
pub struct VaultTransmitter {
    queue: Arc<dyn RequestQueue>,
    from_account: String,
}

impl VaultTransmitter {
    pub fn new(queue: Arc<dyn RequestQueue>, from_account: impl Into<String>) -> Self {
        Self {
            queue,
            from_account: from_account.into(),
        }
    }
}

/// Assemble the caller-facing response for an attested report.
pub fn response_from_report(
    config_digest: &[u8; 32],
    seq_nr: u64,
    report: ReportWithInfo,
    signatures: Vec<AttributedOnchainSignature>,
) -> PluginResult<VaultResponse> {
    let info = ReportInfo::from_envelope(&report.info)
        .map_err(|e| PluginError::Transmit(format!("could not extract report info: {e}")))?;

    Ok(VaultResponse {
        id: info.id.clone(),
        error: String::new(),
        payload: report.report,
        format: info.format().as_str_name().to_string(),
        context: build_report_context(config_digest, seq_nr),
        signatures: signatures.into_iter().map(|s| s.signature).collect(),
    })
}

#[async_trait]
impl ContractTransmitter for VaultTransmitter {
    async fn transmit(
        &self,
        config_digest: [u8; 32],
        seq_nr: u64,
        report: ReportWithInfo,
        signatures: Vec<AttributedOnchainSignature>,
    ) -> PluginResult<()> {
        let response = response_from_report(&config_digest, seq_nr, report, signatures)?;
        let id = response.id.clone();
        let format = response.format.clone();

        if self.queue.respond(&id, response) {
            debug!(request_id = %id, seq_nr, format = %format, "transmitted report to caller");
        } else {
            debug!(request_id = %id, seq_nr, "no local caller for report");
        }
        Ok(())
    }

    async fn from_account(&self) -> PluginResult<String> {
        Ok(self.from_account.clone())
    }
}
