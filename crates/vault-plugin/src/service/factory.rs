//! Plugin factory: one plugin instance per OCR configuration.

use super::{PluginDependencies, VaultReportingPlugin};
use crate::domain::{
    OcrConfig, PluginConfig, PluginError, PluginResult, ReportingPluginInfo,
    ReportingPluginLimits, PLUGIN_NAME,
};
use crate::ports::{RequestQueue, ResultPackageDatabase};
use prost::Message;
use std::sync::Arc;
use tracing::info;
use vault_crypto::{KeyMaterialLoader, LazyPublicKey};
use vault_types::ReportingPluginConfig;

pub struct ReportingPluginFactory {
    queue: Arc<dyn RequestQueue>,
    db: Arc<dyn ResultPackageDatabase>,
    key_loader: Arc<dyn KeyMaterialLoader>,
    lazy_public_key: Arc<LazyPublicKey>,
}

impl ReportingPluginFactory {
    pub fn new(
        queue: Arc<dyn RequestQueue>,
        db: Arc<dyn ResultPackageDatabase>,
        key_loader: Arc<dyn KeyMaterialLoader>,
        lazy_public_key: Arc<LazyPublicKey>,
    ) -> Self {
        Self {
            queue,
            db,
            key_loader,
            lazy_public_key,
        }
    }

    /// Build a plugin for `ocr`.
    ///
    /// Loads this node's key material from the DKG result package named in
    /// the offchain config and publishes the committee public key for
    /// request intake.
    pub async fn new_reporting_plugin(
        &self,
        ocr: &OcrConfig,
    ) -> PluginResult<(VaultReportingPlugin, ReportingPluginInfo)> {
        let offchain = ReportingPluginConfig::decode(ocr.offchain_config.as_slice())
            .map_err(PluginError::ConfigDecode)?;

        let config = PluginConfig::from_offchain(&offchain);
        let limits = ReportingPluginLimits::from_offchain(&offchain);

        let instance_id = offchain
            .dkg_instance_id
            .as_deref()
            .ok_or(PluginError::MissingDkgInstanceId)?;

        let package = self
            .db
            .read_result_package(instance_id)
            .await
            .map_err(|e| PluginError::ResultPackageRead(e.to_string()))?
            .ok_or_else(|| PluginError::ResultPackageNotFound(instance_id.to_string()))?;

        let key_material = self.key_loader.load(&package.report_with_result_package)?;
        self.lazy_public_key.set(key_material.public_key.clone());

        info!(
            n = ocr.n,
            f = ocr.f,
            dkg_instance_id = %instance_id,
            batch_size = config.batch_size,
            "created vault reporting plugin"
        );

        let plugin = VaultReportingPlugin::new(PluginDependencies {
            queue: self.queue.clone(),
            config,
            n: ocr.n,
            f: ocr.f,
            key_material,
        });
        let info = ReportingPluginInfo {
            name: PLUGIN_NAME.to_string(),
            limits,
        };
        Ok((plugin, info))
    }
}
