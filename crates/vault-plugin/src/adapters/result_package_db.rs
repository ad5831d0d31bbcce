use crate::domain::{PluginResult, ResultPackageValue};
use crate::ports::ResultPackageDatabase;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory implementation of ResultPackageDatabase.
#[derive(Default)]
pub struct InMemoryResultPackageDb {
    packages: RwLock<HashMap<String, ResultPackageValue>>,
}

impl InMemoryResultPackageDb {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultPackageDatabase for InMemoryResultPackageDb {
    async fn read_result_package(
        &self,
        instance_id: &str,
    ) -> PluginResult<Option<ResultPackageValue>> {
        Ok(self.packages.read().get(instance_id).cloned())
    }

    async fn write_result_package(
        &self,
        instance_id: &str,
        value: ResultPackageValue,
    ) -> PluginResult<()> {
        self.packages.write().insert(instance_id.to_string(), value);
        Ok(())
    }
}
