//! Process-wide cache of per-module settings.
//!
//! The cache starts empty and is filled by bulk loads: the first
//! [`ModuleSettingsCache::get_setting`] on an empty cache loads the settings of
//! every active module, and [`ModuleSettingsCache::get_module_settings`] on an
//! empty module slot loads every stored row. Writes go to the store first and
//! only then into memory. Nothing is ever evicted, so writes made by another
//! process are not observed.

use std::{collections::HashMap, sync::Arc};

use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::application::repos::{BulkLoadScope, RepoError, SettingsRepo};
use crate::domain::{
    codec::{self, CodecError, SettingValue},
    entities::ModuleSettings,
};

const METRIC_SETTINGS_HIT_TOTAL: &str = "tessera_settings_hit_total";
const METRIC_SETTINGS_BULK_LOAD_TOTAL: &str = "tessera_settings_bulk_load_total";
const METRIC_SETTINGS_DEFAULT_SEEDED_TOTAL: &str = "tessera_settings_default_seeded_total";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("setting `{module}.{name}` could not be decoded: {source}")]
    Decode {
        module: String,
        name: String,
        #[source]
        source: CodecError,
    },
    #[error("setting `{module}.{name}` could not be encoded: {source}")]
    Encode {
        module: String,
        name: String,
        #[source]
        source: CodecError,
    },
}

impl SettingsError {
    fn decode(module: &str, name: &str, source: CodecError) -> Self {
        Self::Decode {
            module: module.to_string(),
            name: name.to_string(),
            source,
        }
    }

    fn encode(module: &str, name: &str, source: CodecError) -> Self {
        Self::Encode {
            module: module.to_string(),
            name: name.to_string(),
            source,
        }
    }
}

type SettingsMap = HashMap<String, ModuleSettings>;

/// Shared settings cache. Clones share the same state.
#[derive(Clone)]
pub struct ModuleSettingsCache {
    repo: Arc<dyn SettingsRepo>,
    state: Arc<RwLock<SettingsMap>>,
}

impl ModuleSettingsCache {
    pub fn new(repo: Arc<dyn SettingsRepo>) -> Self {
        Self {
            repo,
            state: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Return the value of `module.name`.
    ///
    /// An empty cache is first filled from the settings of every active
    /// module. A setting that is still missing afterwards is created with
    /// `default` through [`Self::set_setting`], so this read may write to the
    /// store. A setting stored as `null` counts as present and is not reseeded.
    #[instrument(skip(self, default))]
    pub async fn get_setting(
        &self,
        module: &str,
        name: &str,
        default: SettingValue,
    ) -> Result<SettingValue, SettingsError> {
        {
            let state = self.state.read().await;
            if let Some(value) = lookup(&state, module, name) {
                counter!(METRIC_SETTINGS_HIT_TOTAL).increment(1);
                return Ok(value.clone());
            }
        }

        let mut state = self.state.write().await;
        if state.is_empty() {
            self.bulk_load(&mut state, BulkLoadScope::ActiveModules)
                .await?;
        }

        if let Some(value) = lookup(&state, module, name) {
            return Ok(value.clone());
        }

        info!(module, name, "materializing default for missing setting");
        counter!(METRIC_SETTINGS_DEFAULT_SEEDED_TOTAL).increment(1);
        self.write_through(&mut state, module, name, &default).await
    }

    /// Typed variant of [`Self::get_setting`].
    pub async fn get_setting_as<T>(
        &self,
        module: &str,
        name: &str,
        default: T,
    ) -> Result<T, SettingsError>
    where
        T: Serialize + DeserializeOwned,
    {
        let default = serde_json::to_value(&default)
            .map_err(|err| SettingsError::encode(module, name, CodecError::Encode(err)))?;
        let value = self.get_setting(module, name, default).await?;
        serde_json::from_value(value)
            .map_err(|err| SettingsError::decode(module, name, CodecError::Malformed(err)))
    }

    /// Every setting of `module`; empty when the module has none.
    ///
    /// An empty module slot triggers a load of all stored settings, including
    /// those of inactive modules. Missing settings are never created here.
    #[instrument(skip(self))]
    pub async fn get_module_settings(&self, module: &str) -> Result<ModuleSettings, SettingsError> {
        {
            let state = self.state.read().await;
            if let Some(settings) = state.get(module).filter(|settings| !settings.is_empty()) {
                counter!(METRIC_SETTINGS_HIT_TOTAL).increment(1);
                return Ok(settings.clone());
            }
        }

        let mut state = self.state.write().await;
        if state.get(module).is_none_or(|settings| settings.is_empty()) {
            self.bulk_load(&mut state, BulkLoadScope::AllModules).await?;
        }

        Ok(state.get(module).cloned().unwrap_or_default())
    }

    /// Persist `value` for `module.name`, then cache it.
    ///
    /// A failed store write leaves the cache untouched.
    #[instrument(skip(self, value))]
    pub async fn set_setting(
        &self,
        module: &str,
        name: &str,
        value: SettingValue,
    ) -> Result<(), SettingsError> {
        let mut state = self.state.write().await;
        self.write_through(&mut state, module, name, &value)
            .await
            .map(|_| ())
    }

    /// Copy of everything currently cached.
    pub async fn snapshot(&self) -> HashMap<String, ModuleSettings> {
        self.state.read().await.clone()
    }

    async fn write_through(
        &self,
        state: &mut SettingsMap,
        module: &str,
        name: &str,
        value: &SettingValue,
    ) -> Result<SettingValue, SettingsError> {
        let blob =
            codec::encode_value(value).map_err(|err| SettingsError::encode(module, name, err))?;

        self.repo.upsert_setting(module, name, &blob).await?;

        let stored =
            codec::decode_value(&blob).map_err(|err| SettingsError::decode(module, name, err))?;
        state
            .entry(module.to_string())
            .or_default()
            .insert(name.to_string(), stored.clone());

        debug!(module, name, "setting stored");
        Ok(stored)
    }

    async fn bulk_load(
        &self,
        state: &mut SettingsMap,
        scope: BulkLoadScope,
    ) -> Result<(), SettingsError> {
        let rows = self.repo.load_settings(scope).await?;
        counter!(METRIC_SETTINGS_BULK_LOAD_TOTAL, "scope" => scope.as_str()).increment(1);

        // Decode every row before merging; a bad row leaves the cache unchanged.
        let mut decoded = Vec::with_capacity(rows.len());
        for row in rows {
            let value = codec::decode_value(&row.value)
                .map_err(|err| SettingsError::decode(&row.module, &row.name, err))?;
            decoded.push((row.module, row.name, value));
        }

        let count = decoded.len();
        for (module, name, value) in decoded {
            state.entry(module).or_default().insert(name, value);
        }

        info!(scope = scope.as_str(), rows = count, "settings cache populated");
        Ok(())
    }
}

fn lookup<'a>(state: &'a SettingsMap, module: &str, name: &str) -> Option<&'a SettingValue> {
    state.get(module).and_then(|settings| settings.get(name))
}
