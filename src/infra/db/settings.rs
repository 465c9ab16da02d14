use async_trait::async_trait;

use crate::{
    application::repos::{BulkLoadScope, RepoError, SettingRow, SettingsRepo},
    domain::types::flag,
};

use super::{PostgresRepositories, map_sqlx_error};

const LOAD_ACTIVE_MODULE_SETTINGS_SQL: &str = r#"
    SELECT ms.module, ms.name, ms.value
    FROM modules_settings AS ms
    INNER JOIN modules AS m ON ms.module = m.name
    WHERE m.active = $1
"#;

const LOAD_ALL_SETTINGS_SQL: &str = r#"
    SELECT ms.module, ms.name, ms.value
    FROM modules_settings AS ms
"#;

const UPSERT_SETTING_SQL: &str = r#"
    INSERT INTO modules_settings (module, name, value)
    VALUES ($1, $2, $3)
    ON CONFLICT (module, name) DO UPDATE SET value = EXCLUDED.value
"#;

#[derive(sqlx::FromRow)]
struct ModuleSettingRow {
    module: String,
    name: String,
    value: String,
}

impl From<ModuleSettingRow> for SettingRow {
    fn from(row: ModuleSettingRow) -> Self {
        Self {
            module: row.module,
            name: row.name,
            value: row.value,
        }
    }
}

#[async_trait]
impl SettingsRepo for PostgresRepositories {
    async fn load_settings(&self, scope: BulkLoadScope) -> Result<Vec<SettingRow>, RepoError> {
        let query = match scope {
            BulkLoadScope::ActiveModules => {
                sqlx::query_as::<_, ModuleSettingRow>(LOAD_ACTIVE_MODULE_SETTINGS_SQL)
                    .bind(flag(true))
            }
            BulkLoadScope::AllModules => sqlx::query_as::<_, ModuleSettingRow>(LOAD_ALL_SETTINGS_SQL),
        };

        let rows = query.fetch_all(self.pool()).await.map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(SettingRow::from).collect())
    }

    async fn upsert_setting(
        &self,
        module: &str,
        name: &str,
        value: &str,
    ) -> Result<(), RepoError> {
        sqlx::query(UPSERT_SETTING_SQL)
            .bind(module)
            .bind(name)
            .bind(value)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }
}
