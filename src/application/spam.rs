//! Spam classification of user-submitted content.

use std::{convert::Infallible, str::FromStr, sync::Arc};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::settings::{ModuleSettingsCache, SettingsError};

pub const SPAM_KEY_MODULE: &str = "core";
pub const SPAM_KEY_SETTING: &str = "akismet_key";

#[derive(Debug, Error)]
pub enum SpamError {
    #[error("spam provider request failed: {0}")]
    Http(String),
    #[error("spam provider returned an unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// What kind of submission is being checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CommentKind {
    #[default]
    Comment,
    Trackback,
    Pingback,
    Registration,
    Blank,
    Other(String),
}

impl CommentKind {
    pub fn as_str(&self) -> &str {
        match self {
            CommentKind::Comment => "comment",
            CommentKind::Trackback => "trackback",
            CommentKind::Pingback => "pingback",
            CommentKind::Registration => "registration",
            CommentKind::Blank => "",
            CommentKind::Other(value) => value,
        }
    }
}

impl FromStr for CommentKind {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value.trim() {
            "" => CommentKind::Blank,
            "comment" => CommentKind::Comment,
            "trackback" => CommentKind::Trackback,
            "pingback" => CommentKind::Pingback,
            "registration" => CommentKind::Registration,
            other => CommentKind::Other(other.to_string()),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SpamCandidate {
    pub content: String,
    pub permalink: String,
    pub author: Option<String>,
    pub email: Option<String>,
    pub url: Option<String>,
    pub kind: CommentKind,
    pub user_ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Remote classifier contract.
#[async_trait]
pub trait SpamClassifier: Send + Sync {
    async fn classify(&self, api_key: &str, candidate: &SpamCandidate) -> Result<bool, SpamError>;
}

#[derive(Clone)]
pub struct SpamCheckService {
    settings: ModuleSettingsCache,
    classifier: Arc<dyn SpamClassifier>,
    surface_errors: bool,
}

impl SpamCheckService {
    /// `surface_errors` returns classifier failures instead of treating them as "not spam".
    pub fn new(
        settings: ModuleSettingsCache,
        classifier: Arc<dyn SpamClassifier>,
        surface_errors: bool,
    ) -> Self {
        Self {
            settings,
            classifier,
            surface_errors,
        }
    }

    pub async fn is_spam(&self, candidate: &SpamCandidate) -> Result<bool, SpamError> {
        let key = self
            .settings
            .get_setting(SPAM_KEY_MODULE, SPAM_KEY_SETTING, Value::String(String::new()))
            .await?;

        let key = match &key {
            Value::String(key) => key.trim(),
            _ => "",
        };
        if key.is_empty() {
            debug!("no spam provider key configured");
            return Ok(false);
        }

        match self.classifier.classify(key, candidate).await {
            Ok(verdict) => Ok(verdict),
            Err(err) if self.surface_errors => Err(err),
            Err(err) => {
                warn!(error = %err, permalink = %candidate.permalink, "spam check failed; assuming not spam");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use crate::application::repos::{BulkLoadScope, RepoError, SettingRow, SettingsRepo};

    #[derive(Default)]
    struct MemorySettingsRepo {
        rows: Mutex<Vec<SettingRow>>,
    }

    #[async_trait]
    impl SettingsRepo for MemorySettingsRepo {
        async fn load_settings(&self, _scope: BulkLoadScope) -> Result<Vec<SettingRow>, RepoError> {
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn upsert_setting(
            &self,
            module: &str,
            name: &str,
            value: &str,
        ) -> Result<(), RepoError> {
            let mut rows = self.rows.lock().unwrap();
            rows.retain(|row| !(row.module == module && row.name == name));
            rows.push(SettingRow {
                module: module.to_string(),
                name: name.to_string(),
                value: value.to_string(),
            });
            Ok(())
        }
    }

    struct ScriptedClassifier {
        verdict: Result<bool, &'static str>,
        calls: AtomicUsize,
        keys: Mutex<Vec<String>>,
    }

    impl ScriptedClassifier {
        fn new(verdict: Result<bool, &'static str>) -> Arc<Self> {
            Arc::new(Self {
                verdict,
                calls: AtomicUsize::new(0),
                keys: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl SpamClassifier for ScriptedClassifier {
        async fn classify(
            &self,
            api_key: &str,
            _candidate: &SpamCandidate,
        ) -> Result<bool, SpamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.keys.lock().unwrap().push(api_key.to_string());
            self.verdict
                .map_err(|message| SpamError::Http(message.to_string()))
        }
    }

    fn candidate() -> SpamCandidate {
        SpamCandidate {
            content: "cheap watches".into(),
            permalink: "https://example.com/blog/hello".into(),
            author: Some("viagra-test-123".into()),
            ..Default::default()
        }
    }

    async fn settings_with_key(key: Option<&str>) -> ModuleSettingsCache {
        let cache = ModuleSettingsCache::new(Arc::new(MemorySettingsRepo::default()));
        if let Some(key) = key {
            cache
                .set_setting(SPAM_KEY_MODULE, SPAM_KEY_SETTING, json!(key))
                .await
                .expect("seed key");
        }
        cache
    }

    #[tokio::test]
    async fn blank_key_skips_provider() {
        let classifier = ScriptedClassifier::new(Ok(true));
        let settings = settings_with_key(None).await;
        let service = SpamCheckService::new(settings.clone(), classifier.clone(), true);

        let verdict = service.is_spam(&candidate()).await.expect("verdict");

        assert!(!verdict);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
        let core = settings.get_module_settings("core").await.expect("core");
        assert_eq!(core.get(SPAM_KEY_SETTING), Some(&json!("")));
    }

    #[tokio::test]
    async fn provider_verdict_is_returned() {
        let classifier = ScriptedClassifier::new(Ok(true));
        let service =
            SpamCheckService::new(settings_with_key(Some("abc123")).await, classifier.clone(), false);

        assert!(service.is_spam(&candidate()).await.expect("verdict"));
        assert_eq!(classifier.keys.lock().unwrap().as_slice(), &["abc123".to_string()]);
    }

    #[tokio::test]
    async fn provider_failure_is_not_spam_outside_debug() {
        let classifier = ScriptedClassifier::new(Err("connection refused"));
        let service =
            SpamCheckService::new(settings_with_key(Some("abc123")).await, classifier, false);

        assert!(!service.is_spam(&candidate()).await.expect("swallowed"));
    }

    #[tokio::test]
    async fn provider_failure_surfaces_in_debug() {
        let classifier = ScriptedClassifier::new(Err("connection refused"));
        let service =
            SpamCheckService::new(settings_with_key(Some("abc123")).await, classifier, true);

        let err = service.is_spam(&candidate()).await.expect_err("surfaced");
        assert!(matches!(err, SpamError::Http(_)));
    }

    #[test]
    fn comment_kinds_parse() {
        assert_eq!("pingback".parse::<CommentKind>(), Ok(CommentKind::Pingback));
        assert_eq!("".parse::<CommentKind>(), Ok(CommentKind::Blank));
        assert_eq!(
            "contact_form".parse::<CommentKind>(),
            Ok(CommentKind::Other("contact_form".into()))
        );
        assert_eq!(CommentKind::default().as_str(), "comment");
    }
}
