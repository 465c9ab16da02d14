//! Akismet `comment-check` adapter for [`SpamClassifier`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url, header::CONTENT_TYPE};
use tracing::debug;
use url::form_urlencoded::Serializer;

use crate::application::spam::{SpamCandidate, SpamClassifier, SpamError};

pub const DEFAULT_ENDPOINT: &str = "https://rest.akismet.com/1.1/comment-check";

#[derive(Clone, Debug)]
pub struct AkismetClient {
    client: Client,
    endpoint: Url,
    site_url: String,
}

impl AkismetClient {
    pub fn new(
        endpoint: &str,
        site_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SpamError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|err| SpamError::Http(format!("invalid endpoint `{endpoint}`: {err}")))?;
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()
            .map_err(|err| SpamError::Http(err.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            site_url: site_url.into(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("tessera/", env!("CARGO_PKG_VERSION"))
    }

    fn form_body(&self, api_key: &str, candidate: &SpamCandidate) -> String {
        let mut form = Serializer::new(String::new());
        form.append_pair("api_key", api_key)
            .append_pair("blog", &self.site_url)
            .append_pair("permalink", &candidate.permalink)
            .append_pair("comment_type", candidate.kind.as_str())
            .append_pair("comment_content", &candidate.content);

        if let Some(author) = candidate.author.as_deref() {
            form.append_pair("comment_author", author);
        }
        if let Some(email) = candidate.email.as_deref() {
            form.append_pair("comment_author_email", email);
        }
        if let Some(url) = candidate.url.as_deref() {
            form.append_pair("comment_author_url", url);
        }
        if let Some(ip) = candidate.user_ip.as_deref() {
            form.append_pair("user_ip", ip);
        }
        if let Some(agent) = candidate.user_agent.as_deref() {
            form.append_pair("user_agent", agent);
        }

        form.finish()
    }
}

#[async_trait]
impl SpamClassifier for AkismetClient {
    async fn classify(&self, api_key: &str, candidate: &SpamCandidate) -> Result<bool, SpamError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(self.form_body(api_key, candidate))
            .send()
            .await
            .map_err(|err| SpamError::Http(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| SpamError::Http(err.to_string()))?;

        if !status.is_success() {
            return Err(SpamError::Http(format!("status {status} body {body}")));
        }

        debug!(verdict = body.trim(), "akismet responded");
        match body.trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(SpamError::UnexpectedResponse(other.to_string())),
        }
    }
}
