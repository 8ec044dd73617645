use crate::config::toml_config::{NotifierConfig, NotifierKind};
use crate::domain::model::MatchResult;
use crate::domain::ports::Notifier;
use crate::utils::error::{Result, ScanError};
use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;

const TEST_TITLE: &str = "Listing Scanner Test";
const TEST_MESSAGE: &str = "This is a test notification from listing-scanner.";

/// JSON body posted to `webhook` notifiers.
#[derive(Debug, Serialize)]
pub struct WebhookPayload<'a> {
    pub brand: &'a str,
    pub title: &'a str,
    pub link: &'a str,
    pub price: &'a str,
    pub size: &'a str,
    pub image_url: &'a str,
    pub found_at: String,
}

impl<'a> WebhookPayload<'a> {
    pub fn from_match(found: &'a MatchResult) -> Self {
        Self {
            brand: &found.brand,
            title: &found.title,
            link: &found.link,
            price: &found.listing.price,
            size: &found.listing.size,
            image_url: &found.listing.image_url,
            found_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Posts match notifications to an ntfy topic or a generic JSON webhook.
pub struct HttpNotifier {
    client: Client,
    config: NotifierConfig,
}

impl HttpNotifier {
    pub fn new(config: NotifierConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn ntfy_message(found: &MatchResult) -> String {
        format!(
            "New listing found for '{}'\nPrice: {}\nSize: {}",
            found.brand, found.listing.price, found.listing.size
        )
    }

    fn post(&self) -> RequestBuilder {
        self.client.post(&self.config.url).timeout(self.config.timeout())
    }

    fn ntfy_request(&self, found: &MatchResult) -> Result<RequestBuilder> {
        let mut request = self
            .post()
            .header("Title", header_value(&found.link, &found.title)?)
            .header("Click", header_value(&found.link, &found.link)?);

        if let Some(tags) = self.config.tags.as_ref().filter(|t| !t.is_empty()) {
            request = request.header("Tags", header_value(&found.link, &tags.join(","))?);
        }
        if !found.listing.image_url.is_empty() {
            let attach = header_value(&found.link, &found.listing.image_url)?;
            request = request.header("Attach", attach);
        }

        Ok(request.body(Self::ntfy_message(found)))
    }

    async fn send(&self, link: &str, request: RequestBuilder) -> Result<()> {
        let response = request.send().await.map_err(|e| ScanError::NotifierFailure {
            link: link.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::NotifierFailure {
                link: link.to_string(),
                message: format!("notifier returned HTTP {}", status),
            });
        }
        Ok(())
    }

    /// Sends a fixed message to check the destination is reachable.
    pub async fn send_test_notification(&self) -> Result<()> {
        let request = match self.config.r#type {
            NotifierKind::Ntfy => self.post().header("Title", TEST_TITLE).body(TEST_MESSAGE),
            NotifierKind::Webhook => self.post().json(&serde_json::json!({
                "test": true,
                "title": TEST_TITLE,
                "message": TEST_MESSAGE,
            })),
        };
        self.send(&self.config.url, request).await
    }
}

/// Header values carry listing titles, which may hold UTF-8; only line breaks
/// and other control characters are rejected by HTTP.
fn header_value(link: &str, raw: &str) -> Result<HeaderValue> {
    let cleaned: String = raw.chars().filter(|c| !c.is_control()).collect();
    HeaderValue::from_bytes(cleaned.as_bytes()).map_err(|e| ScanError::NotifierFailure {
        link: link.to_string(),
        message: format!("invalid header value: {}", e),
    })
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, found: &MatchResult) -> Result<()> {
        let request = match self.config.r#type {
            NotifierKind::Ntfy => self.ntfy_request(found)?,
            NotifierKind::Webhook => self.post().json(&WebhookPayload::from_match(found)),
        };

        self.send(&found.link, request).await?;
        tracing::debug!(link = %found.link, "Notification delivered");
        Ok(())
    }
}
