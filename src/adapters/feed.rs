use crate::config::toml_config::{FieldMapping, SourceConfig};
use crate::domain::model::{ListingRecord, NOT_AVAILABLE};
use crate::domain::ports::ListingSource;
use crate::utils::error::{Result, ScanError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Listing source reading a JSON search feed over HTTP.
///
/// The endpoint is a template whose `{query}` placeholder receives the
/// URL-encoded search query. Items are found at `items_path` (or the response
/// root when it is an array) and mapped to [`ListingRecord`]s through
/// dot-path field lookups.
pub struct JsonFeedSource {
    client: Client,
    config: SourceConfig,
    base_url: Option<Url>,
}

impl JsonFeedSource {
    pub fn new(config: SourceConfig) -> Result<Self> {
        let base_url = match config.base_url.as_deref() {
            Some(raw) => Some(Url::parse(raw).map_err(|e| {
                ScanError::InvalidConfigValueError {
                    field: "source.base_url".to_string(),
                    value: raw.to_string(),
                    reason: format!("Invalid URL format: {}", e),
                }
            })?),
            None => None,
        };

        Ok(Self {
            client: Client::new(),
            config,
            base_url,
        })
    }

    pub fn build_url(&self, query: &str) -> String {
        let encoded: String =
            url::form_urlencoded::byte_serialize(query.trim().as_bytes()).collect();
        self.config.endpoint.replace("{query}", &encoded)
    }

    fn fields(&self) -> FieldMapping {
        self.config.fields.clone().unwrap_or_default()
    }

    fn extract_items(&self, query: &str, body: Value) -> Result<Vec<Value>> {
        let located = match self.config.items_path.as_deref() {
            Some(path) if !path.is_empty() => lookup(&body, path).cloned(),
            _ => Some(body),
        };

        match located {
            Some(Value::Array(items)) => Ok(items),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(ScanError::FetchFailure {
                query: query.to_string(),
                message: format!(
                    "expected an array of listings at '{}', found {}",
                    self.config.items_path.as_deref().unwrap_or("<root>"),
                    json_kind(&other)
                ),
            }),
        }
    }

    /// 連結必須是絕對 URL；相對連結只在設定 `base_url` 時解析
    fn resolve_link(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() || raw.chars().any(char::is_control) {
            return None;
        }
        if let Ok(absolute) = Url::parse(raw) {
            return Some(absolute.to_string());
        }
        match &self.base_url {
            Some(base) => base.join(raw).ok().map(|u| u.to_string()),
            None => {
                tracing::debug!("Dropping relative link without source.base_url: {}", raw);
                None
            }
        }
    }

    pub fn to_record(&self, item: &Value) -> ListingRecord {
        let fields = self.fields();
        let text = |path: &str| lookup(item, path).and_then(value_to_text);

        ListingRecord {
            link: text(&fields.link).and_then(|raw| self.resolve_link(&raw)),
            title: text(&fields.title),
            price: text(&fields.price).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            size: text(&fields.size).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            image_url: text(&fields.image_url).unwrap_or_default(),
        }
    }
}

#[async_trait]
impl ListingSource for JsonFeedSource {
    async fn fetch(&self, query: &str) -> Result<Vec<ListingRecord>> {
        let url = self.build_url(query);
        let mut request = self.client.get(&url);

        // 添加自定義標頭
        if let Some(headers) = &self.config.headers {
            for (key, value) in headers {
                request = request.header(key, value);
            }
        }

        if let Some(timeout) = self.config.timeout_seconds {
            request = request.timeout(Duration::from_secs(timeout));
        }

        tracing::debug!("Requesting listing feed: {}", url);

        let timeout_seconds = self.config.timeout_seconds;
        let response = request
            .send()
            .await
            .map_err(|e| fetch_error(query, timeout_seconds, e))?;
        let status = response.status();
        tracing::debug!("Feed response status: {}", status);

        if !status.is_success() {
            return Err(ScanError::FetchFailure {
                query: query.to_string(),
                message: format!("feed returned HTTP {}", status),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| fetch_error(query, timeout_seconds, e))?;
        let records: Vec<ListingRecord> = self
            .extract_items(query, body)?
            .iter()
            .map(|item| self.to_record(item))
            .collect();

        tracing::debug!("Feed for '{}' returned {} listings", query, records.len());
        Ok(records)
    }
}

fn fetch_error(query: &str, timeout_seconds: Option<u64>, e: reqwest::Error) -> ScanError {
    if e.is_timeout() {
        ScanError::FetchTimeout {
            query: query.to_string(),
            seconds: timeout_seconds.unwrap_or_default(),
        }
    } else {
        ScanError::FetchFailure {
            query: query.to_string(),
            message: e.to_string(),
        }
    }
}

/// 以點號路徑取值，例如 `photo.url` 或 `photos.0.url`
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Renders a feed value as display text.
///
/// Money objects (`{"amount": "12.0", "currency_code": "GBP"}`) become `12.0 GBP`.
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) => {
            let amount = map.get("amount").and_then(value_to_text)?;
            match map
                .get("currency_code")
                .or_else(|| map.get("currency"))
                .and_then(value_to_text)
            {
                Some(currency) => Some(format!("{} {}", amount, currency)),
                None => Some(amount),
            }
        }
        Value::Null | Value::Array(_) => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
