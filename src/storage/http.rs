//! HTTP object store
//!
//! Talks to an S3-compatible endpoint using path-style addressing
//! (`{endpoint}/{bucket}/{key}`) and ListObjectsV2 for listing. Requests are
//! authenticated with an optional bearer token; request signing is left to a
//! gateway in front of the store.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use super::object_store::ObjectStore;

/// Object store reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    client: Client,
    endpoint: Url,
    token: Option<String>,
}

impl HttpObjectStore {
    /// Create a store for the given endpoint, e.g. `http://localhost:9000`
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint =
            Url::parse(endpoint).with_context(|| format!("Invalid storage endpoint: {}", endpoint))?;
        if endpoint.cannot_be_a_base() {
            anyhow::bail!("Storage endpoint cannot be used as a base URL: {}", endpoint);
        }
        Ok(Self {
            client: Client::new(),
            endpoint,
            token: None,
        })
    }

    /// Authenticate requests with a bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Build `{endpoint}/{bucket}/{key...}` with each segment percent-encoded
    fn object_url(&self, bucket: &str, key: Option<&str>) -> Result<Url> {
        let mut url = self.endpoint.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| anyhow!("Storage endpoint cannot be used as a base URL"))?;
            segments.pop_if_empty().push(bucket);
            if let Some(key) = key {
                segments.extend(key.split('/'));
            }
        }
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let url = self.object_url(bucket, Some(key))?;
        tracing::debug!("[Storage] GET {}", url);

        let response = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .context("Failed to send GET to object store")?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let bytes = response
                    .bytes()
                    .await
                    .context("Failed to read object body")?;
                Ok(Some(bytes.to_vec()))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                anyhow::bail!("Object store GET {}/{} failed ({}): {}", bucket, key, status, body)
            }
        }
    }

    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        let url = self.object_url(bucket, Some(key))?;
        tracing::debug!("[Storage] PUT {} ({} bytes)", url, body.len());

        let response = self
            .request(reqwest::Method::PUT, url)
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .context("Failed to send PUT to object store")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Object store PUT {}/{} failed ({}): {}", bucket, key, status, body);
        }
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        let url = self.object_url(bucket, Some(key))?;
        tracing::debug!("[Storage] DELETE {}", url);

        let response = self
            .request(reqwest::Method::DELETE, url)
            .send()
            .await
            .context("Failed to send DELETE to object store")?;

        let status = response.status();
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Object store DELETE {}/{} failed ({}): {}", bucket, key, status, body);
        }
        Ok(())
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut url = self.object_url(bucket, None)?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("list-type", "2").append_pair("prefix", prefix);
                if let Some(token) = &continuation {
                    query.append_pair("continuation-token", token);
                }
            }
            tracing::debug!("[Storage] LIST {}", url);

            let response = self
                .request(reqwest::Method::GET, url)
                .send()
                .await
                .context("Failed to send LIST to object store")?;

            let status = response.status();
            let body = response
                .text()
                .await
                .context("Failed to read LIST response")?;

            if status == StatusCode::NOT_FOUND {
                return Ok(Vec::new());
            }
            if !status.is_success() {
                anyhow::bail!("Object store LIST {} failed ({}): {}", bucket, status, body);
            }

            let page = parse_list_response(&body);
            keys.extend(page.keys);

            match page.next_token {
                Some(token) if page.truncated => continuation = Some(token),
                _ => break,
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// One page of a ListObjectsV2 response
#[derive(Debug, Default, PartialEq)]
struct ListPage {
    keys: Vec<String>,
    truncated: bool,
    next_token: Option<String>,
}

fn parse_list_response(xml: &str) -> ListPage {
    ListPage {
        keys: tag_values(xml, "Key"),
        truncated: tag_values(xml, "IsTruncated")
            .first()
            .map_or(false, |v| v == "true"),
        next_token: tag_values(xml, "NextContinuationToken").into_iter().next(),
    }
}

/// Text content of every `<tag>...</tag>` element, entity-decoded
fn tag_values(xml: &str, tag: &str) -> Vec<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let mut values = Vec::new();
    let mut rest = xml;

    while let Some(start) = rest.find(&open) {
        let after = &rest[start + open.len()..];
        let Some(end) = after.find(&close) else { break };
        values.push(unescape_xml(&after[..end]));
        rest = &after[end + close.len()..];
    }
    values
}

/// Decode predefined and numeric (`&#13;`, `&#x0D;`) references in one pass
fn unescape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .and_then(|end| decode_reference(&tail[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
