//! 链节点通用调用：JSON-RPC 2.0 与 REST
//!
//! 非 2xx 响应连同响应体一起报错；JSON-RPC `error` 对象映射为 `RPC error {code}: {message}`

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};

/// 各链适配器共用的 HTTP 客户端
pub fn build_http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(10)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'a str,
    id: &'a serde_json::Value,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    http_client: reqwest::Client,
    url: String,
    id: serde_json::Value,
}

impl JsonRpcClient {
    pub fn new(http_client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http_client,
            url: url.into(),
            id: serde_json::Value::from(1),
        }
    }

    /// NEAR 节点接受任意字符串 id
    pub fn with_id(mut self, id: impl Into<serde_json::Value>) -> Self {
        self.id = id.into();
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T> {
        tracing::debug!(url = %self.url, method = %method, "json-rpc call");

        let payload = JsonRpcRequest {
            jsonrpc: "2.0",
            id: &self.id,
            method,
            params,
        };
        let response = self
            .http_client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", method))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            anyhow::bail!("RPC request failed with status {}: {}", status, body);
        }

        let mut json: serde_json::Value =
            serde_json::from_str(&body).context("Failed to parse JSON response")?;

        if let Some(error) = json.get("error").filter(|e| !e.is_null()) {
            let error_msg = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown RPC error");
            let error_code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(-1);
            anyhow::bail!("RPC error {}: {}", error_code, error_msg);
        }

        let result = json
            .get_mut("result")
            .map(serde_json::Value::take)
            .filter(|r| !r.is_null())
            .context("Missing result field in RPC response")?;

        serde_json::from_value(result)
            .with_context(|| format!("Unexpected {} result shape", method))
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .context("Failed to read response body")?;
    if !status.is_success() {
        anyhow::bail!("request failed with status {}: {}", status, body);
    }
    serde_json::from_str(&body).context("Failed to parse JSON response")
}

pub async fn get_json<T: DeserializeOwned>(http_client: &reqwest::Client, url: &str) -> Result<T> {
    tracing::debug!(url = %url, "GET");
    let response = http_client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to send GET {}", url))?;
    read_json(response).await
}

pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
    http_client: &reqwest::Client,
    url: &str,
    body: &B,
) -> Result<T> {
    tracing::debug!(url = %url, "POST json");
    let response = http_client
        .post(url)
        .json(body)
        .send()
        .await
        .with_context(|| format!("Failed to send POST {}", url))?;
    read_json(response).await
}

/// 表单提交（Stellar Horizon）
pub async fn post_form<T: DeserializeOwned>(
    http_client: &reqwest::Client,
    url: &str,
    form: &[(&str, &str)],
) -> Result<T> {
    tracing::debug!(url = %url, "POST form");
    let response = http_client
        .post(url)
        .form(form)
        .send()
        .await
        .with_context(|| format!("Failed to send POST {}", url))?;
    read_json(response).await
}

/// 二进制载荷提交（Aptos BCS）
pub async fn post_bytes<T: DeserializeOwned>(
    http_client: &reqwest::Client,
    url: &str,
    content_type: &str,
    body: Vec<u8>,
) -> Result<T> {
    tracing::debug!(url = %url, content_type = %content_type, "POST bytes");
    let response = http_client
        .post(url)
        .header(reqwest::header::CONTENT_TYPE, content_type)
        .body(body)
        .send()
        .await
        .with_context(|| format!("Failed to send POST {}", url))?;
    read_json(response).await
}

/// 纯文本提交，返回去除空白的响应体（Esplora `/tx`）
pub async fn post_text(http_client: &reqwest::Client, url: &str, body: String) -> Result<String> {
    tracing::debug!(url = %url, "POST text");
    let response = http_client
        .post(url)
        .header(reqwest::header::CONTENT_TYPE, "text/plain")
        .body(body)
        .send()
        .await
        .with_context(|| format!("Failed to send POST {}", url))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .context("Failed to read response body")?;
    if !status.is_success() {
        anyhow::bail!("request failed with status {}: {}", status, text);
    }
    Ok(text.trim().to_string())
}
