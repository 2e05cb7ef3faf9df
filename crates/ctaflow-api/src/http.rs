use async_trait::async_trait;
use ctaflow_codec::decode_usage;
use ctaflow_config::{ApiConfig, FlowRecord, TemplateDef, UsageReport};
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::ApiError;
use crate::types::{UpdateOutcome, extract_id};
use crate::{FlowApi, TemplateCatalog};

const FLOWS: &str = "cta-flows";
const TEMPLATES: &str = "templates";

/// [`FlowApi`] over HTTP.
///
/// Endpoints, relative to the configured base url:
/// - `GET/PUT/DELETE cta-flows/{id}`, `POST cta-flows`
/// - `POST cta-flows/{id}/publish`, `POST cta-flows/{id}/fork`
/// - `GET cta-flows/{id}/usage`
/// - `GET templates`
#[derive(Debug, Clone)]
pub struct HttpFlowApi {
  client: Client,
  base_url: Url,
  auth_token: Option<String>,
}

impl HttpFlowApi {
  pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
    let base_url = Url::parse(&config.base_url).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
    if base_url.cannot_be_a_base() {
      return Err(ApiError::InvalidUrl(config.base_url.clone()));
    }
    Ok(Self {
      client: Client::new(),
      base_url,
      auth_token: config.auth_token.clone(),
    })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  /// Join path segments onto the base url. Segments are percent-encoded.
  pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = self.base_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  fn request(&self, method: Method, url: Url) -> RequestBuilder {
    let request = self.client.request(method, url);
    match &self.auth_token {
      Some(token) => request.bearer_auth(token),
      None => request,
    }
  }

  async fn send(&self, request: RequestBuilder) -> Result<Value, ApiError> {
    let response = request.send().await?;
    let status = response.status().as_u16();
    let body = response.text().await?;
    debug!(status, bytes = body.len(), "flow api response");
    classify_response(status, &body)
  }

  async fn call(&self, method: Method, segments: &[&str]) -> Result<Value, ApiError> {
    let url = self.endpoint(segments)?;
    self.send(self.request(method, url)).await
  }

  async fn call_with(
    &self,
    method: Method,
    segments: &[&str],
    record: &FlowRecord,
  ) -> Result<Value, ApiError> {
    let url = self.endpoint(segments)?;
    self.send(self.request(method, url).json(record)).await
  }
}

/// Map a status and body to the call result.
///
/// Success bodies are parsed as JSON; an empty body becomes `null`. A 409
/// carries the conflicting campaigns when the body lists them.
pub fn classify_response(status: u16, body: &str) -> Result<Value, ApiError> {
  let parsed = if body.trim().is_empty() {
    Some(Value::Null)
  } else {
    serde_json::from_str::<Value>(body).ok()
  };

  match status {
    200..=299 => parsed.ok_or_else(|| ApiError::decode("response body is not json")),
    404 => Err(ApiError::NotFound(error_message(parsed.as_ref(), body))),
    409 => {
      let campaigns = parsed
        .as_ref()
        .and_then(|value| decode_usage(value).ok())
        .map(|report| report.campaigns);
      if campaigns.is_none() {
        warn!("conflict response did not list campaigns");
      }
      Err(ApiError::Conflict { campaigns })
    }
    _ => Err(ApiError::status(status, error_message(parsed.as_ref(), body))),
  }
}

fn error_message(parsed: Option<&Value>, body: &str) -> String {
  parsed
    .and_then(|value| {
      ["message", "Message", "error", "Error"]
        .iter()
        .find_map(|key| value.get(*key))
        .and_then(Value::as_str)
    })
    .unwrap_or(body)
    .trim()
    .to_string()
}

#[async_trait]
impl FlowApi for HttpFlowApi {
  async fn load_flow(&self, flow_id: &str) -> Result<FlowRecord, ApiError> {
    let body = self.call(Method::GET, &[FLOWS, flow_id]).await?;
    let body = match body {
      Value::Object(mut map) if map.get("data").is_some_and(Value::is_object) => {
        map.remove("data").unwrap_or_default()
      }
      other => other,
    };
    Ok(serde_json::from_value(body)?)
  }

  async fn create_flow(&self, record: &FlowRecord) -> Result<String, ApiError> {
    let body = self.call_with(Method::POST, &[FLOWS], record).await?;
    extract_id(&body)
  }

  async fn update_flow(
    &self,
    flow_id: &str,
    record: &FlowRecord,
  ) -> Result<UpdateOutcome, ApiError> {
    let body = self.call_with(Method::PUT, &[FLOWS, flow_id], record).await?;
    Ok(UpdateOutcome::from_body(&body))
  }

  async fn publish_flow(&self, flow_id: &str) -> Result<(), ApiError> {
    self.call(Method::POST, &[FLOWS, flow_id, "publish"]).await?;
    Ok(())
  }

  async fn fork_flow(&self, flow_id: &str) -> Result<String, ApiError> {
    let body = self.call(Method::POST, &[FLOWS, flow_id, "fork"]).await?;
    extract_id(&body)
  }

  async fn get_usage(&self, flow_id: &str) -> Result<UsageReport, ApiError> {
    let body = self.call(Method::GET, &[FLOWS, flow_id, "usage"]).await?;
    decode_usage(&body).map_err(|e| ApiError::decode(e.to_string()))
  }

  async fn delete_flow(&self, flow_id: &str) -> Result<(), ApiError> {
    self.call(Method::DELETE, &[FLOWS, flow_id]).await?;
    Ok(())
  }
}

#[async_trait]
impl TemplateCatalog for HttpFlowApi {
  async fn list_templates(&self) -> Result<Vec<TemplateDef>, ApiError> {
    let body = self.call(Method::GET, &[TEMPLATES]).await?;
    let list = match body {
      Value::Array(list) => Value::Array(list),
      Value::Object(mut map) => ["templates", "Templates", "data", "Data"]
        .iter()
        .find_map(|key| map.remove(*key))
        .filter(Value::is_array)
        .ok_or_else(|| ApiError::decode("template response has no list"))?,
      _ => return Err(ApiError::decode("template response has no list")),
    };
    Ok(serde_json::from_value(list)?)
  }
}
