//! Product description client for the hosted vision endpoint.
//!
//! The endpoint analyzes a product photo and returns arbitrary JSON copy
//! (title, bullets, descriptions). Some deployments wrap the useful payload
//! in a `status` envelope; [`unwrap_envelope`] peels that off.

use crate::truncate_body;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use opticore_core::config::VisionConfig;
use opticore_core::{OptiCoreError, Result};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Inner keys tried, in order, when unwrapping a `status` envelope.
const ENVELOPE_KEYS: [&str; 6] = ["data", "result", "product", "payload", "output", "response"];

#[derive(Serialize)]
struct DescribeImageRequest<'a> {
    image_base64: String,
    prompt_extra: &'a str,
}

#[derive(Serialize)]
struct DescribeUrlRequest<'a> {
    image_url: &'a str,
    desc_basica: Option<&'a str>,
}

/// Client for the product-vision describe endpoint.
#[derive(Clone)]
pub struct VisionClient {
    client: Client,
    describe_url: String,
    timeout: Duration,
}

impl VisionClient {
    pub fn new(describe_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            describe_url: describe_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Loads the endpoint URL from the environment (`CF_DESCRIBE_URL`).
    pub fn try_from_env() -> Result<Self> {
        Ok(Self::new(VisionConfig::from_env()?.describe_url))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Describes a product from raw image bytes. The image travels as a
    /// data-URL-prefixed base64 string (`data:<mime>;base64,...`), mime
    /// defaulting to `image/jpeg`.
    pub async fn describe_image(
        &self,
        image: &[u8],
        mime: Option<&str>,
        prompt_extra: &str,
    ) -> Result<Value> {
        let payload = DescribeImageRequest {
            image_base64: to_data_url(image, mime),
            prompt_extra,
        };
        self.post(&payload).await
    }

    /// Describes a product already hosted at a URL.
    pub async fn describe_url(&self, image_url: &str, desc_basica: Option<&str>) -> Result<Value> {
        let payload = DescribeUrlRequest {
            image_url,
            desc_basica,
        };
        self.post(&payload).await
    }

    async fn post<T: Serialize>(&self, payload: &T) -> Result<Value> {
        let response = self
            .client
            .post(&self.describe_url)
            .json(payload)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(OptiCoreError::Http {
                service: "product vision",
                status: status.as_u16(),
                body: truncate_body(&body, 400),
            });
        }

        // A 2xx with a non-JSON body still reaches the caller, wrapped.
        Ok(serde_json::from_str(&body).unwrap_or_else(|_| serde_json::json!({ "raw": body })))
    }
}

/// Strips the `status` envelope some deployments wrap around the payload.
///
/// Known inner keys are preferred in order; failing those, the `status` key
/// is dropped (and a single remaining value is collapsed). Responses without
/// an envelope pass through untouched.
pub fn unwrap_envelope(data: Value) -> Value {
    let Value::Object(map) = data else {
        return data;
    };
    if !map.contains_key("status") {
        return Value::Object(map);
    }
    for key in ENVELOPE_KEYS {
        if let Some(inner) = map.get(key) {
            return inner.clone();
        }
    }
    let rest: serde_json::Map<String, Value> =
        map.into_iter().filter(|(key, _)| key != "status").collect();
    if rest.len() == 1 {
        return rest.into_iter().next().map(|(_, value)| value).unwrap_or(Value::Null);
    }
    Value::Object(rest)
}

fn to_data_url(image: &[u8], mime: Option<&str>) -> String {
    let mime = mime
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or("image/jpeg");
    format!("data:{mime};base64,{}", BASE64_STANDARD.encode(image))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn data_url_carries_mime_and_base64_payload() {
        assert_eq!(
            to_data_url(b"img1", Some("image/png")),
            "data:image/png;base64,aW1nMQ=="
        );
        assert_eq!(to_data_url(b"img1", None), "data:image/jpeg;base64,aW1nMQ==");
        assert_eq!(to_data_url(b"img1", Some("  ")), "data:image/jpeg;base64,aW1nMQ==");
    }

    #[test]
    fn envelope_prefers_known_inner_keys_in_order() {
        let wrapped = json!({"status":"ok","result":{"title":"B"},"data":{"title":"A"}});
        assert_eq!(unwrap_envelope(wrapped), json!({"title":"A"}));
    }

    #[test]
    fn envelope_without_known_keys_strips_status() {
        let wrapped = json!({"status":"ok","title":"Crema de maní","bullets":[]});
        assert_eq!(
            unwrap_envelope(wrapped),
            json!({"title":"Crema de maní","bullets":[]})
        );
    }

    #[test]
    fn single_remaining_value_is_collapsed() {
        let wrapped = json!({"status":"ok","descripcion":"Texto del copy"});
        assert_eq!(unwrap_envelope(wrapped), json!("Texto del copy"));
    }

    #[test]
    fn responses_without_envelope_pass_through() {
        let plain = json!({"title":"Sin envoltura"});
        assert_eq!(unwrap_envelope(plain.clone()), plain);
        let non_object = json!(["a", "b"]);
        assert_eq!(unwrap_envelope(non_object.clone()), non_object);
    }
}
