use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Capabilities, LanguageProvider, TranslationRequest};
use crate::core::detection::detect_script_language;
use crate::shared::errors::{ServiceError, ServiceResult};
use crate::shared::settings::ProviderSettings;
use crate::shared::types::{Capability, Detection};

/// Provider backed by the Google free translate endpoint (detection and
/// translation) and an optional JSON summarizer endpoint.
pub struct HttpLanguageProvider {
    http: Client,
    translate_endpoint: String,
    summarize_endpoint: Option<String>,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct SummarizeBody<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct SummarizeReply {
    summary: String,
}

impl HttpLanguageProvider {
    pub fn new(settings: &ProviderSettings, api_key: Option<String>) -> reqwest::Result<Self> {
        let http = Client::builder().user_agent(settings.user_agent.as_str()).build()?;

        Ok(Self {
            http,
            translate_endpoint: settings.translate_endpoint.trim().to_string(),
            summarize_endpoint: settings
                .summarize_endpoint
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            api_key,
        })
    }

    fn translate_url(&self, source: &str, target: &str, text: &str) -> String {
        format!(
            "{}?client=gtx&sl={}&tl={}&dt=t&q={}",
            self.translate_endpoint,
            source,
            target,
            urlencoding::encode(text)
        )
    }

    async fn fetch(&self, url: &str) -> Result<(StatusCode, Option<Value>), reqwest::Error> {
        let res = self.http.get(url).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Ok((status, None));
        }
        let json = res.json::<Value>().await?;
        Ok((status, Some(json)))
    }
}

#[async_trait]
impl LanguageProvider for HttpLanguageProvider {
    async fn probe(&self) -> Capabilities {
        let translation = !self.translate_endpoint.is_empty();
        Capabilities {
            detection: translation,
            translation,
            summarization: self.summarize_endpoint.is_some(),
        }
    }

    async fn detect(&self, text: &str) -> ServiceResult<Vec<Detection>> {
        let url = self.translate_url("auto", "en", text);
        let (status, json) = self
            .fetch(&url)
            .await
            .map_err(|e| ServiceError::DetectionFailed(e.to_string()))?;
        let json = json.ok_or_else(|| ServiceError::DetectionFailed(format!("Google API Error: {}", status)))?;

        if let Some(detection) = parse_detection(&json) {
            return Ok(vec![detection]);
        }

        // Response carried no source language; fall back to the script heuristic
        match detect_script_language(text) {
            Some(lang) => {
                tracing::debug!(lang, "detection fell back to script heuristic");
                Ok(vec![Detection { language: lang.to_string(), confidence: None }])
            }
            None => Err(ServiceError::DetectionFailed("language could not be determined".to_string())),
        }
    }

    async fn translate(&self, request: &TranslationRequest) -> ServiceResult<String> {
        let target = request.target_lang.code();
        let url = self.translate_url(&request.source_lang, target, &request.text);
        let (status, json) = self
            .fetch(&url)
            .await
            .map_err(|e| ServiceError::TranslationFailed(e.to_string()))?;

        if status == StatusCode::BAD_REQUEST {
            return Err(ServiceError::UnsupportedLanguagePair {
                from: request.source_lang.clone(),
                to: target.to_string(),
            });
        }
        let json = json.ok_or_else(|| ServiceError::TranslationFailed(format!("Google API Error: {}", status)))?;

        parse_translation(&json)
            .ok_or_else(|| ServiceError::TranslationFailed("Invalid response format from Google".to_string()))
    }

    async fn summarize(&self, text: &str) -> ServiceResult<String> {
        let endpoint = self
            .summarize_endpoint
            .as_ref()
            .ok_or(ServiceError::ServiceUnavailable(Capability::Summarization))?;

        let mut req = self.http.post(endpoint).json(&SummarizeBody { text });
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let res = req
            .send()
            .await
            .map_err(|e| ServiceError::SummarizationFailed(e.to_string()))?;
        if !res.status().is_success() {
            return Err(ServiceError::SummarizationFailed(format!(
                "Summarizer error: {}",
                res.status()
            )));
        }

        let reply = res
            .json::<SummarizeReply>()
            .await
            .map_err(|e| ServiceError::SummarizationFailed(format!("Failed to parse JSON: {}", e)))?;
        if reply.summary.trim().is_empty() {
            return Err(ServiceError::SummarizationFailed("empty summary".to_string()));
        }
        Ok(reply.summary)
    }
}

/// Parse nested array: [[["Translated Text", "Source", ...], ...], null, "en", ...]
fn parse_translation(json: &Value) -> Option<String> {
    let sentences = json.get(0)?.as_array()?;
    let translated: String = sentences
        .iter()
        .filter_map(|sentence| sentence.get(0).and_then(|v| v.as_str()))
        .collect();

    if translated.is_empty() {
        None
    } else {
        Some(translated)
    }
}

/// Source language sits at index 2, its confidence (when sent) at index 6
fn parse_detection(json: &Value) -> Option<Detection> {
    let language = json.get(2)?.as_str()?.trim();
    if language.is_empty() || language.eq_ignore_ascii_case("auto") {
        return None;
    }
    let confidence = json.get(6).and_then(|v| v.as_f64()).map(|c| c as f32);

    Some(Detection {
        language: language.to_string(),
        confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_translation_joins_sentences() {
        let body = json!([[["Hola ", "Hello ", null], ["mundo", "world", null]], null, "en"]);
        assert_eq!(parse_translation(&body), Some("Hola mundo".to_string()));
    }

    #[test]
    fn test_parse_translation_rejects_unexpected_shape() {
        assert_eq!(parse_translation(&json!({"error": "nope"})), None);
        assert_eq!(parse_translation(&json!([[]])), None);
    }

    #[test]
    fn test_parse_detection_reads_language_and_confidence() {
        let body = json!([[["Hello", "Hello", null]], null, "en", null, null, null, 0.95]);
        let detection = parse_detection(&body).unwrap();
        assert_eq!(detection.language, "en");
        assert!((detection.confidence.unwrap() - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_parse_detection_without_confidence() {
        let body = json!([[["Hola", "Hola", null]], null, "es"]);
        let detection = parse_detection(&body).unwrap();
        assert_eq!(detection.language, "es");
        assert_eq!(detection.confidence, None);
    }

    #[test]
    fn test_parse_detection_missing_language() {
        assert_eq!(parse_detection(&json!([[["x", "x"]], null, null])), None);
        assert_eq!(parse_detection(&json!([[["x", "x"]], null, "auto"])), None);
    }

    #[tokio::test]
    async fn test_probe_reflects_configured_endpoints() {
        let provider = HttpLanguageProvider::new(&ProviderSettings::default(), None).unwrap();
        let caps = provider.probe().await;
        assert!(caps.detection && caps.translation);
        assert!(!caps.summarization);

        let settings = ProviderSettings {
            summarize_endpoint: Some("http://localhost:9000/summarize".to_string()),
            ..ProviderSettings::default()
        };
        let provider = HttpLanguageProvider::new(&settings, None).unwrap();
        assert!(provider.probe().await.summarization);
    }

    #[tokio::test]
    async fn test_summarize_without_endpoint_is_unavailable() {
        let provider = HttpLanguageProvider::new(&ProviderSettings::default(), None).unwrap();
        let err = provider.summarize("long text").await.unwrap_err();
        assert_eq!(err, ServiceError::ServiceUnavailable(Capability::Summarization));
    }
}
