//! Language service client
//!
//! Thin adapter over whatever provider the environment offers. Availability
//! is probed once, on first use, and every provider failure is folded into
//! the `ServiceError` taxonomy so the pipeline never sees a surprise.

pub mod http;
#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::shared::errors::{ServiceError, ServiceResult};
use crate::shared::types::{Capability, CapabilityState, Detection, TargetLanguage};

/// What a provider can do in the current environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub detection: bool,
    pub translation: bool,
    pub summarization: bool,
}

impl Capabilities {
    pub fn all() -> Self {
        Self {
            detection: true,
            translation: true,
            summarization: true,
        }
    }

    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Detection => self.detection,
            Capability::Translation => self.translation,
            Capability::Summarization => self.summarization,
        }
    }
}

impl From<Capabilities> for CapabilityState {
    fn from(caps: Capabilities) -> Self {
        if !caps.detection {
            CapabilityState::Missing { capability: Capability::Detection }
        } else if !caps.translation {
            CapabilityState::Missing { capability: Capability::Translation }
        } else {
            CapabilityState::Ready { summarization: caps.summarization }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranslationRequest {
    pub text: String,
    pub source_lang: String,
    pub target_lang: TargetLanguage,
}

/// Underlying detection/translation/summarization capability
#[async_trait]
pub trait LanguageProvider: Send + Sync {
    /// Report which capabilities exist. Called at most once per client.
    async fn probe(&self) -> Capabilities;

    /// Candidate languages, most likely first
    async fn detect(&self, text: &str) -> ServiceResult<Vec<Detection>>;

    async fn translate(&self, request: &TranslationRequest) -> ServiceResult<String>;

    async fn summarize(&self, text: &str) -> ServiceResult<String>;
}

pub struct LanguageServiceClient {
    provider: Arc<dyn LanguageProvider>,
    capabilities: OnceCell<Capabilities>,
}

impl LanguageServiceClient {
    pub fn new(provider: Arc<dyn LanguageProvider>) -> Self {
        Self {
            provider,
            capabilities: OnceCell::new(),
        }
    }

    /// Probe the provider on first call; later calls reuse the answer
    pub async fn capabilities(&self) -> Capabilities {
        *self
            .capabilities
            .get_or_init(|| async {
                let caps = self.provider.probe().await;
                tracing::info!(
                    detection = caps.detection,
                    translation = caps.translation,
                    summarization = caps.summarization,
                    "language service probed"
                );
                caps
            })
            .await
    }

    async fn require(&self, capability: Capability) -> ServiceResult<()> {
        if self.capabilities().await.supports(capability) {
            Ok(())
        } else {
            Err(ServiceError::ServiceUnavailable(capability))
        }
    }

    pub async fn detect(&self, text: &str) -> ServiceResult<Detection> {
        self.require(Capability::Detection).await?;
        if text.trim().is_empty() {
            return Err(ServiceError::DetectionFailed("no text to analyse".to_string()));
        }

        let candidates = self.provider.detect(text).await.map_err(|e| match e {
            ServiceError::ServiceUnavailable(_) | ServiceError::DetectionFailed(_) => e,
            other => ServiceError::DetectionFailed(other.to_string()),
        })?;

        let first = candidates
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::DetectionFailed("no language candidates returned".to_string()))?;
        if first.language.trim().is_empty() {
            return Err(ServiceError::DetectionFailed("empty language tag".to_string()));
        }

        Ok(Detection {
            language: first.language,
            confidence: first.confidence.and_then(normalize_confidence),
        })
    }

    /// Translate `text`. The caller guarantees `source_lang != target_lang`.
    pub async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: TargetLanguage,
    ) -> ServiceResult<String> {
        self.require(Capability::Translation).await?;

        let request = TranslationRequest {
            text: text.to_string(),
            source_lang: source_lang.to_string(),
            target_lang,
        };
        self.provider.translate(&request).await.map_err(|e| match e {
            ServiceError::ServiceUnavailable(_)
            | ServiceError::UnsupportedLanguagePair { .. }
            | ServiceError::TranslationFailed(_) => e,
            other => ServiceError::TranslationFailed(other.to_string()),
        })
    }

    pub async fn summarize(&self, text: &str) -> ServiceResult<String> {
        self.require(Capability::Summarization).await?;

        self.provider.summarize(text).await.map_err(|e| match e {
            ServiceError::ServiceUnavailable(_) | ServiceError::SummarizationFailed(_) => e,
            other => ServiceError::SummarizationFailed(other.to_string()),
        })
    }
}

/// Providers report either a [0,1] score or a percentage in (1, 100].
/// Anything else is not a usable confidence.
fn normalize_confidence(raw: f32) -> Option<f32> {
    if !raw.is_finite() {
        return None;
    }
    if raw <= 1.0 {
        Some(raw.max(0.0))
    } else if raw <= 100.0 {
        Some(raw / 100.0)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedProvider;
    use super::*;

    #[tokio::test]
    async fn test_probe_happens_once() {
        let provider =
            Arc::new(ScriptedProvider::new().with_translation(TargetLanguage::Spanish, Ok("Hola".to_string())));
        let client = LanguageServiceClient::new(provider.clone());

        client.detect("Hello world").await.unwrap();
        client.detect("Hello again").await.unwrap();
        client.translate("Hello", "en", TargetLanguage::Spanish).await.unwrap();

        assert_eq!(provider.probe_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_capability_short_circuits() {
        let provider = Arc::new(ScriptedProvider::new().with_capabilities(Capabilities {
            detection: false,
            translation: true,
            summarization: false,
        }));
        let client = LanguageServiceClient::new(provider.clone());

        let err = client.detect("Hello").await.unwrap_err();
        assert_eq!(err, ServiceError::ServiceUnavailable(Capability::Detection));
        let err = client.summarize("Hello").await.unwrap_err();
        assert_eq!(err, ServiceError::ServiceUnavailable(Capability::Summarization));
        assert_eq!(provider.detect_count(), 0);
    }

    #[tokio::test]
    async fn test_first_candidate_is_authoritative() {
        let provider = Arc::new(ScriptedProvider::new().with_detection(Ok(vec![
            Detection { language: "fr".to_string(), confidence: Some(87.0) },
            Detection { language: "en".to_string(), confidence: Some(0.1) },
        ])));
        let client = LanguageServiceClient::new(provider);

        let detection = client.detect("Bonjour").await.unwrap();
        assert_eq!(detection.language, "fr");
        assert!((detection.confidence.unwrap() - 0.87).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_no_candidates_is_detection_failure() {
        let provider = Arc::new(ScriptedProvider::new().with_detection(Ok(vec![])));
        let client = LanguageServiceClient::new(provider);

        let err = client.detect("???").await.unwrap_err();
        assert!(matches!(err, ServiceError::DetectionFailed(_)));
    }

    #[tokio::test]
    async fn test_foreign_errors_are_folded_into_operation_error() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .with_detection(Err(ServiceError::TranslationFailed("boom".to_string())))
                .with_translation(
                    TargetLanguage::Russian,
                    Err(ServiceError::SummarizationFailed("odd".to_string())),
                ),
        );
        let client = LanguageServiceClient::new(provider);

        assert!(matches!(client.detect("Hi").await, Err(ServiceError::DetectionFailed(_))));
        assert!(matches!(
            client.translate("Hi", "en", TargetLanguage::Russian).await,
            Err(ServiceError::TranslationFailed(_))
        ));
    }

    #[test]
    fn test_normalize_confidence() {
        assert_eq!(normalize_confidence(0.42), Some(0.42));
        assert_eq!(normalize_confidence(1.0), Some(1.0));
        assert_eq!(normalize_confidence(-0.3), Some(0.0));
        assert_eq!(normalize_confidence(87.0), Some(0.87));
        assert_eq!(normalize_confidence(100.0), Some(1.0));
        assert_eq!(normalize_confidence(250.0), None);
        assert_eq!(normalize_confidence(f32::NAN), None);
        assert_eq!(normalize_confidence(f32::INFINITY), None);
    }

    #[tokio::test]
    async fn test_non_finite_confidence_is_dropped() {
        let provider = Arc::new(ScriptedProvider::new().with_detection(Ok(vec![Detection {
            language: "en".to_string(),
            confidence: Some(f32::NAN),
        }])));
        let client = LanguageServiceClient::new(provider);

        let detection = client.detect("Hello").await.unwrap();
        assert_eq!(detection.language, "en");
        assert_eq!(detection.confidence, None);
    }

    #[test]
    fn test_capability_state_from_capabilities() {
        assert_eq!(
            CapabilityState::from(Capabilities::all()),
            CapabilityState::Ready { summarization: true }
        );
        let no_translation = Capabilities {
            detection: true,
            translation: false,
            summarization: true,
        };
        assert_eq!(
            CapabilityState::from(no_translation),
            CapabilityState::Missing { capability: Capability::Translation }
        );
    }
}
