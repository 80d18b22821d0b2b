//! Scripted provider for pipeline tests.
//!
//! Answers are configured up front; translate calls can be held open behind a
//! gate so tests control the order in which completions land.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use super::{Capabilities, LanguageProvider, TranslationRequest};
use crate::shared::errors::{ServiceError, ServiceResult};
use crate::shared::types::{Detection, TargetLanguage};

pub(crate) struct ScriptedProvider {
    capabilities: Capabilities,
    detection: Mutex<ServiceResult<Vec<Detection>>>,
    translations: Mutex<HashMap<TargetLanguage, ServiceResult<String>>>,
    summary: Mutex<ServiceResult<String>>,
    gate: Option<Arc<Semaphore>>,
    probes: AtomicUsize,
    detects: AtomicUsize,
    summaries: AtomicUsize,
    translate_calls: Mutex<Vec<TranslationRequest>>,
}

impl ScriptedProvider {
    /// Everything available; detects English at 0.95
    pub(crate) fn new() -> Self {
        Self {
            capabilities: Capabilities::all(),
            detection: Mutex::new(Ok(vec![Detection {
                language: "en".to_string(),
                confidence: Some(0.95),
            }])),
            translations: Mutex::new(HashMap::new()),
            summary: Mutex::new(Ok("A short summary.".to_string())),
            gate: None,
            probes: AtomicUsize::new(0),
            detects: AtomicUsize::new(0),
            summaries: AtomicUsize::new(0),
            translate_calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub(crate) fn with_detection(self, result: ServiceResult<Vec<Detection>>) -> Self {
        *self.detection.lock().unwrap() = result;
        self
    }

    pub(crate) fn with_translation(self, target: TargetLanguage, result: ServiceResult<String>) -> Self {
        self.translations.lock().unwrap().insert(target, result);
        self
    }

    pub(crate) fn with_summary(self, result: ServiceResult<String>) -> Self {
        *self.summary.lock().unwrap() = result;
        self
    }

    /// Hold every translate and summarize call until `release` is called
    pub(crate) fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    pub(crate) fn release(&self, calls: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(calls);
        }
    }

    pub(crate) fn set_detection(&self, result: ServiceResult<Vec<Detection>>) {
        *self.detection.lock().unwrap() = result;
    }

    pub(crate) fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub(crate) fn detect_count(&self) -> usize {
        self.detects.load(Ordering::SeqCst)
    }

    pub(crate) fn summarize_count(&self) -> usize {
        self.summaries.load(Ordering::SeqCst)
    }

    pub(crate) fn translate_calls(&self) -> Vec<TranslationRequest> {
        self.translate_calls.lock().unwrap().clone()
    }

    pub(crate) fn translate_count(&self) -> usize {
        self.translate_calls.lock().unwrap().len()
    }

    /// Yield until at least `n` translate calls have reached the provider
    pub(crate) async fn wait_for_translate_calls(&self, n: usize) {
        while self.translate_count() < n {
            tokio::task::yield_now().await;
        }
    }

    pub(crate) async fn wait_for_summarize_calls(&self, n: usize) {
        while self.summarize_count() < n {
            tokio::task::yield_now().await;
        }
    }

    async fn pass_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }
    }
}

#[async_trait]
impl LanguageProvider for ScriptedProvider {
    async fn probe(&self) -> Capabilities {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.capabilities
    }

    async fn detect(&self, _text: &str) -> ServiceResult<Vec<Detection>> {
        self.detects.fetch_add(1, Ordering::SeqCst);
        self.detection.lock().unwrap().clone()
    }

    async fn translate(&self, request: &TranslationRequest) -> ServiceResult<String> {
        self.translate_calls.lock().unwrap().push(request.clone());
        self.pass_gate().await;

        self.translations
            .lock()
            .unwrap()
            .get(&request.target_lang)
            .cloned()
            .unwrap_or_else(|| Err(ServiceError::TranslationFailed("no scripted answer".to_string())))
    }

    async fn summarize(&self, _text: &str) -> ServiceResult<String> {
        self.summaries.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await;
        self.summary.lock().unwrap().clone()
    }
}
