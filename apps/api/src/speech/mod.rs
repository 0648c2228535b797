//! Speech transcription — pluggable, trait-based recognizer behind a ranked
//! ladder of attempt configurations.
//!
//! The external service frequently rejects an utterance on the first pass and
//! accepts it with looser sensitivity settings, so each transcription runs up
//! to three attempts. Every attempt carries its own immutable
//! `RecognitionConfig`; no recognizer state is mutated between attempts.
//!
//! `AppState` holds an `Arc<dyn SpeechRecognizer>`, swapped at startup.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use thiserror::Error;
use tracing::{info, warn};

// ────────────────────────────────────────────────────────────────────────────
// Attempt configurations
// ────────────────────────────────────────────────────────────────────────────

/// Sensitivity settings for a single recognition attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecognitionConfig {
    pub label: &'static str,
    /// Minimum audio energy to treat as speech.
    pub energy_threshold: u32,
    /// Seconds of silence that end a phrase.
    pub pause_threshold: f64,
}

/// The ranked attempt ladder, tried in order until one succeeds:
/// defaults first, then a longer pause threshold for slow speakers, then a
/// higher energy threshold for noisy recordings.
pub fn attempt_ladder() -> [RecognitionConfig; 3] {
    [
        RecognitionConfig {
            label: "default",
            energy_threshold: 300,
            pause_threshold: 0.8,
        },
        RecognitionConfig {
            label: "raised-pause",
            energy_threshold: 300,
            pause_threshold: 1.0,
        },
        RecognitionConfig {
            label: "raised-energy",
            energy_threshold: 400,
            pause_threshold: 0.8,
        },
    ]
}

// ────────────────────────────────────────────────────────────────────────────
// Recognizer trait and errors
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("could not understand the audio")]
    NoSpeech,

    #[error("speech service error: {0}")]
    Service(String),

    #[error("recognition failed after multiple attempts: {0}")]
    Exhausted(String),
}

/// One recognition attempt against the external speech service.
/// Implement this to swap backends without touching handlers.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn recognize(
        &self,
        audio: &[u8],
        config: &RecognitionConfig,
    ) -> Result<String, RecognitionError>;
}

/// Runs the attempt ladder against a recognizer. Success on any attempt
/// short-circuits the rest; exhaustion surfaces one error joining every
/// attempt's failure message.
pub async fn transcribe_with_fallback(
    recognizer: &dyn SpeechRecognizer,
    audio: &[u8],
) -> Result<String, RecognitionError> {
    let mut failures: Vec<String> = Vec::new();

    for config in attempt_ladder() {
        match recognizer.recognize(audio, &config).await {
            Ok(text) => {
                info!("Recognition succeeded on '{}' attempt", config.label);
                return Ok(text);
            }
            Err(e) => {
                warn!("Recognition attempt '{}' failed: {e}", config.label);
                failures.push(format!("{}: {e}", config.label));
            }
        }
    }

    Err(RecognitionError::Exhausted(failures.join("; ")))
}

// ────────────────────────────────────────────────────────────────────────────
// HTTP recognizer — default backend
// ────────────────────────────────────────────────────────────────────────────

/// Recognizer backed by an HTTP speech-to-text service. Sends the audio as a
/// multipart upload with the attempt's sensitivity settings as form fields.
pub struct HttpSpeechRecognizer {
    client: Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, serde::Deserialize)]
struct TranscriptionReply {
    text: Option<String>,
    error: Option<String>,
}

impl HttpSpeechRecognizer {
    pub fn new(endpoint: String, api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .expect("Failed to build HTTP client"),
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl SpeechRecognizer for HttpSpeechRecognizer {
    async fn recognize(
        &self,
        audio: &[u8],
        config: &RecognitionConfig,
    ) -> Result<String, RecognitionError> {
        let form = Form::new()
            .part(
                "file",
                Part::bytes(audio.to_vec())
                    .file_name("answer.webm")
                    .mime_str("audio/webm")
                    .map_err(|e| RecognitionError::Service(e.to_string()))?,
            )
            .text("language", "en-US")
            .text("energy_threshold", config.energy_threshold.to_string())
            .text("pause_threshold", config.pause_threshold.to_string());

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RecognitionError::Service(e.to_string()))?;

        let status = response.status();
        let reply: TranscriptionReply = response
            .json()
            .await
            .map_err(|e| RecognitionError::Service(e.to_string()))?;

        if !status.is_success() {
            return Err(RecognitionError::Service(
                reply.error.unwrap_or_else(|| format!("status {status}")),
            ));
        }

        match reply.text {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(RecognitionError::NoSpeech),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Recognizer that fails the first `fail_count` attempts, then succeeds.
    struct FlakyRecognizer {
        fail_count: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SpeechRecognizer for FlakyRecognizer {
        async fn recognize(
            &self,
            _audio: &[u8],
            config: &RecognitionConfig,
        ) -> Result<String, RecognitionError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_count {
                Err(RecognitionError::NoSpeech)
            } else {
                Ok(format!("recognized with {}", config.label))
            }
        }
    }

    #[test]
    fn test_ladder_order_and_values() {
        let ladder = attempt_ladder();
        assert_eq!(ladder[0].label, "default");
        assert_eq!(ladder[0].energy_threshold, 300);
        assert!((ladder[0].pause_threshold - 0.8).abs() < f64::EPSILON);
        assert_eq!(ladder[1].label, "raised-pause");
        assert!((ladder[1].pause_threshold - 1.0).abs() < f64::EPSILON);
        assert_eq!(ladder[2].label, "raised-energy");
        assert_eq!(ladder[2].energy_threshold, 400);
    }

    #[tokio::test]
    async fn test_success_on_first_attempt_short_circuits() {
        let recognizer = FlakyRecognizer {
            fail_count: 0,
            calls: AtomicUsize::new(0),
        };
        let text = transcribe_with_fallback(&recognizer, b"audio").await.unwrap();
        assert_eq!(text, "recognized with default");
        assert_eq!(recognizer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_with_adjusted_thresholds_after_failure() {
        let recognizer = FlakyRecognizer {
            fail_count: 1,
            calls: AtomicUsize::new(0),
        };
        let text = transcribe_with_fallback(&recognizer, b"audio").await.unwrap();
        // Second rung of the ladder is the raised pause threshold.
        assert_eq!(text, "recognized with raised-pause");
        assert_eq!(recognizer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exhaustion_joins_all_attempt_errors() {
        let recognizer = FlakyRecognizer {
            fail_count: 3,
            calls: AtomicUsize::new(0),
        };
        let err = transcribe_with_fallback(&recognizer, b"audio")
            .await
            .unwrap_err();
        assert_eq!(recognizer.calls.load(Ordering::SeqCst), 3);
        match err {
            RecognitionError::Exhausted(msg) => {
                assert!(msg.contains("default"));
                assert!(msg.contains("raised-pause"));
                assert!(msg.contains("raised-energy"));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }
}
