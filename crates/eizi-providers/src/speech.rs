//! Speech synthesis - text in, playable audio clip out.
//!
//! Supports ElevenLabs (binary audio), Google Cloud TTS and Azure Speech
//! (base64 audio in JSON). Decoded bytes are kept in an [`AudioBlobStore`]
//! and the caller gets back an object URL pointing at them.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use eizi_core::config::{SettingsSource, VoiceAiConfig};
use eizi_core::error::{DispatchError, DispatchResult};
use eizi_core::types::SpeechClip;

use crate::registry::VoiceProvider;

pub const VOICE_NOT_CONFIGURED: &str =
    "Voice API not configured. Please add your Voice API key in Settings.";
pub const UNKNOWN_VOICE_PROVIDER: &str = "Unknown voice provider. Please check your settings.";
pub const NO_AUDIO: &str = "No audio content in response";

/// Stock ElevenLabs voice used when none is configured.
pub const DEFAULT_ELEVENLABS_VOICE: &str = "EXAVITQu4vr4xnSDxMaL";
const ELEVENLABS_MODEL: &str = "eleven_multilingual_v2";
const ELEVENLABS_BASE: &str = "https://api.elevenlabs.io/v1";
const GOOGLE_BASE: &str = "https://texttospeech.googleapis.com/v1";
const AZURE_DEFAULT_REGION: &str = "eastus";
const AZURE_OUTPUT_FORMAT: &str = "audio-16khz-128kbitrate-mono-mp3";

/// Prefix of every URL handed out by [`AudioBlobStore`].
pub const BLOB_URL_PREFIX: &str = "blob:eizi/";

// ─────────────────────────────────────────────
// Blob store
// ─────────────────────────────────────────────

/// Audio bytes registered under an object URL.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBlob {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// In-memory registry of synthesized audio, keyed by object URL.
///
/// Entries live until [`revoke`](Self::revoke) is called.
#[derive(Clone, Debug, Default)]
pub struct AudioBlobStore {
    blobs: Arc<RwLock<HashMap<String, AudioBlob>>>,
}

impl AudioBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `bytes` and return a fresh `blob:eizi/<uuid>` URL.
    pub fn register(&self, bytes: Vec<u8>, mime_type: impl Into<String>) -> String {
        let url = format!("{}{}", BLOB_URL_PREFIX, uuid::Uuid::new_v4());
        let blob = AudioBlob {
            bytes,
            mime_type: mime_type.into(),
        };
        self.blobs.write().unwrap().insert(url.clone(), blob);
        url
    }

    pub fn get(&self, url: &str) -> Option<AudioBlob> {
        self.blobs.read().unwrap().get(url).cloned()
    }

    /// Drop a clip. Returns `false` if the URL was unknown.
    pub fn revoke(&self, url: &str) -> bool {
        self.blobs.write().unwrap().remove(url).is_some()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ─────────────────────────────────────────────
// Request shaping
// ─────────────────────────────────────────────

enum SpeechBody {
    Json(Value),
    Ssml(String),
}

/// How the provider returns audio.
#[derive(Clone, Copy, Debug, PartialEq)]
enum AudioPayload {
    /// Raw bytes in the response body.
    Binary,
    /// Base64 string inside a JSON field.
    Base64Json,
}

struct SpeechRequest {
    url: String,
    headers: HeaderMap,
    body: SpeechBody,
    payload: AudioPayload,
}

fn bearer(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {}", api_key)) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Escape the five XML special characters.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn build_ssml(text: &str, voice_name: Option<&str>) -> String {
    let voice_attr = voice_name
        .map(|name| format!(" name='{}'", escape_xml(name)))
        .unwrap_or_default();
    format!(
        "<speak version='1.0' xml:lang='en-US'><voice xml:lang='en-US'{}><prosody rate='0'>{}</prosody></voice></speak>",
        voice_attr,
        escape_xml(text)
    )
}

fn build_request(provider: VoiceProvider, voice: &VoiceAiConfig, text: &str) -> SpeechRequest {
    match provider {
        VoiceProvider::ElevenLabs => {
            let base = voice.api_base.as_deref().unwrap_or(ELEVENLABS_BASE);
            let voice_id = voice.voice_id.as_deref().unwrap_or(DEFAULT_ELEVENLABS_VOICE);
            SpeechRequest {
                url: format!("{}/text-to-speech/{}", base.trim_end_matches('/'), voice_id),
                headers: bearer(&voice.api_key),
                body: SpeechBody::Json(json!({
                    "text": text,
                    "model_id": ELEVENLABS_MODEL,
                    "voice_settings": {
                        "stability": 0.5,
                        "similarity_boost": 0.75
                    }
                })),
                payload: AudioPayload::Binary,
            }
        }
        VoiceProvider::Google => {
            let base = voice.api_base.as_deref().unwrap_or(GOOGLE_BASE);
            SpeechRequest {
                url: format!("{}/text:synthesize", base.trim_end_matches('/')),
                headers: bearer(&voice.api_key),
                body: SpeechBody::Json(json!({
                    "input": { "text": text },
                    "voice": { "languageCode": "en-US", "ssmlGender": "NEUTRAL" },
                    "audioConfig": { "audioEncoding": "MP3" }
                })),
                payload: AudioPayload::Base64Json,
            }
        }
        VoiceProvider::Azure => {
            let base = voice.api_base.clone().unwrap_or_else(|| {
                let region = voice.region.as_deref().unwrap_or(AZURE_DEFAULT_REGION);
                format!("https://{}.tts.speech.microsoft.com", region)
            });
            let mut headers = HeaderMap::new();
            if let Ok(val) = HeaderValue::from_str(&voice.api_key) {
                headers.insert("Ocp-Apim-Subscription-Key", val);
            }
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/ssml+xml"));
            headers.insert(
                "X-Microsoft-OutputFormat",
                HeaderValue::from_static(AZURE_OUTPUT_FORMAT),
            );
            SpeechRequest {
                url: format!("{}/cognitiveservices/v1", base.trim_end_matches('/')),
                headers,
                body: SpeechBody::Ssml(build_ssml(text, voice.voice_id.as_deref())),
                payload: AudioPayload::Base64Json,
            }
        }
    }
}

/// Decode the base64 audio field (`audioContent`, else `audio`).
fn decode_audio_field(body: &Value) -> DispatchResult<Vec<u8>> {
    let encoded = body
        .get("audioContent")
        .and_then(Value::as_str)
        .or_else(|| body.get("audio").and_then(Value::as_str))
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DispatchError::SchemaExtraction(NO_AUDIO.to_string()))?;

    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| DispatchError::Transport(format!("Invalid base64 audio: {}", e)))
}

// ─────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────

/// Turns text into audio with whichever voice provider the settings name.
pub struct SpeechDispatcher {
    settings: Arc<dyn SettingsSource>,
    client: reqwest::Client,
    blobs: AudioBlobStore,
}

impl SpeechDispatcher {
    pub fn new(settings: Arc<dyn SettingsSource>) -> Self {
        Self::with_store(settings, AudioBlobStore::new())
    }

    /// Dispatcher registering clips in an existing store.
    pub fn with_store(settings: Arc<dyn SettingsSource>, blobs: AudioBlobStore) -> Self {
        Self {
            settings,
            client: reqwest::Client::new(),
            blobs,
        }
    }

    /// Store the dispatcher registers clips in.
    pub fn blobs(&self) -> &AudioBlobStore {
        &self.blobs
    }

    /// Synthesize `text` and return a clip whose URL resolves in [`Self::blobs`].
    pub async fn text_to_speech(&self, text: &str) -> DispatchResult<SpeechClip> {
        let config = self.settings.load();
        let voice = match config.voice_ai {
            Some(ref voice) if voice.is_configured() => voice,
            _ => {
                warn!("speech dispatch without voice API key");
                return Err(DispatchError::Configuration(VOICE_NOT_CONFIGURED.to_string()));
            }
        };

        let provider = VoiceProvider::from_name(&voice.provider).ok_or_else(|| {
            warn!(provider = %voice.provider, "unsupported voice provider");
            DispatchError::UnsupportedProvider(UNKNOWN_VOICE_PROVIDER.to_string())
        })?;

        let request = build_request(provider, voice, text);
        debug!(
            provider = provider.display_name(),
            url = %request.url,
            chars = text.chars().count(),
            "dispatching speech"
        );

        let builder = self.client.post(&request.url).headers(request.headers);
        let builder = match request.body {
            SpeechBody::Json(body) => builder.json(&body),
            SpeechBody::Ssml(ssml) => builder.body(ssml),
        };

        let response = builder.send().await.map_err(|e| {
            warn!(provider = provider.display_name(), error = %e, "voice provider unreachable");
            DispatchError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(
                provider = provider.display_name(),
                status = status.as_u16(),
                body = %eizi_core::utils::truncate_string(&detail, 200),
                "speech request failed"
            );
            return Err(DispatchError::Upstream {
                status: status.as_u16(),
                message: format!(
                    "Voice API error: {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("")
                )
                .trim_end()
                .to_string(),
            });
        }

        let (bytes, mime_type) = match request.payload {
            AudioPayload::Binary => {
                let mime = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("audio/mpeg")
                    .to_string();
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| DispatchError::Transport(format!("Failed to read audio: {}", e)))?;
                (bytes.to_vec(), mime)
            }
            AudioPayload::Base64Json => {
                let body: Value = response
                    .json()
                    .await
                    .map_err(|e| DispatchError::Transport(format!("Invalid JSON in response: {}", e)))?;
                (decode_audio_field(&body)?, "audio/mp3".to_string())
            }
        };

        let byte_len = bytes.len();
        let audio_url = self.blobs.register(bytes, mime_type.clone());
        info!(provider = provider.display_name(), bytes = byte_len, "speech synthesized");

        Ok(SpeechClip {
            audio_url,
            mime_type,
            byte_len,
            duration_secs: 0.0,
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use eizi_core::config::{Config, StaticSettings};
    use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn dispatcher(provider: &str, api_key: &str, api_base: Option<String>) -> SpeechDispatcher {
        let mut config = Config::default();
        config.voice_ai = Some(VoiceAiConfig {
            provider: provider.into(),
            api_key: api_key.into(),
            api_base,
            ..Default::default()
        });
        SpeechDispatcher::new(Arc::new(StaticSettings(config)))
    }

    #[test]
    fn test_blob_store_register_get_revoke() {
        let store = AudioBlobStore::new();
        let url = store.register(vec![1, 2, 3], "audio/mpeg");
        assert!(url.starts_with(BLOB_URL_PREFIX));
        assert_eq!(store.get(&url).unwrap().bytes, vec![1, 2, 3]);
        assert_eq!(store.len(), 1);

        assert!(store.revoke(&url));
        assert!(!store.revoke(&url));
        assert!(store.get(&url).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_blob_urls_are_unique() {
        let store = AudioBlobStore::new();
        let a = store.register(vec![0], "audio/mpeg");
        let b = store.register(vec![0], "audio/mpeg");
        assert_ne!(a, b);
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(
            escape_xml(r#"Tom & "Jerry" <3 'cheese'"#),
            "Tom &amp; &quot;Jerry&quot; &lt;3 &apos;cheese&apos;"
        );
    }

    #[test]
    fn test_ssml_embeds_escaped_text() {
        let ssml = build_ssml("a < b", None);
        assert!(ssml.contains("<prosody rate='0'>a &lt; b</prosody>"));
        assert!(!ssml.contains(" name="));
        let named = build_ssml("hi", Some("en-US-JennyNeural"));
        assert!(named.contains("name='en-US-JennyNeural'"));
    }

    #[tokio::test]
    async fn test_not_configured() {
        let d = SpeechDispatcher::new(Arc::new(StaticSettings(Config::default())));
        let err = d.text_to_speech("hello").await.unwrap_err();
        assert_eq!(err, DispatchError::Configuration(VOICE_NOT_CONFIGURED.into()));

        let d = dispatcher("elevenlabs", "", None);
        let err = d.text_to_speech("hello").await.unwrap_err();
        assert_eq!(err.kind(), "configuration");
    }

    #[tokio::test]
    async fn test_unknown_voice_provider() {
        let d = dispatcher("polly", "k", None);
        let err = d.text_to_speech("hello").await.unwrap_err();
        assert_eq!(err, DispatchError::UnsupportedProvider(UNKNOWN_VOICE_PROVIDER.into()));
    }

    #[tokio::test]
    async fn test_elevenlabs_binary_audio() {
        let server = MockServer::start().await;
        let audio = vec![0x49, 0x44, 0x33, 0x04, 0x00, 0x00];
        Mock::given(method("POST"))
            .and(path(format!("/text-to-speech/{}", DEFAULT_ELEVENLABS_VOICE)))
            .and(header("authorization", "Bearer el-key"))
            .and(body_partial_json(json!({
                "text": "breathe in",
                "model_id": "eleven_multilingual_v2",
                "voice_settings": {"stability": 0.5, "similarity_boost": 0.75}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "audio/mpeg")
                    .set_body_bytes(audio.clone()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let d = dispatcher("elevenlabs", "el-key", Some(server.uri()));
        let clip = d.text_to_speech("breathe in").await.unwrap();

        assert!(clip.audio_url.starts_with(BLOB_URL_PREFIX));
        assert_eq!(clip.mime_type, "audio/mpeg");
        assert_eq!(clip.byte_len, audio.len());
        assert_eq!(clip.duration_secs, 0.0);
        assert_eq!(d.blobs().get(&clip.audio_url).unwrap().bytes, audio);
    }

    #[tokio::test]
    async fn test_google_base64_audio() {
        let server = MockServer::start().await;
        let decoded = b"fake-mp3-bytes".to_vec();
        let encoded = base64::engine::general_purpose::STANDARD.encode(&decoded);
        Mock::given(method("POST"))
            .and(path("/text:synthesize"))
            .and(body_partial_json(json!({
                "input": {"text": "hello"},
                "audioConfig": {"audioEncoding": "MP3"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"audioContent": encoded})))
            .expect(1)
            .mount(&server)
            .await;

        let d = dispatcher("google", "g-key", Some(server.uri()));
        let clip = d.text_to_speech("hello").await.unwrap();
        assert_eq!(clip.byte_len, decoded.len());
        assert_eq!(clip.mime_type, "audio/mp3");
        assert_eq!(d.blobs().get(&clip.audio_url).unwrap().bytes, decoded);
    }

    #[tokio::test]
    async fn test_azure_ssml_and_audio_field() {
        let server = MockServer::start().await;
        let decoded = vec![7u8; 32];
        let encoded = base64::engine::general_purpose::STANDARD.encode(&decoded);
        Mock::given(method("POST"))
            .and(path("/cognitiveservices/v1"))
            .and(header("Ocp-Apim-Subscription-Key", "az-key"))
            .and(header("content-type", "application/ssml+xml"))
            .and(header("X-Microsoft-OutputFormat", AZURE_OUTPUT_FORMAT))
            .and(body_string_contains("Rest &amp; recover"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"audio": encoded})))
            .expect(1)
            .mount(&server)
            .await;

        let d = dispatcher("azure", "az-key", Some(server.uri()));
        let clip = d.text_to_speech("Rest & recover").await.unwrap();
        assert_eq!(clip.byte_len, 32);
    }

    #[tokio::test]
    async fn test_upstream_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let d = dispatcher("elevenlabs", "k", Some(server.uri()));
        let err = d.text_to_speech("hi").await.unwrap_err();
        assert_eq!(err.status(), Some(429));
        assert_eq!(err.to_string(), "Voice API error: 429 Too Many Requests");
    }

    #[tokio::test]
    async fn test_missing_audio_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "done"})))
            .mount(&server)
            .await;

        let d = dispatcher("google", "k", Some(server.uri()));
        let err = d.text_to_speech("hi").await.unwrap_err();
        assert_eq!(err, DispatchError::SchemaExtraction(NO_AUDIO.into()));
    }

    #[tokio::test]
    async fn test_invalid_base64_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"audioContent": "@@not base64@@"})),
            )
            .mount(&server)
            .await;

        let d = dispatcher("google", "k", Some(server.uri()));
        let err = d.text_to_speech("hi").await.unwrap_err();
        assert_eq!(err.kind(), "transport");
    }
}
