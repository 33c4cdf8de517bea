//! Keyless translate-style TTS endpoint.
//!
//! The endpoint only accepts short inputs, so text is cut into chunks of at
//! most [`MAX_CHUNK_CHARS`] characters (preferring punctuation boundaries),
//! each chunk is fetched as an MP3 and the frames are concatenated.

use std::time::Duration;

use tracing::debug;

use crate::{http_client, Result, SpeechError, SynthesisRequest};

const TRANSLATE_TTS_URL: &str = "https://translate.google.com";

pub const MAX_CHUNK_CHARS: usize = 100;

const NORMAL_SPEED: &str = "1";
const SLOW_SPEED: &str = "0.24";

pub struct TranslateTts {
    client: reqwest::Client,
    base_url: String,
}

impl TranslateTts {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: TRANSLATE_TTS_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Synthesize `request.text` and return MP3 bytes. `voice_name` is ignored.
    pub async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>> {
        let chunks = split_into_chunks(&request.text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let speed = if request.speaking_rate < 1.0 {
            SLOW_SPEED
        } else {
            NORMAL_SPEED
        };
        let url = format!("{}/translate_tts", self.base_url);
        let total = chunks.len().to_string();
        let mut audio = Vec::new();

        for (idx, chunk) in chunks.iter().enumerate() {
            debug!(idx, total = chunks.len(), "Translate TTS chunk");

            let idx = idx.to_string();
            let textlen = chunk.chars().count().to_string();
            let resp = self
                .client
                .get(&url)
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("q", chunk.as_str()),
                    ("tl", request.language_code.as_str()),
                    ("ttsspeed", speed),
                    ("total", total.as_str()),
                    ("idx", idx.as_str()),
                    ("textlen", textlen.as_str()),
                ])
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                let message = resp.text().await.unwrap_or_default();
                return Err(SpeechError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            audio.extend_from_slice(&resp.bytes().await?);
        }

        if audio.is_empty() {
            return Err(SpeechError::Decode("endpoint returned no audio".to_string()));
        }
        Ok(audio)
    }
}

fn is_break(c: char) -> bool {
    matches!(
        c,
        '，' | '。' | '！' | '？' | '、' | '；' | '：' | ',' | '.' | '!' | '?' | ';' | ':' | '\n'
    )
}

/// Split text into trimmed, non-empty chunks of at most `max_chars` characters.
///
/// A chunk ends after the last punctuation mark that fits; text without
/// punctuation is cut hard at `max_chars`.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current: Vec<char> = Vec::new();
    let mut last_break: Option<usize> = None;

    for c in text.chars() {
        current.push(c);
        if is_break(c) {
            last_break = Some(current.len());
        }
        if current.len() >= max_chars {
            let cut = last_break.unwrap_or(current.len());
            let rest = current.split_off(cut);
            push_chunk(&mut chunks, &current);
            current = rest;
            last_break = current.iter().rposition(|&c| is_break(c)).map(|i| i + 1);
        }
    }
    push_chunk(&mut chunks, &current);
    chunks
}

fn push_chunk(chunks: &mut Vec<String>, chars: &[char]) {
    let chunk: String = chars.iter().collect();
    let chunk = chunk.trim();
    if !chunk.is_empty() {
        chunks.push(chunk.to_string());
    }
}
