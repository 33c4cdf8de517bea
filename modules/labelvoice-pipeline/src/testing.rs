// Test doubles for the label pipeline.
//
// Two mocks matching the two trait boundaries:
// - MockInterpreter (Interpreter): queued results, then a fixed fallback
// - MockSynthesizer (Synthesizer): fixed audio or a fixed failure
//
// Both record what they were asked so tests can assert on it. Plus fixture
// builders for encoded images and a canned interpretation.

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};

use labelvoice_common::{SpeakingRate, SynthesisResult, UploadedImage};

use crate::traits::{InterpretationRequest, InterpretationResult, Interpreter, Synthesizer};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Interpretation text shaped like a real reply: four numbered sections,
/// mentions of two table ingredients, a keyword-led summary.
pub const SAMPLE_INTERPRETATION: &str = "\
1. 產品名稱：兒童感冒糖漿
2. 主要成分：乙醯胺酚、苯甲酸鈉、蔗糖
3. 用途說明：緩解感冒引起的發燒與頭痛。
4. 總結說明：這是退燒止痛的糖漿，每天不要超過四次。
請放在小孩拿不到的地方。";

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    })
}

fn encode(pixels: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    pixels.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(&gradient(width, height), ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(&gradient(width, height), ImageFormat::Jpeg)
}

pub fn uploaded_png(name: &str, width: u32, height: u32) -> UploadedImage {
    UploadedImage::new(name, png_bytes(width, height), "image/png")
}

pub fn uploaded_jpeg(name: &str, width: u32, height: u32) -> UploadedImage {
    UploadedImage::new(name, jpeg_bytes(width, height), "image/jpeg")
}

/// A declared-JPEG upload whose bytes no decoder accepts.
pub fn undecodable(name: &str) -> UploadedImage {
    UploadedImage::new(name, b"\xff\xd8\xff\xe0 truncated".to_vec(), "image/jpeg")
}

// ---------------------------------------------------------------------------
// MockInterpreter
// ---------------------------------------------------------------------------

/// Pops queued results in order; once the queue is empty every call gets
/// the fallback. Optional delay makes deadline tests possible.
pub struct MockInterpreter {
    queued: Mutex<VecDeque<InterpretationResult>>,
    fallback: InterpretationResult,
    delay: Option<Duration>,
    requests: Mutex<Vec<InterpretationRequest>>,
}

impl MockInterpreter {
    /// Every call returns `SAMPLE_INTERPRETATION`.
    pub fn new() -> Self {
        Self::always(InterpretationResult::Success(SAMPLE_INTERPRETATION.to_string()))
    }

    pub fn always(result: InterpretationResult) -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            fallback: result,
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn then(self, result: InterpretationResult) -> Self {
        self.queued.lock().unwrap().push_back(result);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<InterpretationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Default for MockInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Interpreter for MockInterpreter {
    async fn interpret(&self, request: &InterpretationRequest) -> InterpretationResult {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.queued.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

// ---------------------------------------------------------------------------
// MockSynthesizer
// ---------------------------------------------------------------------------

pub struct MockSynthesizer {
    failure: Option<String>,
    calls: Mutex<Vec<(String, SpeakingRate)>>,
}

impl MockSynthesizer {
    /// Returns a few fake MP3 bytes for any text.
    pub fn succeeding() -> Self {
        Self {
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(cause: &str) -> Self {
        Self {
            failure: Some(cause.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Texts and rates passed to `synthesize`, in call order.
    pub fn calls(&self) -> Vec<(String, SpeakingRate)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Synthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str, rate: SpeakingRate) -> SynthesisResult {
        self.calls.lock().unwrap().push((text.to_string(), rate));
        match &self.failure {
            Some(cause) => SynthesisResult::SynthesisFailure {
                cause: cause.clone(),
            },
            None => SynthesisResult::Audio {
                bytes: b"ID3fake-mp3".to_vec(),
                mime_type: "audio/mpeg".to_string(),
            },
        }
    }
}
