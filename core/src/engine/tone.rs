//! 内置占位合成器：每个字符一段正弦音，空白为停顿。
//!
//! 不是语音算法，只用于在没有神经网络模型时打通配置、模型获取与音频写出的
//! 整条链路。

use async_trait::async_trait;
use bytes::Bytes;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::f32::consts::TAU;
use std::io::Cursor;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::engine::constants::{
    FADE_MS, PAUSE_MS, TONE_AMPLITUDE, TONE_BASE_HZ, TONE_MS, TONE_STEPS, TONE_STEP_RATIO,
};
use crate::engine::error::EngineError;
use crate::engine::model_store::ModelStore;
use crate::engine::registry::SynthesisSettings;
use crate::engine::traits::SpeechSynthesizer;

pub struct ToneSynthesizer {
    settings: SynthesisSettings,
    model_path: Option<PathBuf>,
}

impl ToneSynthesizer {
    pub fn new(settings: SynthesisSettings) -> Self {
        Self {
            settings,
            model_path: None,
        }
    }

    pub fn model_path(&self) -> Option<&PathBuf> {
        self.model_path.as_ref()
    }

    fn render(&self, text: &str) -> Vec<f32> {
        let rate = self.settings.sample_rate_hz;
        let tone_len = samples_for(rate, TONE_MS);
        let pause_len = samples_for(rate, PAUSE_MS);
        let fade_len = samples_for(rate, FADE_MS).max(1);

        let mut samples = Vec::new();
        for ch in text.trim().chars() {
            if ch.is_whitespace() {
                samples.extend(std::iter::repeat(0.0).take(pause_len));
                continue;
            }

            let frequency = tone_frequency(ch);
            for index in 0..tone_len {
                let t = index as f32 / rate as f32;
                let edge = index.min(tone_len - 1 - index);
                let envelope = (edge as f32 / fade_len as f32).min(1.0);
                samples.push((TAU * frequency * t).sin() * TONE_AMPLITUDE * envelope);
            }
        }
        samples
    }
}

fn samples_for(rate: u32, millis: u32) -> usize {
    ((u64::from(rate) * u64::from(millis)) / 1_000).max(1) as usize
}

fn tone_frequency(ch: char) -> f32 {
    let step = (ch as u32) % TONE_STEPS;
    TONE_BASE_HZ * TONE_STEP_RATIO.powi(step as i32)
}

pub(crate) fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Bytes, EngineError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for sample in samples {
            let value = (sample * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
            writer.write_sample(value)?;
        }
        writer.finalize()?;
    }
    Ok(Bytes::from(cursor.into_inner()))
}

#[async_trait]
impl SpeechSynthesizer for ToneSynthesizer {
    async fn load_model(&mut self, store: &ModelStore) -> Result<(), EngineError> {
        let store = store.clone();
        let identifier = self.settings.model_identifier.clone();
        let path = tokio::task::spawn_blocking(move || store.resolve(&identifier))
            .await??;

        info!(
            target: "tone_synthesizer",
            model = %self.settings.model_identifier,
            path = %path.display(),
            device = self.settings.device.as_str(),
            "model loaded"
        );
        self.model_path = Some(path);
        Ok(())
    }

    async fn synthesize(&self, text: &str) -> Result<Bytes, EngineError> {
        if self.model_path.is_none() {
            return Err(EngineError::ModelNotLoaded);
        }
        if text.trim().is_empty() {
            return Err(EngineError::EmptyText);
        }

        let samples = self.render(text);
        debug!(
            target: "tone_synthesizer",
            characters = text.chars().count(),
            samples = samples.len(),
            "rendered tone sequence"
        );
        encode_wav(&samples, self.settings.sample_rate_hz)
    }
}
