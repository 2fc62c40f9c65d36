use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{AudioFormat, RuntimeConfiguration};
use crate::engine::device::Device;
use crate::engine::error::EngineError;
use crate::engine::tone::ToneSynthesizer;
use crate::engine::traits::SpeechSynthesizer;

pub const TONE_PIPELINE: &str = "tone";

/// 构造合成器所需的参数，来源于已解析的配置与设备探测结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisSettings {
    pub model_identifier: String,
    pub sample_rate_hz: u32,
    pub audio_format: AudioFormat,
    pub device: Device,
}

impl SynthesisSettings {
    pub fn from_config(config: &RuntimeConfiguration, device: Device) -> Self {
        Self {
            model_identifier: config.default_model_identifier.clone(),
            sample_rate_hz: config.default_sample_rate_hz,
            audio_format: config.default_audio_format,
            device,
        }
    }
}

pub type SynthesizerFactory =
    Arc<dyn Fn(SynthesisSettings) -> Box<dyn SpeechSynthesizer> + Send + Sync>;

/// 管线名 → 合成器工厂。
#[derive(Clone, Default)]
pub struct SynthesizerRegistry {
    factories: BTreeMap<String, SynthesizerFactory>,
}

impl std::fmt::Debug for SynthesizerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthesizerRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl SynthesizerRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(TONE_PIPELINE, |settings| {
            Box::new(ToneSynthesizer::new(settings)) as Box<dyn SpeechSynthesizer>
        });
        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(SynthesisSettings) -> Box<dyn SpeechSynthesizer> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn create(
        &self,
        name: &str,
        settings: SynthesisSettings,
    ) -> Result<Box<dyn SpeechSynthesizer>, EngineError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| EngineError::UnsupportedPipeline(name.to_string()))?;
        Ok(factory(settings))
    }
}
