use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::engine::error::EngineError;
use crate::engine::model_store::ModelStore;
use crate::engine::registry::{SynthesisSettings, SynthesizerRegistry};
use crate::engine::traits::{SpeechSynthesizer, SynthesisPipeline};

/// 按名称从注册表选择合成器的文本转语音管线。
pub struct TtsPipeline {
    name: String,
    settings: SynthesisSettings,
    registry: Arc<SynthesizerRegistry>,
    store: ModelStore,
    synthesizer: Option<Box<dyn SpeechSynthesizer>>,
}

impl TtsPipeline {
    pub fn new(
        name: impl Into<String>,
        settings: SynthesisSettings,
        registry: Arc<SynthesizerRegistry>,
        store: ModelStore,
    ) -> Self {
        Self {
            name: name.into(),
            settings,
            registry,
            store,
            synthesizer: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &SynthesisSettings {
        &self.settings
    }
}

#[async_trait]
impl SynthesisPipeline for TtsPipeline {
    async fn load_components(&mut self) -> Result<(), EngineError> {
        let mut synthesizer = self.registry.create(&self.name, self.settings.clone())?;
        synthesizer.load_model(&self.store).await?;

        info!(
            target: "tts_pipeline",
            pipeline = %self.name,
            model = %self.settings.model_identifier,
            "pipeline components loaded"
        );
        self.synthesizer = Some(synthesizer);
        Ok(())
    }

    async fn process(&self, text: &str, save_path: Option<&Path>) -> Result<Bytes, EngineError> {
        let synthesizer = self
            .synthesizer
            .as_ref()
            .ok_or(EngineError::ModelNotLoaded)?;

        let audio = synthesizer.synthesize(text).await?;
        if let Some(path) = save_path {
            synthesizer.save_audio(&audio, path).await?;
        }
        Ok(audio)
    }

    fn is_loaded(&self) -> bool {
        self.synthesizer.is_some()
    }
}
