use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;

use crate::engine::error::EngineError;
use crate::engine::model_store::ModelStore;

/// 合成引擎接口：加载模型、文本转音频、写出音频文件。
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn load_model(&mut self, store: &ModelStore) -> Result<(), EngineError>;

    /// 返回完整的音频容器字节（例如 WAV）。
    async fn synthesize(&self, text: &str) -> Result<Bytes, EngineError>;

    async fn save_audio(&self, audio: &[u8], path: &Path) -> Result<(), EngineError> {
        let io_error = |source: std::io::Error| EngineError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        tokio::fs::write(path, audio).await.map_err(io_error)
    }
}

/// 编排完整合成流程的管线。
#[async_trait]
pub trait SynthesisPipeline: Send + Sync {
    async fn load_components(&mut self) -> Result<(), EngineError>;

    async fn process(&self, text: &str, save_path: Option<&Path>) -> Result<Bytes, EngineError>;

    fn is_loaded(&self) -> bool;
}
