//! 合成引擎接入点：启动检查、设备选择、模型获取与合成调度。

mod constants;
mod device;
mod error;
mod model_store;
mod pipeline;
mod registry;
mod startup;
mod tone;
mod traits;

pub use device::{select_device, Device, DeviceCapabilities};
pub use error::{EngineError, ModelAcquisitionError, ResourceUnavailableError};
pub use model_store::ModelStore;
pub use pipeline::TtsPipeline;
pub use registry::{SynthesisSettings, SynthesizerFactory, SynthesizerRegistry, TONE_PIPELINE};
pub use startup::check_directories;
pub use tone::ToneSynthesizer;
pub use traits::{SpeechSynthesizer, SynthesisPipeline};

use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{RwLock, Semaphore};
use tracing::{info, warn};

use crate::config::RuntimeConfiguration;
use crate::telemetry::events::{
    record_device_selected, record_model_acquisition_failed, record_resource_unavailable,
    record_synthesis,
};

/// 一次合成请求的结果。
#[derive(Debug, Clone)]
pub struct SynthesisOutcome {
    pub audio: Bytes,
    pub saved_to: Option<PathBuf>,
    pub sample_rate_hz: u32,
    pub latency: Duration,
}

pub struct Engine {
    config: Arc<RuntimeConfiguration>,
    device: Device,
    pipeline: RwLock<TtsPipeline>,
    workers: Semaphore,
}

impl Engine {
    pub fn bootstrap(config: Arc<RuntimeConfiguration>) -> Result<Self, EngineError> {
        Self::with_components(
            config,
            SynthesizerRegistry::with_builtin(),
            DeviceCapabilities::detect(),
        )
    }

    /// 启动步骤：目录检查、设备选择、管线构造。任一失败均终止启动。
    pub fn with_components(
        config: Arc<RuntimeConfiguration>,
        registry: SynthesizerRegistry,
        capabilities: DeviceCapabilities,
    ) -> Result<Self, EngineError> {
        if let Err(failures) = check_directories(&config) {
            for failure in &failures {
                record_resource_unavailable(failure);
            }
            return Err(EngineError::ResourcesUnavailable(failures));
        }

        let device = select_device(config.device_preference, capabilities)?;
        record_device_selected(config.device_preference.as_str(), device);

        if !registry.contains(&config.pipeline_name) {
            let name = config.pipeline_name.clone();
            return Err(EngineError::UnsupportedPipeline(name));
        }

        let pipeline = TtsPipeline::new(
            config.pipeline_name.clone(),
            SynthesisSettings::from_config(&config, device),
            Arc::new(registry),
            ModelStore::from_config(&config),
        );
        let workers = Semaphore::new(config.worker_count as usize);

        Ok(Self {
            config,
            device,
            pipeline: RwLock::new(pipeline),
            workers,
        })
    }

    pub fn config(&self) -> &RuntimeConfiguration {
        &self.config
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub async fn is_loaded(&self) -> bool {
        self.pipeline.read().await.is_loaded()
    }

    pub async fn warmup(&self) -> Result<(), EngineError> {
        info!(
            target: "engine",
            pipeline = %self.config.pipeline_name,
            device = self.device.as_str(),
            "warming up pipeline"
        );
        self.ensure_loaded().await
    }

    // 未加载时在请求内重试加载，模型获取失败只影响当前请求。
    async fn ensure_loaded(&self) -> Result<(), EngineError> {
        if self.pipeline.read().await.is_loaded() {
            return Ok(());
        }

        let mut pipeline = self.pipeline.write().await;
        if pipeline.is_loaded() {
            return Ok(());
        }

        match pipeline.load_components().await {
            Ok(()) => Ok(()),
            Err(EngineError::ModelAcquisition(failure)) => {
                record_model_acquisition_failed(&failure);
                Err(EngineError::ModelAcquisition(failure))
            }
            Err(err) => {
                warn!(target: "engine", %err, "failed to load pipeline components");
                Err(err)
            }
        }
    }

    /// 输出目录内的目标路径；只取文件名部分，缺省扩展名按配置的音频格式补齐。
    pub fn output_path(&self, file_name: &str) -> Result<PathBuf, EngineError> {
        let name = Path::new(file_name)
            .file_name()
            .filter(|name| Path::new(name) == Path::new(file_name))
            .ok_or_else(|| EngineError::InvalidOutputName(file_name.to_string()))?;

        let mut path = self.config.output_directory.join(name);
        if path.extension().is_none() {
            path.set_extension(self.config.default_audio_format.extension());
        }
        Ok(path)
    }

    pub async fn synthesize(
        &self,
        text: &str,
        file_name: Option<&str>,
    ) -> Result<SynthesisOutcome, EngineError> {
        let saved_to = file_name.map(|name| self.output_path(name)).transpose()?;
        let _permit = self
            .workers
            .acquire()
            .await
            .map_err(|_| EngineError::WorkersClosed)?;
        let started = Instant::now();

        self.ensure_loaded().await?;
        let audio = {
            let pipeline = self.pipeline.read().await;
            pipeline.process(text, saved_to.as_deref()).await?
        };
        let latency = started.elapsed();

        record_synthesis(
            &self.config.pipeline_name,
            text.chars().count(),
            audio.len(),
            self.config.default_sample_rate_hz,
            latency,
            saved_to.as_deref(),
        );

        Ok(SynthesisOutcome {
            audio,
            saved_to,
            sample_rate_hz: self.config.default_sample_rate_hz,
            latency,
        })
    }
}
