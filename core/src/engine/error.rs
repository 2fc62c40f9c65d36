use std::path::PathBuf;
use thiserror::Error;

/// 启动时目录不存在或不可读写。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{setting} {path}: {reason}")]
pub struct ResourceUnavailableError {
    pub setting: &'static str,
    pub path: PathBuf,
    pub reason: String,
}

/// 模型无法加载，且在允许自动下载时也无法获取。仅影响当前合成请求。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to acquire model {model}: {reason}")]
pub struct ModelAcquisitionError {
    pub model: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("startup resource checks failed: {}", join_resources(.0))]
    ResourcesUnavailable(Vec<ResourceUnavailableError>),
    #[error(transparent)]
    ModelAcquisition(#[from] ModelAcquisitionError),
    #[error("unsupported synthesis pipeline: {0}")]
    UnsupportedPipeline(String),
    #[error("requested device {requested} is not available on this host")]
    DeviceUnavailable { requested: &'static str },
    #[error("model not loaded, load components first")]
    ModelNotLoaded,
    #[error("input text is empty")]
    EmptyText,
    #[error("invalid output file name: {0:?}")]
    InvalidOutputName(String),
    #[error("audio encoding failed: {0}")]
    Encoding(#[from] hound::Error),
    #[error("failed to write audio to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("synthesis worker pool closed")]
    WorkersClosed,
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

fn join_resources(errors: &[ResourceUnavailableError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
