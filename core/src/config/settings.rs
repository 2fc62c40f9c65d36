use serde::Serialize;
use std::path::PathBuf;

/// 运行时识别的环境变量键。
pub mod keys {
    pub const ENVIRONMENT_MODE: &str = "TTS_ENV";
    pub const DEVICE: &str = "TTS_DEVICE";
    pub const WORKERS: &str = "TTS_WORKERS";
    pub const MAX_MEMORY_GB: &str = "TTS_MAX_MEMORY_GB";
    pub const MODEL_CACHE_DIR: &str = "TTS_MODEL_CACHE_DIR";
    pub const SAMPLE_DATA_DIR: &str = "TTS_SAMPLE_DATA_DIR";
    pub const OUTPUT_DIR: &str = "TTS_OUTPUT_DIR";
    pub const LOG_LEVEL: &str = "TTS_LOG_LEVEL";
    pub const LOG_FORMAT: &str = "TTS_LOG_FORMAT";
    pub const DEFAULT_MODEL: &str = "TTS_DEFAULT_MODEL";
    pub const MODELS_AUTO_DOWNLOAD: &str = "TTS_MODELS_AUTO_DOWNLOAD";
    pub const DEFAULT_SAMPLE_RATE: &str = "TTS_DEFAULT_SAMPLE_RATE";
    pub const DEFAULT_AUDIO_FORMAT: &str = "TTS_DEFAULT_AUDIO_FORMAT";
    pub const PORT: &str = "TTS_PORT";
    pub const PIPELINE: &str = "TTS_PIPELINE";
    pub const MODEL_BASE_URL: &str = "TTS_MODEL_BASE_URL";

    pub const ALL: &[&str] = &[
        ENVIRONMENT_MODE,
        DEVICE,
        WORKERS,
        MAX_MEMORY_GB,
        MODEL_CACHE_DIR,
        SAMPLE_DATA_DIR,
        OUTPUT_DIR,
        LOG_LEVEL,
        LOG_FORMAT,
        DEFAULT_MODEL,
        MODELS_AUTO_DOWNLOAD,
        DEFAULT_SAMPLE_RATE,
        DEFAULT_AUDIO_FORMAT,
        PORT,
        PIPELINE,
        MODEL_BASE_URL,
    ];
}

pub mod defaults {
    pub const WORKERS: u32 = 1;
    pub const MAX_MEMORY_GB: f64 = 4.0;
    pub const MODEL_CACHE_DIR: &str = "/app/model_cache";
    pub const SAMPLE_DATA_DIR: &str = "/app/sample_data";
    pub const OUTPUT_DIR: &str = "/app/outputs";
    pub const DEFAULT_MODEL: &str = "tts_models/en/ljspeech/tacotron2-DDC";
    pub const MODELS_AUTO_DOWNLOAD: bool = true;
    pub const DEFAULT_SAMPLE_RATE: u32 = 22_050;
    pub const PORT: u16 = 8000;
    pub const PIPELINE: &str = "tone";
    pub const MODEL_BASE_URL: &str =
        "https://github.com/coqui-ai/TTS/releases/download/v0.6.1_models";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentMode {
    #[default]
    Development,
    Production,
}

impl EnvironmentMode {
    pub const VARIANTS: &'static [&'static str] = &["development", "production"];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentMode::Development => "development",
            EnvironmentMode::Production => "production",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "development" => Some(EnvironmentMode::Development),
            "production" => Some(EnvironmentMode::Production),
            _ => None,
        }
    }
}

/// 设备偏好；`Auto` 交由引擎启动时的能力探测决定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    #[default]
    Auto,
    Cpu,
    Cuda,
    Mps,
}

impl DevicePreference {
    pub const VARIANTS: &'static [&'static str] = &["auto", "cpu", "cuda", "mps"];

    pub fn as_str(&self) -> &'static str {
        match self {
            DevicePreference::Auto => "auto",
            DevicePreference::Cpu => "cpu",
            DevicePreference::Cuda => "cuda",
            DevicePreference::Mps => "mps",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "auto" => Some(DevicePreference::Auto),
            "cpu" => Some(DevicePreference::Cpu),
            "cuda" => Some(DevicePreference::Cuda),
            "mps" => Some(DevicePreference::Mps),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub const VARIANTS: &'static [&'static str] = &["DEBUG", "INFO", "WARNING", "ERROR"];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "DEBUG" => Some(LogLevel::Debug),
            "INFO" => Some(LogLevel::Info),
            "WARNING" => Some(LogLevel::Warning),
            "ERROR" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// 对应 `tracing` 过滤指令。
    pub fn filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

impl LogFormat {
    pub const VARIANTS: &'static [&'static str] = &["json", "text"];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Json => "json",
            LogFormat::Text => "text",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "json" => Some(LogFormat::Json),
            "text" => Some(LogFormat::Text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Wav,
}

impl AudioFormat {
    pub const VARIANTS: &'static [&'static str] = &["wav"];

    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "wav" => Some(AudioFormat::Wav),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

/// 一个引擎进程的完整运行时配置，解析后不可变。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeConfiguration {
    pub environment_mode: EnvironmentMode,
    pub device_preference: DevicePreference,
    pub worker_count: u32,
    pub max_memory_gigabytes: f64,
    pub model_cache_directory: PathBuf,
    pub sample_data_directory: PathBuf,
    pub output_directory: PathBuf,
    pub log_level: LogLevel,
    pub log_format: LogFormat,
    pub default_model_identifier: String,
    pub models_auto_download: bool,
    pub default_sample_rate_hz: u32,
    pub default_audio_format: AudioFormat,
    pub service_port: u16,
    pub pipeline_name: String,
    pub model_base_url: String,
}

impl Default for RuntimeConfiguration {
    fn default() -> Self {
        Self {
            environment_mode: EnvironmentMode::default(),
            device_preference: DevicePreference::default(),
            worker_count: defaults::WORKERS,
            max_memory_gigabytes: defaults::MAX_MEMORY_GB,
            model_cache_directory: PathBuf::from(defaults::MODEL_CACHE_DIR),
            sample_data_directory: PathBuf::from(defaults::SAMPLE_DATA_DIR),
            output_directory: PathBuf::from(defaults::OUTPUT_DIR),
            log_level: LogLevel::default(),
            log_format: LogFormat::default(),
            default_model_identifier: defaults::DEFAULT_MODEL.to_string(),
            models_auto_download: defaults::MODELS_AUTO_DOWNLOAD,
            default_sample_rate_hz: defaults::DEFAULT_SAMPLE_RATE,
            default_audio_format: AudioFormat::default(),
            service_port: defaults::PORT,
            pipeline_name: defaults::PIPELINE.to_string(),
            model_base_url: defaults::MODEL_BASE_URL.to_string(),
        }
    }
}
