use std::path::{Path, PathBuf};

use crate::config::env_file::EnvMap;
use crate::config::error::{ConfigProblem, ConfigurationError, ConfigurationErrors};
use crate::config::settings::{
    defaults, keys, AudioFormat, DevicePreference, EnvironmentMode, LogFormat, LogLevel,
    RuntimeConfiguration,
};

/// 将原始键值映射解析为经过校验的运行时配置。
///
/// 缺失的键取默认值；出现但非法的键一律报错，不回退默认值。所有错误在一次
/// 调用中收集返回。未识别的键被忽略。该函数没有副作用：不创建目录、不探测
/// 设备、不访问网络。
pub fn resolve(source: &EnvMap) -> Result<RuntimeConfiguration, ConfigurationErrors> {
    let mut reader = FieldReader::new(source);

    let config = RuntimeConfiguration {
        environment_mode: reader.choice(
            keys::ENVIRONMENT_MODE,
            EnvironmentMode::default(),
            EnvironmentMode::parse,
            EnvironmentMode::VARIANTS,
        ),
        device_preference: reader.choice(
            keys::DEVICE,
            DevicePreference::default(),
            DevicePreference::parse,
            DevicePreference::VARIANTS,
        ),
        worker_count: reader.positive_u32(keys::WORKERS, defaults::WORKERS),
        max_memory_gigabytes: reader.positive_number(keys::MAX_MEMORY_GB, defaults::MAX_MEMORY_GB),
        model_cache_directory: reader
            .absolute_path(keys::MODEL_CACHE_DIR, defaults::MODEL_CACHE_DIR),
        sample_data_directory: reader
            .absolute_path(keys::SAMPLE_DATA_DIR, defaults::SAMPLE_DATA_DIR),
        output_directory: reader.absolute_path(keys::OUTPUT_DIR, defaults::OUTPUT_DIR),
        log_level: reader.choice(
            keys::LOG_LEVEL,
            LogLevel::default(),
            LogLevel::parse,
            LogLevel::VARIANTS,
        ),
        log_format: reader.choice(
            keys::LOG_FORMAT,
            LogFormat::default(),
            LogFormat::parse,
            LogFormat::VARIANTS,
        ),
        default_model_identifier: reader.text(keys::DEFAULT_MODEL, defaults::DEFAULT_MODEL),
        models_auto_download: reader.boolean(
            keys::MODELS_AUTO_DOWNLOAD,
            defaults::MODELS_AUTO_DOWNLOAD,
        ),
        default_sample_rate_hz: reader
            .positive_u32(keys::DEFAULT_SAMPLE_RATE, defaults::DEFAULT_SAMPLE_RATE),
        default_audio_format: reader.choice(
            keys::DEFAULT_AUDIO_FORMAT,
            AudioFormat::default(),
            AudioFormat::parse,
            AudioFormat::VARIANTS,
        ),
        service_port: reader.port(keys::PORT, defaults::PORT),
        pipeline_name: reader.text(keys::PIPELINE, defaults::PIPELINE),
        model_base_url: reader.http_url(keys::MODEL_BASE_URL, defaults::MODEL_BASE_URL),
    };

    reader.finish(config)
}

impl RuntimeConfiguration {
    /// 以规范形式写回键值映射；再次解析得到相同配置。
    pub fn to_env_map(&self) -> EnvMap {
        let mut map = EnvMap::new();
        let mut put = |key: &str, value: String| {
            map.insert(key.to_string(), value);
        };

        let mode = self.environment_mode.as_str();
        let cache_dir = path_value(&self.model_cache_directory);
        let sample_dir = path_value(&self.sample_data_directory);
        let auto_download = self.models_auto_download.to_string();
        let sample_rate = self.default_sample_rate_hz.to_string();
        let audio_format = self.default_audio_format.as_str();

        put(keys::ENVIRONMENT_MODE, mode.into());
        put(keys::DEVICE, self.device_preference.as_str().into());
        put(keys::WORKERS, self.worker_count.to_string());
        put(keys::MAX_MEMORY_GB, self.max_memory_gigabytes.to_string());
        put(keys::MODEL_CACHE_DIR, cache_dir);
        put(keys::SAMPLE_DATA_DIR, sample_dir);
        put(keys::OUTPUT_DIR, path_value(&self.output_directory));
        put(keys::LOG_LEVEL, self.log_level.as_str().into());
        put(keys::LOG_FORMAT, self.log_format.as_str().into());
        put(keys::DEFAULT_MODEL, self.default_model_identifier.clone());
        put(keys::MODELS_AUTO_DOWNLOAD, auto_download);
        put(keys::DEFAULT_SAMPLE_RATE, sample_rate);
        put(keys::DEFAULT_AUDIO_FORMAT, audio_format.into());
        put(keys::PORT, self.service_port.to_string());
        put(keys::PIPELINE, self.pipeline_name.clone());
        put(keys::MODEL_BASE_URL, self.model_base_url.clone());

        map
    }

    /// 渲染为环境文件文本，按键名排序。
    pub fn to_env_file(&self) -> String {
        self.to_env_map()
            .into_iter()
            .map(|(key, value)| format!("{key}={value}\n"))
            .collect()
    }
}

fn path_value(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

struct FieldReader<'a> {
    source: &'a EnvMap,
    errors: Vec<ConfigurationError>,
}

impl<'a> FieldReader<'a> {
    fn new(source: &'a EnvMap) -> Self {
        Self {
            source,
            errors: Vec::new(),
        }
    }

    fn raw(&self, key: &'static str) -> Option<&'a str> {
        self.source.get(key).map(String::as_str)
    }

    fn reject(&mut self, key: &'static str, value: &str, problem: ConfigProblem) {
        self.errors.push(ConfigurationError {
            key,
            value: value.to_string(),
            problem,
        });
    }

    // 非法值会记录错误并返回默认值占位，`finish` 保证占位值不会外泄。
    fn choice<T: Copy>(
        &mut self,
        key: &'static str,
        default: T,
        parse: fn(&str) -> Option<T>,
        expected: &'static [&'static str],
    ) -> T {
        let Some(raw) = self.raw(key) else {
            return default;
        };
        match parse(raw) {
            Some(value) => value,
            None => {
                self.reject(key, raw, ConfigProblem::UnknownVariant { expected });
                default
            }
        }
    }

    fn positive_u32(&mut self, key: &'static str, default: u32) -> u32 {
        let Some(raw) = self.raw(key) else {
            return default;
        };
        let parsed = match raw.trim().parse::<i64>() {
            Ok(value) => value,
            Err(_) => {
                self.reject(key, raw, ConfigProblem::NotAnInteger);
                return default;
            }
        };
        if parsed <= 0 {
            self.reject(key, raw, ConfigProblem::NotPositive);
            return default;
        }
        match u32::try_from(parsed) {
            Ok(value) => value,
            Err(_) => {
                self.reject(
                    key,
                    raw,
                    ConfigProblem::OutOfRange {
                        min: 1,
                        max: i64::from(u32::MAX),
                    },
                );
                default
            }
        }
    }

    fn port(&mut self, key: &'static str, default: u16) -> u16 {
        let Some(raw) = self.raw(key) else {
            return default;
        };
        let parsed = match raw.trim().parse::<i64>() {
            Ok(value) => value,
            Err(_) => {
                self.reject(key, raw, ConfigProblem::NotAnInteger);
                return default;
            }
        };
        match u16::try_from(parsed) {
            Ok(value) if value > 0 => value,
            _ => {
                self.reject(
                    key,
                    raw,
                    ConfigProblem::OutOfRange {
                        min: 1,
                        max: i64::from(u16::MAX),
                    },
                );
                default
            }
        }
    }

    fn positive_number(&mut self, key: &'static str, default: f64) -> f64 {
        let Some(raw) = self.raw(key) else {
            return default;
        };
        match raw.trim().parse::<f64>() {
            Ok(value) if !value.is_finite() => {
                self.reject(key, raw, ConfigProblem::NotANumber);
                default
            }
            Ok(value) if value <= 0.0 => {
                self.reject(key, raw, ConfigProblem::NotPositive);
                default
            }
            Ok(value) => value,
            Err(_) => {
                self.reject(key, raw, ConfigProblem::NotANumber);
                default
            }
        }
    }

    fn boolean(&mut self, key: &'static str, default: bool) -> bool {
        let Some(raw) = self.raw(key) else {
            return default;
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                self.reject(key, raw, ConfigProblem::NotABoolean);
                default
            }
        }
    }

    fn absolute_path(&mut self, key: &'static str, default: &str) -> PathBuf {
        let Some(raw) = self.raw(key) else {
            return PathBuf::from(default);
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            self.reject(key, raw, ConfigProblem::Empty);
            return PathBuf::from(default);
        }
        let path = PathBuf::from(trimmed);
        if !path.is_absolute() {
            self.reject(key, raw, ConfigProblem::NotAbsolute);
            return PathBuf::from(default);
        }
        path
    }

    fn text(&mut self, key: &'static str, default: &str) -> String {
        let Some(raw) = self.raw(key) else {
            return default.to_string();
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            self.reject(key, raw, ConfigProblem::Empty);
            return default.to_string();
        }
        trimmed.to_string()
    }

    fn http_url(&mut self, key: &'static str, default: &str) -> String {
        let Some(raw) = self.raw(key) else {
            return default.to_string();
        };
        let trimmed = raw.trim().trim_end_matches('/');
        let lower = trimmed.to_ascii_lowercase();
        let has_host = ["http://", "https://"].iter().any(|scheme| {
            lower
                .strip_prefix(scheme)
                .map(|rest| !rest.is_empty())
                .unwrap_or(false)
        });
        if !has_host {
            self.reject(key, raw, ConfigProblem::NotHttpUrl);
            return default.to_string();
        }
        trimmed.to_string()
    }

    fn finish(
        self,
        config: RuntimeConfiguration,
    ) -> Result<RuntimeConfiguration, ConfigurationErrors> {
        if self.errors.is_empty() {
            Ok(config)
        } else {
            Err(ConfigurationErrors::new(self.errors))
        }
    }
}
