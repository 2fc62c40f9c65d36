//! 引擎启动前的目录检查。

use std::fs::{self, OpenOptions};
use std::path::Path;

use crate::config::{keys, RuntimeConfiguration};
use crate::engine::error::ResourceUnavailableError;

const WRITE_PROBE: &str = ".ttsbox-write-probe";

/// 检查三个数据目录，收集全部失败。
///
/// 输出目录必须可写（缺失时创建）；样例目录必须存在且可读。模型缓存目录在
/// 允许自动下载时必须可写，否则只需可读，已缓存模型可以只读使用。
pub fn check_directories(
    config: &RuntimeConfiguration,
) -> Result<(), Vec<ResourceUnavailableError>> {
    let mut failures = Vec::new();

    let cache_check = if config.models_auto_download {
        ensure_writable(keys::MODEL_CACHE_DIR, &config.model_cache_directory)
    } else {
        ensure_readable(keys::MODEL_CACHE_DIR, &config.model_cache_directory)
    };
    let checks = [
        cache_check,
        ensure_writable(keys::OUTPUT_DIR, &config.output_directory),
        ensure_readable(keys::SAMPLE_DATA_DIR, &config.sample_data_directory),
    ];

    for check in checks {
        if let Err(failure) = check {
            failures.push(failure);
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures)
    }
}

fn unavailable(setting: &'static str, path: &Path, reason: String) -> ResourceUnavailableError {
    ResourceUnavailableError {
        setting,
        path: path.to_path_buf(),
        reason,
    }
}

fn ensure_writable(setting: &'static str, path: &Path) -> Result<(), ResourceUnavailableError> {
    fs::create_dir_all(path).map_err(|err| {
        unavailable(setting, path, format!("cannot create directory: {err}"))
    })?;

    if !path.is_dir() {
        return Err(unavailable(setting, path, "not a directory".into()));
    }

    let probe = path.join(WRITE_PROBE);
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&probe)
        .map_err(|err| {
            unavailable(setting, path, format!("not writable: {err}"))
        })?;
    let _ = fs::remove_file(&probe);
    Ok(())
}

fn ensure_readable(setting: &'static str, path: &Path) -> Result<(), ResourceUnavailableError> {
    if !path.exists() {
        return Err(unavailable(setting, path, "does not exist".into()));
    }
    if !path.is_dir() {
        return Err(unavailable(setting, path, "not a directory".into()));
    }
    fs::read_dir(path)
        .map(|_| ())
        .map_err(|err| {
            unavailable(setting, path, format!("not readable: {err}"))
        })
}
