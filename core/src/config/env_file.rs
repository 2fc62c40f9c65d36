//! `KEY=value` 环境文件读取。

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::config::error::EnvFileError;

/// 原始键值映射，键与值均未经解释。
pub type EnvMap = BTreeMap<String, String>;

/// 按行解析环境文件内容。
///
/// 注释行 (`#`) 与空行被忽略；值取第一个 `=` 之后的原文，不处理引号或转义。
/// 重复的键以最后一次出现为准。
pub fn parse_env_file(contents: &str) -> Result<EnvMap, EnvFileError> {
    let mut map = EnvMap::new();

    for (index, raw_line) in contents.lines().enumerate() {
        let line = if index == 0 {
            raw_line.trim_start_matches('\u{feff}')
        } else {
            raw_line
        };
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(EnvFileError::MalformedLine {
                line: index + 1,
                content: line.to_string(),
            });
        };

        let key = key.trim();
        if key.is_empty() {
            return Err(EnvFileError::MalformedLine {
                line: index + 1,
                content: line.to_string(),
            });
        }

        map.insert(key.to_string(), value.to_string());
    }

    Ok(map)
}

pub fn load_env_file(path: &Path) -> Result<EnvMap, EnvFileError> {
    let contents = fs::read_to_string(path).map_err(|source| EnvFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let map = parse_env_file(&contents)?;
    info!(
        target: "config",
        path = %path.display(),
        entries = map.len(),
        "loaded env file"
    );
    Ok(map)
}

/// 合并环境文件与进程环境变量，进程环境优先。
///
/// `optional` 为真时，缺失的环境文件被视为空。
pub fn load_layered<I>(
    env_file: Option<&Path>,
    optional: bool,
    process_vars: I,
) -> Result<EnvMap, EnvFileError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut map = match env_file {
        Some(path) if optional && !path.exists() => {
            debug!(
                target: "config",
                path = %path.display(),
                "env file not present, using process environment only"
            );
            EnvMap::new()
        }
        Some(path) => load_env_file(path)?,
        None => EnvMap::new(),
    };

    map.extend(process_vars);
    Ok(map)
}
