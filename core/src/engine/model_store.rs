//! 模型缓存与按需下载。

use anyhow::{anyhow, Context, Result as AnyhowResult};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

use crate::config::RuntimeConfiguration;
use crate::engine::error::ModelAcquisitionError;

const ARTIFACT_EXTENSION: &str = "zip";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStore {
    cache_dir: PathBuf,
    auto_download: bool,
    base_url: String,
}

impl ModelStore {
    pub fn new(
        cache_dir: impl Into<PathBuf>,
        auto_download: bool,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            auto_download,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &RuntimeConfiguration) -> Self {
        Self::new(
            config.model_cache_directory.clone(),
            config.models_auto_download,
            config.model_base_url.clone(),
        )
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn auto_download(&self) -> bool {
        self.auto_download
    }

    /// `tts_models/en/ljspeech/tacotron2-DDC` → `tts_models--en--ljspeech--tacotron2-DDC.zip`
    pub fn artifact_name(identifier: &str) -> String {
        format!("{}.{ARTIFACT_EXTENSION}", identifier.replace('/', "--"))
    }

    pub fn cached_path(&self, identifier: &str) -> PathBuf {
        self.cache_dir.join(Self::artifact_name(identifier))
    }

    pub fn download_url(&self, identifier: &str) -> String {
        format!("{}/{}", self.base_url, Self::artifact_name(identifier))
    }

    /// 返回模型在本地缓存中的路径，必要时下载。
    ///
    /// 已缓存的模型只需可读，因此缓存目录只读时仍可使用。
    pub fn resolve(&self, identifier: &str) -> Result<PathBuf, ModelAcquisitionError> {
        let failure = |reason: String| ModelAcquisitionError {
            model: identifier.to_string(),
            reason,
        };

        validate_identifier(identifier).map_err(failure)?;

        let cached = self.cached_path(identifier);
        if cached.is_file() {
            info!(
                target: "model_store",
                model = identifier,
                path = %cached.display(),
                "using cached model"
            );
            return Ok(cached);
        }

        if !self.auto_download {
            warn!(
                target: "model_store",
                model = identifier,
                path = %cached.display(),
                "model missing from cache and auto-download disabled"
            );
            return Err(failure(format!(
                "not present at {} and auto-download is disabled",
                cached.display()
            )));
        }

        let url = self.download_url(identifier);
        download_model(&cached, &url).map_err(|err| failure(format!("{err:#}")))?;
        Ok(cached)
    }
}

fn validate_identifier(identifier: &str) -> Result<(), String> {
    if identifier.trim().is_empty() {
        return Err("model identifier is empty".into());
    }
    let path = Path::new(identifier);
    let escapes = path
        .components()
        .any(|component| !matches!(component, Component::Normal(_)));
    if escapes {
        return Err("model identifier must be a relative name".into());
    }
    Ok(())
}

fn download_model(path: &Path, url: &str) -> AnyhowResult<()> {
    info!(
        target: "model_store",
        %url,
        path = %path.display(),
        "downloading model"
    );

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!("failed to create model cache directory: {}", parent.display())
        })?;
    }

    // 只有完整写入的文件才会被重命名为缓存产物。
    let partial = path.with_extension("download");
    let fetched = fetch_to_file(url, &partial).and_then(|bytes| {
        fs::rename(&partial, path)
            .with_context(|| format!("failed to move model into {}", path.display()))?;
        Ok(bytes)
    });

    match fetched {
        Ok(bytes) => {
            info!(
                target: "model_store",
                path = %path.display(),
                bytes,
                "model ready"
            );
            Ok(())
        }
        Err(err) => {
            if partial.exists() {
                if let Err(cleanup) = fs::remove_file(&partial) {
                    warn!(
                        target: "model_store",
                        path = %partial.display(),
                        %cleanup,
                        "failed to remove partial model download"
                    );
                }
            }
            Err(err)
        }
    }
}

/// 写入 `dest` 并返回字节数；实际长度与 `Content-Length` 不符时报错。
fn fetch_to_file(url: &str, dest: &Path) -> AnyhowResult<u64> {
    let response = ureq::get(url)
        .call()
        .map_err(|err| anyhow!("failed to download model: {err}"))?;
    let declared = response
        .header("Content-Length")
        .and_then(|value| value.trim().parse::<u64>().ok());

    let file = File::create(dest).with_context(|| format!("failed to create {}", dest.display()))?;
    let mut writer = BufWriter::new(file);
    let written = io::copy(&mut response.into_reader(), &mut writer)
        .context("failed to download model: body interrupted")?;
    writer.flush().with_context(|| format!("failed to flush {}", dest.display()))?;

    match declared {
        Some(expected) if expected != written => Err(anyhow!(
            "failed to download model: received {written} of {expected} bytes"
        )),
        _ => Ok(written),
    }
}
