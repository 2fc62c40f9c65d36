use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// 可部署单元的封闭集合。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Engine,
    Backend,
    Frontend,
}

impl UnitKind {
    pub const ALL: [UnitKind; 3] = [UnitKind::Engine, UnitKind::Backend, UnitKind::Frontend];

    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Engine => "engine",
            UnitKind::Backend => "backend",
            UnitKind::Frontend => "frontend",
        }
    }
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Active,
    Inactive,
}

/// 重启策略，语义与容器运行时一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RestartPolicy {
    #[serde(rename = "no")]
    No,
    #[serde(rename = "always")]
    Always,
    #[serde(rename = "on-failure")]
    OnFailure,
    #[default]
    #[serde(rename = "unless-stopped")]
    UnlessStopped,
}

impl RestartPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestartPolicy::No => "no",
            RestartPolicy::Always => "always",
            RestartPolicy::OnFailure => "on-failure",
            RestartPolicy::UnlessStopped => "unless-stopped",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    pub host: u16,
    pub container: u16,
}

impl PortMapping {
    pub fn compose_entry(&self) -> String {
        format!("{}:{}", self.host, self.container)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountSource {
    /// 由编排器管理、在单元重建后保留的卷。
    NamedVolume(String),
    /// 宿主机路径绑定，便于现场编辑。
    HostPath(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MountMode {
    #[default]
    ReadWrite,
    ReadOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMount {
    pub source: MountSource,
    pub target: PathBuf,
    pub mode: MountMode,
}

impl VolumeMount {
    pub fn named(volume: impl Into<String>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: MountSource::NamedVolume(volume.into()),
            target: target.into(),
            mode: MountMode::ReadWrite,
        }
    }

    pub fn bind(host_path: impl Into<String>, target: impl Into<PathBuf>, mode: MountMode) -> Self {
        Self {
            source: MountSource::HostPath(host_path.into()),
            target: target.into(),
            mode,
        }
    }

    /// compose 短语法，例如 `model_cache:/app/model_cache` 或 `./data:/data:ro`。
    pub fn compose_entry(&self) -> String {
        let source = match &self.source {
            MountSource::NamedVolume(name) => name.as_str(),
            MountSource::HostPath(path) => path.as_str(),
        };
        let mut entry = format!("{source}:{}", self.target.display());
        if self.mode == MountMode::ReadOnly {
            entry.push_str(":ro");
        }
        entry
    }
}

/// 镜像构建步骤：基础镜像、一次性系统库安装、依赖安装、开发模式安装包。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRecipe {
    pub base_image: String,
    pub working_dir: String,
    pub system_packages: Vec<String>,
    pub dependency_manifest: String,
    pub dependency_install: String,
    pub package_install: String,
    pub command: Vec<String>,
}

impl BuildRecipe {
    pub fn render_dockerfile(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("FROM {}\n\n", self.base_image));
        out.push_str(&format!("WORKDIR {}\n\n", self.working_dir));

        if !self.system_packages.is_empty() {
            out.push_str("RUN apt-get update \\\n");
            out.push_str(&format!(
                "    && apt-get install -y --no-install-recommends {} \\\n",
                self.system_packages.join(" ")
            ));
            out.push_str("    && rm -rf /var/lib/apt/lists/*\n\n");
        }

        out.push_str(&format!("COPY {} .\n", self.dependency_manifest));
        out.push_str(&format!("RUN {}\n\n", self.dependency_install));
        out.push_str("COPY . .\n");
        out.push_str(&format!("RUN {}\n", self.package_install));

        if !self.command.is_empty() {
            let command = serde_json::to_string(&self.command).unwrap_or_else(|_| "[]".into());
            out.push_str(&format!("\nCMD {command}\n"));
        }

        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSpec {
    pub context: String,
    pub dockerfile: String,
    /// `None` 表示该单元的 Dockerfile 由其自身目录维护。
    pub recipe: Option<BuildRecipe>,
}

/// 一个可部署单元的声明；声明后不在运行时修改。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDeclaration {
    pub kind: UnitKind,
    pub container_name: String,
    pub build: BuildSpec,
    pub working_dir: Option<String>,
    pub env_file: String,
    pub environment: BTreeMap<String, String>,
    pub ports: Vec<PortMapping>,
    pub volumes: Vec<VolumeMount>,
    pub networks: Vec<String>,
    pub restart: RestartPolicy,
    pub depends_on: Vec<UnitKind>,
    pub activation: Activation,
}

impl ServiceDeclaration {
    pub fn is_active(&self) -> bool {
        self.activation == Activation::Active
    }
}
