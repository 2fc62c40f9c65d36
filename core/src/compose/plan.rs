use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::info;

use crate::compose::types::{
    Activation, BuildRecipe, BuildSpec, MountMode, MountSource, PortMapping, RestartPolicy,
    ServiceDeclaration, UnitKind, VolumeMount,
};
use crate::config::RuntimeConfiguration;

pub const DEFAULT_PROJECT: &str = "ttsbox";
pub const DEFAULT_NETWORK: &str = "tts_network";
pub const ENV_FILE: &str = ".env";
pub const MODEL_CACHE_VOLUME: &str = "model_cache";
pub const OUTPUT_VOLUME: &str = "outputs";
pub const SAMPLE_DATA_HOST_PATH: &str = "./sample_data";
pub const ENGINE_CONTAINER_PORT: u16 = 8000;
const BACKEND_PORT: u16 = 5000;
const FRONTEND_PORT: u16 = 3000;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompositionError {
    #[error("unit {0} is not declared")]
    UndeclaredUnit(UnitKind),
    #[error("active unit {unit} is not attached to network {network}")]
    OffNetwork { unit: UnitKind, network: String },
    #[error("active unit {unit} depends on inactive unit {dependency}")]
    InactiveDependency {
        unit: UnitKind,
        dependency: UnitKind,
    },
    #[error("host port {port} is published by both {first} and {second}")]
    DuplicateHostPort {
        port: u16,
        first: UnitKind,
        second: UnitKind,
    },
    #[error("unit {unit} mounts to relative container path {target}")]
    RelativeMountTarget { unit: UnitKind, target: String },
}

/// 部署单元集合及其共享网络。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentPlan {
    project: String,
    network: String,
    units: BTreeMap<UnitKind, ServiceDeclaration>,
}

impl DeploymentPlan {
    pub fn new(project: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            network: network.into(),
            units: BTreeMap::new(),
        }
    }

    /// 标准部署：引擎单元启用，后端与前端单元已声明但未启用。
    pub fn from_config(config: &RuntimeConfiguration) -> Self {
        let mut plan = Self::new(DEFAULT_PROJECT, DEFAULT_NETWORK);
        plan.declare(engine_unit(config, DEFAULT_NETWORK));
        for (kind, port) in [
            (UnitKind::Backend, BACKEND_PORT),
            (UnitKind::Frontend, FRONTEND_PORT),
        ] {
            plan.declare(companion_unit(kind, port, DEFAULT_NETWORK));
        }
        plan
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn declare(&mut self, declaration: ServiceDeclaration) {
        self.units.insert(declaration.kind, declaration);
    }

    pub fn unit(&self, kind: UnitKind) -> Option<&ServiceDeclaration> {
        self.units.get(&kind)
    }

    pub fn units(&self) -> impl Iterator<Item = &ServiceDeclaration> {
        self.units.values()
    }

    pub fn active_units(&self) -> impl Iterator<Item = &ServiceDeclaration> {
        self.units.values().filter(|unit| unit.is_active())
    }

    pub fn activate(&mut self, kind: UnitKind) -> Result<(), CompositionError> {
        self.set_activation(kind, Activation::Active)
    }

    pub fn deactivate(&mut self, kind: UnitKind) -> Result<(), CompositionError> {
        self.set_activation(kind, Activation::Inactive)
    }

    fn set_activation(
        &mut self,
        kind: UnitKind,
        activation: Activation,
    ) -> Result<(), CompositionError> {
        let unit = self
            .units
            .get_mut(&kind)
            .ok_or(CompositionError::UndeclaredUnit(kind))?;
        unit.activation = activation;
        info!(
            target: "service_composer",
            unit = kind.as_str(),
            ?activation,
            "unit activation changed"
        );
        Ok(())
    }

    /// 收集全部编排约束违规。
    pub fn validate(&self) -> Result<(), Vec<CompositionError>> {
        let mut errors = Vec::new();
        let mut host_ports: BTreeMap<u16, UnitKind> = BTreeMap::new();

        for unit in self.active_units() {
            if !unit.networks.iter().any(|network| network == &self.network) {
                errors.push(CompositionError::OffNetwork {
                    unit: unit.kind,
                    network: self.network.clone(),
                });
            }

            for dependency in &unit.depends_on {
                let active = self
                    .units
                    .get(dependency)
                    .map(ServiceDeclaration::is_active)
                    .unwrap_or(false);
                if !active {
                    errors.push(CompositionError::InactiveDependency {
                        unit: unit.kind,
                        dependency: *dependency,
                    });
                }
            }

            for port in &unit.ports {
                if let Some(first) = host_ports.insert(port.host, unit.kind) {
                    errors.push(CompositionError::DuplicateHostPort {
                        port: port.host,
                        first,
                        second: unit.kind,
                    });
                }
            }

            for volume in &unit.volumes {
                if !volume.target.is_absolute() {
                    errors.push(CompositionError::RelativeMountTarget {
                        unit: unit.kind,
                        target: volume.target.display().to_string(),
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// 启用单元所引用的具名卷。
    pub fn named_volumes(&self) -> BTreeSet<String> {
        self.active_units()
            .flat_map(|unit| unit.volumes.iter())
            .filter_map(|volume| match &volume.source {
                MountSource::NamedVolume(name) => Some(name.clone()),
                MountSource::HostPath(_) => None,
            })
            .collect()
    }

    /// 渲染 compose 文档（JSON，compose 以 YAML 超集读取）。
    ///
    /// 只有启用的单元进入 `services`；未启用的单元保留在 `x-inactive-services`。
    pub fn render_compose(&self) -> Value {
        let mut services = Map::new();
        let mut inactive = Map::new();

        for unit in self.units.values() {
            let rendered = render_service(unit);
            if unit.is_active() {
                services.insert(unit.kind.as_str().to_string(), rendered);
            } else {
                inactive.insert(unit.kind.as_str().to_string(), rendered);
            }
        }

        let volumes: Map<String, Value> = self
            .named_volumes()
            .into_iter()
            .map(|name| (name, json!({})))
            .collect();

        let mut document = Map::new();
        document.insert("name".into(), json!(self.project));
        document.insert("services".into(), Value::Object(services));
        if !volumes.is_empty() {
            document.insert("volumes".into(), Value::Object(volumes));
        }
        let mut networks = Map::new();
        networks.insert(self.network.clone(), json!({ "driver": "bridge" }));
        document.insert("networks".into(), Value::Object(networks));
        if !inactive.is_empty() {
            document.insert("x-inactive-services".into(), Value::Object(inactive));
        }
        Value::Object(document)
    }

    pub fn engine_dockerfile(&self) -> Option<String> {
        self.unit(UnitKind::Engine)
            .and_then(|unit| unit.build.recipe.as_ref())
            .map(BuildRecipe::render_dockerfile)
    }
}

fn render_service(unit: &ServiceDeclaration) -> Value {
    let mut service = Map::new();
    service.insert(
        "build".into(),
        json!({ "context": unit.build.context, "dockerfile": unit.build.dockerfile }),
    );
    service.insert("container_name".into(), json!(unit.container_name));
    if let Some(dir) = &unit.working_dir {
        service.insert("working_dir".into(), json!(dir));
    }
    service.insert("env_file".into(), json!([unit.env_file]));
    if !unit.environment.is_empty() {
        service.insert("environment".into(), json!(unit.environment));
    }
    if !unit.ports.is_empty() {
        let ports: Vec<String> = unit.ports.iter().map(PortMapping::compose_entry).collect();
        service.insert("ports".into(), json!(ports));
    }
    if !unit.volumes.is_empty() {
        let volumes: Vec<String> = unit
            .volumes
            .iter()
            .map(VolumeMount::compose_entry)
            .collect();
        service.insert("volumes".into(), json!(volumes));
    }
    service.insert("networks".into(), json!(unit.networks));
    service.insert("restart".into(), json!(unit.restart.as_str()));
    if !unit.depends_on.is_empty() {
        let depends: Vec<&str> = unit.depends_on.iter().map(UnitKind::as_str).collect();
        service.insert("depends_on".into(), json!(depends));
    }
    Value::Object(service)
}

fn engine_recipe() -> BuildRecipe {
    BuildRecipe {
        base_image: "python:3.10-slim".into(),
        working_dir: "/app".into(),
        system_packages: ["build-essential", "espeak-ng", "ffmpeg", "git", "libsndfile1"]
            .into_iter()
            .map(String::from)
            .collect(),
        dependency_manifest: "requirements.txt".into(),
        dependency_install: "pip install --no-cache-dir -r requirements.txt".into(),
        package_install: "pip install --no-cache-dir -e .".into(),
        command: vec!["python".into(), "engine/examples/coqui_example.py".into()],
    }
}

fn engine_unit(config: &RuntimeConfiguration, network: &str) -> ServiceDeclaration {
    ServiceDeclaration {
        kind: UnitKind::Engine,
        container_name: "tts_engine".into(),
        build: BuildSpec {
            context: ".".into(),
            dockerfile: "Dockerfile".into(),
            recipe: Some(engine_recipe()),
        },
        working_dir: Some("/app".into()),
        env_file: ENV_FILE.into(),
        environment: BTreeMap::new(),
        ports: vec![PortMapping {
            host: config.service_port,
            container: ENGINE_CONTAINER_PORT,
        }],
        volumes: vec![
            VolumeMount::named(MODEL_CACHE_VOLUME, config.model_cache_directory.clone()),
            VolumeMount::named(OUTPUT_VOLUME, config.output_directory.clone()),
            VolumeMount::bind(
                SAMPLE_DATA_HOST_PATH,
                config.sample_data_directory.clone(),
                MountMode::ReadWrite,
            ),
        ],
        networks: vec![network.to_string()],
        restart: RestartPolicy::UnlessStopped,
        depends_on: Vec::new(),
        activation: Activation::Active,
    }
}

fn companion_unit(kind: UnitKind, port: u16, network: &str) -> ServiceDeclaration {
    let mut environment = BTreeMap::new();
    environment.insert(
        "TTS_ENGINE_URL".to_string(),
        format!("http://{}:{ENGINE_CONTAINER_PORT}", UnitKind::Engine.as_str()),
    );

    ServiceDeclaration {
        kind,
        container_name: format!("tts_{}", kind.as_str()),
        build: BuildSpec {
            context: format!("./{}", kind.as_str()),
            dockerfile: "Dockerfile".into(),
            recipe: None,
        },
        working_dir: None,
        env_file: ENV_FILE.into(),
        environment,
        ports: vec![PortMapping {
            host: port,
            container: port,
        }],
        volumes: Vec::new(),
        networks: vec![network.to_string()],
        restart: RestartPolicy::UnlessStopped,
        depends_on: vec![UnitKind::Engine],
        activation: Activation::Inactive,
    }
}
