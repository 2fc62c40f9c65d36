//! 服务编排声明：单元、挂载、网络与重启策略。本模块不执行任何调度。

mod lifecycle;
mod plan;
mod types;

pub use lifecycle::{StopCause, UnitEvent, UnitState};
pub use plan::{
    CompositionError, DeploymentPlan, DEFAULT_NETWORK, DEFAULT_PROJECT, ENGINE_CONTAINER_PORT,
    MODEL_CACHE_VOLUME, OUTPUT_VOLUME, SAMPLE_DATA_HOST_PATH,
};
pub use types::{
    Activation, BuildRecipe, BuildSpec, MountMode, MountSource, PortMapping, RestartPolicy,
    ServiceDeclaration, UnitKind, VolumeMount,
};

#[cfg(test)]
mod tests;
