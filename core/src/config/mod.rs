//! 运行时配置解析：环境文件 → 经过校验的不可变配置。

mod env_file;
mod error;
mod resolver;
mod settings;

pub use env_file::{load_env_file, load_layered, parse_env_file, EnvMap};
pub use error::{ConfigProblem, ConfigurationError, ConfigurationErrors, EnvFileError};
pub use resolver::resolve;
pub use settings::{
    defaults, keys, AudioFormat, DevicePreference, EnvironmentMode, LogFormat, LogLevel,
    RuntimeConfiguration,
};

#[cfg(test)]
mod tests;
