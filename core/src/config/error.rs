use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigProblem {
    #[error("expected an integer")]
    NotAnInteger,
    #[error("expected a finite number")]
    NotANumber,
    #[error("expected a boolean (true/false/1/0/yes/no/on/off)")]
    NotABoolean,
    #[error("must be greater than zero")]
    NotPositive,
    #[error("must be between {min} and {max}")]
    OutOfRange { min: i64, max: i64 },
    #[error("expected one of: {}", .expected.join(", "))]
    UnknownVariant { expected: &'static [&'static str] },
    #[error("must not be empty")]
    Empty,
    #[error("must be an absolute path")]
    NotAbsolute,
    #[error("must be an http:// or https:// URL")]
    NotHttpUrl,
}

/// 单个配置键的校验失败。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{key}={value}: {problem}")]
pub struct ConfigurationError {
    pub key: &'static str,
    pub value: String,
    pub problem: ConfigProblem,
}

/// 一次解析中收集到的全部校验失败。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationErrors(Vec<ConfigurationError>);

impl ConfigurationErrors {
    pub(crate) fn new(errors: Vec<ConfigurationError>) -> Self {
        Self(errors)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigurationError> {
        self.0.iter()
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.0.iter().map(|error| error.key).collect()
    }

    pub fn into_inner(self) -> Vec<ConfigurationError> {
        self.0
    }
}

impl fmt::Display for ConfigurationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} invalid configuration setting(s)", self.0.len())?;
        for (index, error) in self.0.iter().enumerate() {
            let separator = if index == 0 { ": " } else { "; " };
            write!(f, "{separator}{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigurationErrors {}

#[derive(Debug, Error)]
pub enum EnvFileError {
    #[error("failed to read env file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: expected KEY=value, found {content:?}")]
    MalformedLine { line: usize, content: String },
}
