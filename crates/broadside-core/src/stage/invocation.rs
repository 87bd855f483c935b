use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Scalar or path value of a named argument.
#[derive(Clone, Debug, PartialEq)]
pub enum ArgValue {
    Text(String),
    Path(PathBuf),
    Int(i64),
    Float(f64),
    /// Rendered as `--name` when true and `--no-name` when false.
    Flag(bool),
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Flag(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&Path> for ArgValue {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<PathBuf> for ArgValue {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<usize> for ArgValue {
    fn from(value: usize) -> Self {
        Self::Int(value as i64)
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// Everything needed to run one external stage for one key.
///
/// Success means the command exited cleanly and every path in `outputs`
/// exists afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct StageInvocation {
    /// Logical stage name, used in logs and errors.
    pub stage: String,
    /// Executable to run.
    pub command: String,
    pub arguments: BTreeMap<String, ArgValue>,
    pub outputs: Vec<PathBuf>,
}

impl StageInvocation {
    pub fn new(stage: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            command: command.into(),
            arguments: BTreeMap::new(),
            outputs: Vec::new(),
        }
    }

    pub fn arg(mut self, name: &str, value: impl Into<ArgValue>) -> Self {
        self.arguments.insert(name.to_string(), value.into());
        self
    }

    /// Add the argument only when `value` is present.
    pub fn arg_opt<V: Into<ArgValue>>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.arg(name, v),
            None => self,
        }
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.outputs.push(path.into());
        self
    }

    /// Command-line arguments, sorted by argument name.
    pub fn render_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.arguments.len() * 2);
        for (name, value) in &self.arguments {
            match value {
                ArgValue::Flag(true) => args.push(format!("--{name}")),
                ArgValue::Flag(false) => args.push(format!("--no-{name}")),
                other => {
                    args.push(format!("--{name}"));
                    args.push(other.to_string());
                }
            }
        }
        args
    }

    pub fn command_line(&self) -> String {
        let mut parts = vec![self.command.clone()];
        parts.extend(self.render_args());
        parts.join(" ")
    }
}
