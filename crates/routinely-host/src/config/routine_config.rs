use serde::{Deserialize, Serialize};

use routinely_scheduler::Value;

/// A routine declared in the config file
///
/// ```toml
/// [[routines]]
/// tag = "announce"
/// interval_ms = 2000
/// message = "server is up"
/// args = ["lobby", 3]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineConfig {
    pub tag: String,

    #[serde(default)]
    pub interval_ms: i64,

    /// Zero runs until the host shuts down
    #[serde(default)]
    pub iterations: u32,

    /// Logged every time the routine fires
    #[serde(default)]
    pub message: String,

    /// Forwarded to the callback and logged with the message
    #[serde(default)]
    pub args: Vec<toml::Value>,

    #[serde(default)]
    pub quiet: Option<bool>,

    #[serde(default)]
    pub endure: bool,

    #[serde(default)]
    pub persistent: Option<bool>,

    #[serde(default)]
    pub suspended: bool,
}

impl RoutineConfig {
    pub fn new(tag: impl Into<String>, interval_ms: i64) -> Self {
        Self {
            tag: tag.into(),
            interval_ms,
            iterations: 0,
            message: String::new(),
            args: Vec::new(),
            quiet: None,
            endure: false,
            persistent: None,
            suspended: false,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_arg(mut self, arg: impl Into<toml::Value>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Convert the TOML arguments, naming the first one that has no scalar form
    pub fn arguments(&self) -> Result<Vec<Value>, &'static str> {
        self.args.iter().map(argument_value).collect()
    }
}

fn argument_value(value: &toml::Value) -> Result<Value, &'static str> {
    match value {
        toml::Value::String(s) => Ok(Value::from(s.as_str())),
        toml::Value::Integer(i) => Ok(Value::Integer(*i)),
        toml::Value::Float(f) => Ok(Value::Float(*f)),
        toml::Value::Boolean(b) => Ok(Value::Bool(*b)),
        toml::Value::Datetime(dt) => Ok(Value::from(dt.to_string())),
        other => Err(other.type_str()),
    }
}
