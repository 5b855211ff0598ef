use thiserror::Error;

use crate::core::DataType;
use crate::port::Direction;
use crate::task::TaskId;

/// A task kind declared its ports incorrectly.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Duplicate {direction} port '{name}'")]
    DuplicatePort { direction: Direction, name: String },

    #[error("Port '{name}' is an {found} port but was declared among the {expected} ports")]
    WrongDirection {
        name: String,
        expected: Direction,
        found: Direction,
    },
}

/// Errors raised while assembling or inspecting the graph.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Task {0} does not exist")]
    UnknownTask(TaskId),

    #[error("Invalid {direction} port name '{name}'")]
    UnknownPort { direction: Direction, name: String },

    #[error("A port name is required, the task has {count} {direction} ports")]
    AmbiguousPort { direction: Direction, count: usize },

    #[error("Cannot connect a task to itself")]
    SelfConnection,

    #[error("Incompatible port connection: {producer} -> {consumer}")]
    Incompatible {
        producer: DataType,
        consumer: DataType,
    },

    #[error("Connecting task {producer} to task {consumer} would create a cycle")]
    Cycle { producer: TaskId, consumer: TaskId },

    #[error("Task {task} is not a {expected}")]
    KindMismatch {
        task: TaskId,
        expected: &'static str,
    },
}

/// Errors raised by a single task run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Input port '{port}' not connected")]
    UnmetDependency { port: String },

    #[error("Invalid {direction} port name '{name}'")]
    UnknownPort { direction: Direction, name: String },

    #[error("Input port '{port}' does not carry a value of type {expected}")]
    InputType { port: String, expected: &'static str },

    #[error("Output port '{port}' emits {expected}, got {found}")]
    OutputType {
        port: String,
        expected: DataType,
        found: DataType,
    },

    #[error("Run finished without producing outputs: {}", .ports.join(", "))]
    MissingOutputs { ports: Vec<String> },

    #[error(transparent)]
    Task(#[from] anyhow::Error),
}

/// Errors surfaced by reads and explicit runs.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Task '{task}':\n{source}")]
    Run { task: String, source: RunError },

    #[error("Dependency chain deeper than {limit} tasks while refreshing '{task}'")]
    DepthExceeded { task: String, limit: usize },

    #[error("Output port '{port}' does not hold a value of type {expected}")]
    Downcast { port: String, expected: &'static str },
}

impl EngineError {
    /// The run failure behind this error, if a task run caused it.
    pub fn as_run(&self) -> Option<&RunError> {
        match self {
            EngineError::Run { source, .. } => Some(source),
            _ => None,
        }
    }
}
