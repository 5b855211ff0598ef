//! Port declarations and port instance handles.
//!
//! A task kind declares its slots once, as a [`Ports`] table of
//! [`PortDescriptor`]s. The table is immutable and shared by every task of
//! that kind. When a task is added to a [`Pipeline`](crate::Pipeline), one
//! port instance is allocated per descriptor; callers refer to those
//! instances through the copyable [`InputRef`] and [`OutputRef`] handles.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt::Display;

use crate::core::DataType;
use crate::error::{ConfigError, GraphError};
use crate::task::TaskId;

/// The name given to a port declared without one.
pub const DEFAULT_PORT: &str = "";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Input => f.write_str("input"),
            Direction::Output => f.write_str("output"),
        }
    }
}

/// A named, typed slot on a task kind.
#[derive(Debug, Clone)]
pub struct PortDescriptor {
    name: Cow<'static, str>,
    direction: Direction,
    data_type: DataType,
    description: Cow<'static, str>,
    required: bool,
}

impl PortDescriptor {
    pub fn new(name: impl Into<Cow<'static, str>>, direction: Direction, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            direction,
            data_type,
            description: Cow::Borrowed(""),
            required: true,
        }
    }

    /// An input port accepting values of type `T`.
    pub fn input<T: ?Sized + 'static>(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, Direction::Input, DataType::of::<T>())
    }

    /// An output port emitting values of type `T`.
    pub fn output<T: ?Sized + 'static>(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, Direction::Output, DataType::of::<T>())
    }

    pub fn with_description(mut self, description: impl Into<Cow<'static, str>>) -> Self {
        self.description = description.into();
        self
    }

    /// Marks an input as optional: the task may run while it is unbound.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// A one line description of the port, prefixed with `tab`.
    pub fn describe(&self, tab: &str) -> String {
        format!(
            "{tab}{} port '{}' ({}): {}\n",
            self.direction, self.name, self.data_type, self.description
        )
    }
}

/// Declares an input port; an omitted name becomes [`DEFAULT_PORT`].
pub fn make_input_port(name: Option<&'static str>, data_type: DataType) -> PortDescriptor {
    PortDescriptor::new(name.unwrap_or(DEFAULT_PORT), Direction::Input, data_type)
}

/// Declares an output port; an omitted name becomes [`DEFAULT_PORT`].
pub fn make_output_port(name: Option<&'static str>, data_type: DataType) -> PortDescriptor {
    PortDescriptor::new(name.unwrap_or(DEFAULT_PORT), Direction::Output, data_type)
}

/// The immutable table of port descriptors of one task kind.
#[derive(Debug, Clone, Default)]
pub struct Ports {
    inputs: Vec<PortDescriptor>,
    outputs: Vec<PortDescriptor>,
}

impl Ports {
    /// Validates and builds a descriptor table.
    ///
    /// Fails when two ports of the same direction share a name, or when a
    /// descriptor sits in the wrong list.
    pub fn new(
        inputs: Vec<PortDescriptor>,
        outputs: Vec<PortDescriptor>,
    ) -> Result<Self, ConfigError> {
        check_ports(&inputs, Direction::Input)?;
        check_ports(&outputs, Direction::Output)?;
        Ok(Self { inputs, outputs })
    }

    /// Builds a table the crate itself declares with literal, distinct names.
    pub(crate) fn fixed(inputs: Vec<PortDescriptor>, outputs: Vec<PortDescriptor>) -> Self {
        debug_assert!(check_ports(&inputs, Direction::Input).is_ok());
        debug_assert!(check_ports(&outputs, Direction::Output).is_ok());
        Self { inputs, outputs }
    }

    pub fn inputs(&self) -> &[PortDescriptor] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[PortDescriptor] {
        &self.outputs
    }

    pub fn list(&self, direction: Direction) -> &[PortDescriptor] {
        match direction {
            Direction::Input => &self.inputs,
            Direction::Output => &self.outputs,
        }
    }

    /// The position of the port with exactly this name.
    pub fn position(&self, direction: Direction, name: &str) -> Option<usize> {
        self.list(direction).iter().position(|port| port.name() == name)
    }

    /// Resolves a port by name, or the sole port of that direction when no
    /// name is given.
    pub fn resolve(&self, direction: Direction, name: Option<&str>) -> Result<usize, GraphError> {
        let list = self.list(direction);

        match name {
            Some(name) => self
                .position(direction, name)
                .ok_or_else(|| GraphError::UnknownPort {
                    direction,
                    name: name.to_string(),
                }),
            None if list.len() == 1 => Ok(0),
            None => Err(GraphError::AmbiguousPort {
                direction,
                count: list.len(),
            }),
        }
    }
}

fn check_ports(ports: &[PortDescriptor], expected: Direction) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for port in ports {
        if port.direction != expected {
            return Err(ConfigError::WrongDirection {
                name: port.name.to_string(),
                expected,
                found: port.direction,
            });
        }

        if !seen.insert(port.name()) {
            return Err(ConfigError::DuplicatePort {
                direction: expected,
                name: port.name.to_string(),
            });
        }
    }

    Ok(())
}

/// A handle to one input port instance of a task in a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputRef {
    pub(crate) task: TaskId,
    pub(crate) index: usize,
}

impl InputRef {
    pub fn task(&self) -> TaskId {
        self.task
    }

    /// Position of the port in its kind's input list.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// A handle to one output port instance of a task in a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputRef {
    pub(crate) task: TaskId,
    pub(crate) index: usize,
}

impl OutputRef {
    pub fn task(&self) -> TaskId {
        self.task
    }

    /// Position of the port in its kind's output list.
    pub fn index(&self) -> usize {
        self.index
    }
}
