use std::any::{Any, type_name};
use std::borrow::Cow;
use std::fmt::Display;
use std::sync::Arc;

use petgraph::stable_graph::NodeIndex;

use crate::core::{Compatibility, DataType, Dynamic};
use crate::error::RunError;
use crate::port::{Direction, Ports};

/// A stable handle to a task in a [`Pipeline`](crate::Pipeline).
///
/// Handles stay valid until the task is removed. The graph may hand the slot
/// of a removed task to a task added later, but each handle also carries the
/// generation it was issued with, so a stale handle is rejected as unknown
/// instead of reaching the new task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub(crate) NodeIndex, pub(crate) u32);

impl TaskId {
    /// Returns the underlying `NodeIndex` of the task in the graph.
    ///
    /// Indices of removed tasks are reused.
    pub fn index(&self) -> NodeIndex {
        self.0
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0.index())
    }
}

/// The behaviour of one kind of task.
///
/// A kind declares its ports and supplies the body executed when the engine
/// needs fresh outputs. A run must write every declared output exactly once
/// per pass; the engine rejects runs that leave an output empty. Freshness
/// bookkeeping belongs to the engine, a kind never touches it.
pub trait TaskKind: Any + Send {
    /// Name used in logs, errors and graph renderings.
    fn name(&self) -> Cow<'static, str> {
        type_name::<Self>().into()
    }

    /// The descriptor table shared by every task of this kind.
    fn ports(&self) -> Arc<Ports>;

    fn run(&mut self, ctx: &mut RunContext<'_>) -> anyhow::Result<()>;
}

/// A task kind backed by a closure.
///
/// ```rust
/// use std::sync::Arc;
/// use nagare::{FnKind, Pipeline, PortDescriptor, Ports};
///
/// let ports = Arc::new(Ports::new(vec![], vec![PortDescriptor::output::<u32>("answer")]).unwrap());
/// let mut pipeline = Pipeline::new();
/// let task = pipeline.add_task(FnKind::new("answer", ports, |ctx| {
///     ctx.set_output("answer", 42u32)?;
///     Ok(())
/// }));
///
/// assert_eq!(*pipeline.get_output_value::<u32>(task, None).unwrap(), 42);
/// ```
pub struct FnKind<F> {
    name: Cow<'static, str>,
    ports: Arc<Ports>,
    callback: F,
}

impl<F> FnKind<F>
where
    F: FnMut(&mut RunContext<'_>) -> anyhow::Result<()> + Send + 'static,
{
    pub fn new(name: impl Into<Cow<'static, str>>, ports: Arc<Ports>, callback: F) -> Self {
        Self {
            name: name.into(),
            ports,
            callback,
        }
    }
}

impl<F> TaskKind for FnKind<F>
where
    F: FnMut(&mut RunContext<'_>) -> anyhow::Result<()> + Send + 'static,
{
    fn name(&self) -> Cow<'static, str> {
        self.name.clone()
    }

    fn ports(&self) -> Arc<Ports> {
        self.ports.clone()
    }

    fn run(&mut self, ctx: &mut RunContext<'_>) -> anyhow::Result<()> {
        (self.callback)(ctx)
    }
}

/// The view a task body gets of its ports during one run.
///
/// Inputs hold the cached values of the bound upstream outputs; outputs start
/// empty and must all be filled before the run returns.
pub struct RunContext<'a> {
    ports: &'a Ports,
    inputs: Vec<Option<Dynamic>>,
    outputs: Vec<Option<Dynamic>>,
    compat: &'a dyn Compatibility,
}

impl<'a> RunContext<'a> {
    pub(crate) fn new(
        ports: &'a Ports,
        inputs: Vec<Option<Dynamic>>,
        compat: &'a dyn Compatibility,
    ) -> Self {
        Self {
            ports,
            inputs,
            outputs: vec![None; ports.outputs().len()],
            compat,
        }
    }

    pub(crate) fn into_outputs(self) -> Vec<Option<Dynamic>> {
        self.outputs
    }

    pub fn ports(&self) -> &Ports {
        self.ports
    }

    /// Whether the named input has an upstream source.
    pub fn is_bound(&self, name: &str) -> Result<bool, RunError> {
        let index = self.position(Direction::Input, name)?;
        Ok(self.inputs[index].is_some())
    }

    /// The type-erased value arriving on the named input.
    pub fn input_dynamic(&self, name: &str) -> Result<&Dynamic, RunError> {
        let index = self.position(Direction::Input, name)?;
        self.inputs[index]
            .as_ref()
            .ok_or_else(|| RunError::UnmetDependency {
                port: name.to_string(),
            })
    }

    /// Borrows the value arriving on the named input.
    pub fn input<T: Send + Sync + 'static>(&self, name: &str) -> Result<&T, RunError> {
        self.input_dynamic(name)?
            .downcast_ref::<T>()
            .ok_or_else(|| RunError::InputType {
                port: name.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Shares the value arriving on the named input without cloning it.
    pub fn input_shared<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, RunError> {
        self.input_dynamic(name)?
            .clone()
            .downcast::<T>()
            .map_err(|_| RunError::InputType {
                port: name.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Like [`input`](Self::input), but an unbound input reads as `None`.
    pub fn try_input<T: Send + Sync + 'static>(&self, name: &str) -> Result<Option<&T>, RunError> {
        if self.is_bound(name)? {
            self.input(name).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Stores the value of the named output.
    pub fn set_output<T: Send + Sync + 'static>(
        &mut self,
        name: &str,
        value: T,
    ) -> Result<(), RunError> {
        self.set_output_shared(name, Arc::new(value))
    }

    /// Stores an already shared value on the named output.
    ///
    /// The value's type must be compatible with the type the port declares.
    pub fn set_output_shared<T: Send + Sync + 'static>(
        &mut self,
        name: &str,
        value: Arc<T>,
    ) -> Result<(), RunError> {
        let index = self.position(Direction::Output, name)?;
        let expected = self.ports.outputs()[index].data_type();
        let found = DataType::of::<T>();

        if !self.compat.is_compatible(found, expected) {
            return Err(RunError::OutputType {
                port: name.to_string(),
                expected,
                found,
            });
        }

        self.outputs[index] = Some(value);
        Ok(())
    }

    fn position(&self, direction: Direction, name: &str) -> Result<usize, RunError> {
        self.ports
            .position(direction, name)
            .ok_or_else(|| RunError::UnknownPort {
                direction,
                name: name.to_string(),
            })
    }
}
