//! Ready-made task kinds.
//!
//! * [`Source`] feeds a constant into the graph.
//! * [`Fork`] copies one input to two outputs.
//! * [`Unary`] applies a function to one input.
//! * [`Binary`] combines inputs `"0"` and `"1"` with an [`Operation`] such
//!   as [`Add`] or [`Divide`].

use std::borrow::Cow;
use std::marker::PhantomData;
use std::ops;
use std::sync::Arc;

use crate::Pipeline;
use crate::error::GraphError;
use crate::port::{DEFAULT_PORT, PortDescriptor, Ports};
use crate::task::{RunContext, TaskId, TaskKind};

/// A task with no inputs that emits a fixed value on its default output.
pub struct Source<T> {
    value: Arc<T>,
    ports: Arc<Ports>,
}

impl<T: Send + Sync + 'static> Source<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Arc::new(value),
            ports: Arc::new(Ports::fixed(vec![], vec![PortDescriptor::output::<T>(DEFAULT_PORT)])),
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    /// Replaces the emitted value. Prefer [`Pipeline::set_source`], which also
    /// invalidates the task.
    pub fn set(&mut self, value: T) {
        self.value = Arc::new(value);
    }
}

impl<T: Send + Sync + 'static> TaskKind for Source<T> {
    fn name(&self) -> Cow<'static, str> {
        "source".into()
    }

    fn ports(&self) -> Arc<Ports> {
        self.ports.clone()
    }

    fn run(&mut self, ctx: &mut RunContext<'_>) -> anyhow::Result<()> {
        ctx.set_output_shared(DEFAULT_PORT, self.value.clone())?;
        Ok(())
    }
}

impl Pipeline {
    /// Changes the value of a [`Source`] task and invalidates everything that
    /// depends on it.
    pub fn set_source<T: Send + Sync + 'static>(
        &mut self,
        task: TaskId,
        value: T,
    ) -> Result<(), GraphError> {
        self.update::<Source<T>, _>(task, |source| source.set(value))
    }
}

/// Copies its default input to outputs `"0"` and `"1"`.
pub struct Fork<T> {
    ports: Arc<Ports>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Fork<T> {
    pub fn new() -> Self {
        Self {
            ports: Arc::new(Ports::fixed(
                vec![PortDescriptor::input::<T>(DEFAULT_PORT)],
                vec![PortDescriptor::output::<T>("0"), PortDescriptor::output::<T>("1")],
            )),
            _phantom: PhantomData,
        }
    }
}

impl<T: Send + Sync + 'static> Default for Fork<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> TaskKind for Fork<T> {
    fn name(&self) -> Cow<'static, str> {
        "fork".into()
    }

    fn ports(&self) -> Arc<Ports> {
        self.ports.clone()
    }

    fn run(&mut self, ctx: &mut RunContext<'_>) -> anyhow::Result<()> {
        let value = ctx.input_shared::<T>(DEFAULT_PORT)?;
        ctx.set_output_shared("0", value.clone())?;
        ctx.set_output_shared("1", value)?;
        Ok(())
    }
}

/// Applies a function to input `"0"` and emits the result on the default
/// output.
pub struct Unary<T, U, F> {
    name: Cow<'static, str>,
    ports: Arc<Ports>,
    callback: F,
    _phantom: PhantomData<fn(T) -> U>,
}

impl<T, U, F> Unary<T, U, F>
where
    T: Send + Sync + 'static,
    U: Send + Sync + 'static,
    F: FnMut(&T) -> anyhow::Result<U> + Send + 'static,
{
    pub fn new(name: impl Into<Cow<'static, str>>, callback: F) -> Self {
        Self {
            name: name.into(),
            ports: Arc::new(Ports::fixed(
                vec![PortDescriptor::input::<T>("0")],
                vec![PortDescriptor::output::<U>(DEFAULT_PORT)],
            )),
            callback,
            _phantom: PhantomData,
        }
    }
}

impl<T, U, F> TaskKind for Unary<T, U, F>
where
    T: Send + Sync + 'static,
    U: Send + Sync + 'static,
    F: FnMut(&T) -> anyhow::Result<U> + Send + 'static,
{
    fn name(&self) -> Cow<'static, str> {
        self.name.clone()
    }

    fn ports(&self) -> Arc<Ports> {
        self.ports.clone()
    }

    fn run(&mut self, ctx: &mut RunContext<'_>) -> anyhow::Result<()> {
        let output = (self.callback)(ctx.input::<T>("0")?)?;
        ctx.set_output(DEFAULT_PORT, output)?;
        Ok(())
    }
}

/// A binary operation usable by [`Binary`].
pub trait Operation<T>: Send + 'static {
    const NAME: &'static str;

    fn apply(lhs: &T, rhs: &T) -> anyhow::Result<T>;
}

pub struct Add;
pub struct Subtract;
pub struct Multiply;
pub struct Divide;

impl<T: ops::Add<Output = T> + Clone> Operation<T> for Add {
    const NAME: &'static str = "add";

    fn apply(lhs: &T, rhs: &T) -> anyhow::Result<T> {
        Ok(lhs.clone() + rhs.clone())
    }
}

impl<T: ops::Sub<Output = T> + Clone> Operation<T> for Subtract {
    const NAME: &'static str = "subtract";

    fn apply(lhs: &T, rhs: &T) -> anyhow::Result<T> {
        Ok(lhs.clone() - rhs.clone())
    }
}

impl<T: ops::Mul<Output = T> + Clone> Operation<T> for Multiply {
    const NAME: &'static str = "multiply";

    fn apply(lhs: &T, rhs: &T) -> anyhow::Result<T> {
        Ok(lhs.clone() * rhs.clone())
    }
}

/// Rejects a divisor equal to `T::default()`, the zero of numeric types.
impl<T: ops::Div<Output = T> + Clone + PartialEq + Default> Operation<T> for Divide {
    const NAME: &'static str = "divide";

    fn apply(lhs: &T, rhs: &T) -> anyhow::Result<T> {
        if *rhs == T::default() {
            anyhow::bail!("division by zero");
        }
        Ok(lhs.clone() / rhs.clone())
    }
}

/// Combines inputs `"0"` and `"1"` into the default output.
pub struct Binary<T, Op> {
    ports: Arc<Ports>,
    _phantom: PhantomData<fn() -> (T, Op)>,
}

impl<T, Op> Binary<T, Op>
where
    T: Send + Sync + 'static,
    Op: Operation<T>,
{
    pub fn new() -> Self {
        Self {
            ports: Arc::new(Ports::fixed(
                vec![PortDescriptor::input::<T>("0"), PortDescriptor::input::<T>("1")],
                vec![PortDescriptor::output::<T>(DEFAULT_PORT)],
            )),
            _phantom: PhantomData,
        }
    }
}

impl<T, Op> Default for Binary<T, Op>
where
    T: Send + Sync + 'static,
    Op: Operation<T>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, Op> TaskKind for Binary<T, Op>
where
    T: Send + Sync + 'static,
    Op: Operation<T>,
{
    fn name(&self) -> Cow<'static, str> {
        Op::NAME.into()
    }

    fn ports(&self) -> Arc<Ports> {
        self.ports.clone()
    }

    fn run(&mut self, ctx: &mut RunContext<'_>) -> anyhow::Result<()> {
        let output = Op::apply(ctx.input::<T>("0")?, ctx.input::<T>("1")?)?;
        ctx.set_output(DEFAULT_PORT, output)?;
        Ok(())
    }
}
