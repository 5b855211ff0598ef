//! Task kinds shared by the unit tests.

use std::borrow::Cow;
use std::sync::Arc;

use crate::Pipeline;
use crate::core::DataType;
use crate::operators::Source;
use crate::port::{DEFAULT_PORT, Ports, make_input_port, make_output_port};
use crate::task::{FnKind, RunContext, TaskId, TaskKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct D1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct D2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct S1;

pub fn d1() -> DataType {
    DataType::of::<D1>()
}

/// A task with no inputs to use as a source.
pub fn source() -> Source<D1> {
    Source::new(D1)
}

/// A task that counts the number of times it has executed.
pub struct SimpleTask {
    pub count: usize,
    ports: Arc<Ports>,
}

impl SimpleTask {
    pub fn new() -> Self {
        let ports = Ports::new(
            vec![make_input_port(None, d1())],
            vec![
                make_output_port(Some("O1"), d1()),
                make_output_port(Some("O2"), d1()),
            ],
        )
        .unwrap();

        Self {
            count: 0,
            ports: Arc::new(ports),
        }
    }
}

impl TaskKind for SimpleTask {
    fn name(&self) -> Cow<'static, str> {
        "simple".into()
    }

    fn ports(&self) -> Arc<Ports> {
        self.ports.clone()
    }

    fn run(&mut self, ctx: &mut RunContext<'_>) -> anyhow::Result<()> {
        ctx.input::<D1>(DEFAULT_PORT)?;
        self.count += 1;
        ctx.set_output("O1", D1)?;
        ctx.set_output("O2", D1)?;
        Ok(())
    }
}

pub fn count(pipeline: &Pipeline, task: TaskId) -> usize {
    pipeline.kind::<SimpleTask>(task).unwrap().count
}

/// A task with the given ports whose body produces nothing.
pub fn make_task(
    inputs: &[(&'static str, DataType)],
    outputs: &[(&'static str, DataType)],
) -> impl TaskKind {
    let ports = Ports::new(
        inputs
            .iter()
            .map(|&(name, data_type)| make_input_port(Some(name), data_type))
            .collect(),
        outputs
            .iter()
            .map(|&(name, data_type)| make_output_port(Some(name), data_type))
            .collect(),
    )
    .unwrap();

    FnKind::new("make_task", Arc::new(ports), |_: &mut RunContext<'_>| Ok(()))
}
