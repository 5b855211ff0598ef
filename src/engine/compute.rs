use std::any::type_name;
use std::sync::Arc;
use std::time::Instant;

use tracing::Level;

use crate::Pipeline;
use crate::core::Dynamic;
use crate::error::{EngineError, RunError};
use crate::task::{RunContext, TaskId};

impl Pipeline {
    /// Reads an output, recomputing whatever is stale on the way.
    ///
    /// When the task is fresh the cached value is returned as is. Otherwise
    /// every bound upstream producer is refreshed first, depth first, and
    /// then the task runs exactly once. Unbound inputs are left for the run
    /// itself to reject.
    pub fn get_output_data(
        &mut self,
        task: TaskId,
        name: Option<&str>,
    ) -> Result<Dynamic, EngineError> {
        let output = self.get_output(task, name)?;
        self.refresh(task, 0)?;

        let node = self.node(task)?;
        node.outputs[output.index]
            .clone()
            .ok_or_else(|| EngineError::Run {
                task: node.name.to_string(),
                source: RunError::MissingOutputs {
                    ports: vec![node.ports.outputs()[output.index].name().to_string()],
                },
            })
    }

    /// Reads an output as a concrete type.
    pub fn get_output_value<T: Send + Sync + 'static>(
        &mut self,
        task: TaskId,
        name: Option<&str>,
    ) -> Result<Arc<T>, EngineError> {
        let output = self.get_output(task, name)?;

        self.get_output_data(task, name)?
            .downcast::<T>()
            .map_err(|_| EngineError::Downcast {
                port: self.graph[task.0].ports.outputs()[output.index]
                    .name()
                    .to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Recomputes a task unconditionally.
    ///
    /// Stale producers upstream are refreshed first. Everything downstream is
    /// invalidated, because the new outputs replace the ones it was computed
    /// from.
    pub fn run(&mut self, task: TaskId) -> Result<(), EngineError> {
        self.invalidate(task)?;
        self.refresh(task, 0)
    }

    /// Brings a task up to date by pulling from its producers.
    fn refresh(&mut self, task: TaskId, depth: usize) -> Result<(), EngineError> {
        let node = self.node(task)?;
        if !node.dirty {
            return Ok(());
        }

        if depth > self.config.max_depth {
            return Err(EngineError::DepthExceeded {
                task: node.name.to_string(),
                limit: self.config.max_depth,
            });
        }

        let producers: Vec<TaskId> = node
            .inputs
            .iter()
            .flatten()
            .map(|output| output.task)
            .collect();

        for producer in producers {
            self.refresh(producer, depth + 1)?;
        }

        self.execute(task)
    }

    /// Runs a task whose producers are all fresh, and caches its outputs.
    fn execute(&mut self, task: TaskId) -> Result<(), EngineError> {
        let node = self.node(task)?;

        let inputs: Vec<Option<Dynamic>> = node
            .inputs
            .iter()
            .map(|source| {
                source.and_then(|output| self.graph[output.task.0].outputs[output.index].clone())
            })
            .collect();

        let unmet = node
            .ports
            .inputs()
            .iter()
            .zip(&inputs)
            .find(|(port, value)| port.is_required() && value.is_none());

        if let Some((port, _)) = unmet {
            return Err(EngineError::Run {
                task: node.name.to_string(),
                source: RunError::UnmetDependency {
                    port: port.name().to_string(),
                },
            });
        }

        let span = tracing::span!(Level::INFO, "task", name = %node.name);
        let _enter = span.enter();

        let start = Instant::now();
        let compat = self.compat.as_ref();
        let node = &mut self.graph[task.0];
        let ports = node.ports.clone();

        let mut ctx = RunContext::new(&ports, inputs, compat);
        let result = node.kind.run(&mut ctx);
        let outputs = ctx.into_outputs();
        let duration = start.elapsed();

        let result = result.map_err(|err| match err.downcast::<RunError>() {
            Ok(err) => err,
            Err(err) => RunError::Task(err),
        });

        let result = result.and_then(|()| {
            let missing: Vec<String> = ports
                .outputs()
                .iter()
                .zip(&outputs)
                .filter(|(_, value)| value.is_none())
                .map(|(port, _)| port.name().to_string())
                .collect();

            if missing.is_empty() {
                Ok(())
            } else {
                Err(RunError::MissingOutputs { ports: missing })
            }
        });

        if let Err(source) = result {
            tracing::warn!(error = %source, "run failed");
            return Err(EngineError::Run {
                task: node.name.to_string(),
                source,
            });
        }

        node.outputs = outputs;
        node.dirty = false;

        if self.config.diagnostics {
            self.diagnostics.record(task, start, duration);
        }

        tracing::info!(?duration, "run complete");
        Ok(())
    }
}
