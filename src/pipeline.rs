//! The task graph.
//!
//! A [`Pipeline`] owns every task and every port instance. Tasks live in a
//! `petgraph` arena and are addressed by [`TaskId`]; an edge runs from a
//! producer task to a consumer task and records which output feeds which
//! input. Nothing in the graph holds a reference to anything else, so the
//! graph has a single owner even though data flows between many tasks.
//!
//! The graph is kept acyclic at all times: [`Pipeline::set_input`] refuses
//! any connection that would close a cycle.

use std::any::{Any, type_name};
use std::borrow::Cow;
use std::sync::Arc;

use petgraph::Direction::{Incoming, Outgoing};
use petgraph::algo::{has_path_connecting, toposort};
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};

use crate::core::{Compatibility, Config, Dynamic, Exact};
use crate::engine::Diagnostics;
use crate::error::GraphError;
use crate::port::{Direction, InputRef, OutputRef, PortDescriptor, Ports};
use crate::task::{TaskId, TaskKind};

/// One task in the graph together with its port instances.
pub(crate) struct TaskNode {
    pub name: Cow<'static, str>,
    pub kind: Box<dyn TaskKind>,
    pub ports: Arc<Ports>,
    /// Upstream output bound to each input.
    pub inputs: Vec<Option<OutputRef>>,
    /// Cached value of each output, all present exactly when the task is fresh.
    pub outputs: Vec<Option<Dynamic>>,
    pub dirty: bool,
    /// Issued once per added task, distinguishes reuses of one graph slot.
    pub generation: u32,
}

/// The port pair a graph edge connects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Edge {
    pub output: usize,
    pub input: usize,
}

/// An incremental dataflow graph.
///
/// ```rust
/// use nagare::Pipeline;
/// use nagare::operators::{Add, Binary, Source};
///
/// let mut pipeline = Pipeline::new();
/// let two = pipeline.add_task(Source::new(2i64));
/// let three = pipeline.add_task(Source::new(3i64));
/// let sum = pipeline.add_task(Binary::<i64, Add>::new());
///
/// let port = pipeline.get_output(two, None).unwrap();
/// pipeline.set_input(sum, Some("0"), port).unwrap();
/// let port = pipeline.get_output(three, None).unwrap();
/// pipeline.set_input(sum, Some("1"), port).unwrap();
///
/// assert_eq!(*pipeline.get_output_value::<i64>(sum, None).unwrap(), 5);
/// ```
pub struct Pipeline {
    pub(crate) graph: StableGraph<TaskNode, Edge>,
    pub(crate) compat: Box<dyn Compatibility>,
    pub(crate) config: Config,
    pub(crate) diagnostics: Diagnostics,
    generation: u32,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Creates an empty pipeline that connects ports of identical types only.
    pub fn new() -> Self {
        Self {
            graph: StableGraph::new(),
            compat: Box::new(Exact),
            config: Config::default(),
            diagnostics: Diagnostics::default(),
            generation: 0,
        }
    }

    /// Replaces the predicate used to check port connections.
    pub fn with_compatibility(mut self, compat: impl Compatibility + 'static) -> Self {
        self.compat = Box::new(compat);
        self
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Adds a task of the given kind. The task starts stale.
    pub fn add_task(&mut self, kind: impl TaskKind) -> TaskId {
        let name = kind.name();
        self.add_named_task(name, kind)
    }

    /// Adds a task under a custom display name.
    pub fn add_named_task(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        kind: impl TaskKind,
    ) -> TaskId {
        let ports = kind.ports();
        let node = TaskNode {
            name: name.into(),
            kind: Box::new(kind),
            inputs: vec![None; ports.inputs().len()],
            outputs: vec![None; ports.outputs().len()],
            ports,
            dirty: true,
            generation: self.generation,
        };
        self.generation = self.generation.wrapping_add(1);

        let index = self.graph.add_node(node);
        let id = self.id_at(index);
        tracing::debug!(task = %id, name = %self.graph[id.0].name, "added task");
        id
    }

    /// Removes a task and returns its kind.
    ///
    /// Inputs that were bound to the removed task become unbound, and the
    /// tasks owning them are invalidated.
    pub fn remove_task(&mut self, task: TaskId) -> Result<Box<dyn TaskKind>, GraphError> {
        self.node(task)?;

        let consumers: Vec<(TaskId, usize)> = self
            .graph
            .edges_directed(task.0, Outgoing)
            .map(|edge| (self.id_at(edge.target()), edge.weight().input))
            .collect();

        for &(consumer, _) in &consumers {
            self.invalidate(consumer)?;
        }

        for (consumer, input) in consumers {
            self.graph[consumer.0].inputs[input] = None;
        }

        self.diagnostics.execution_times.remove(&task);

        self.graph
            .remove_node(task.0)
            .map(|node| node.kind)
            .ok_or(GraphError::UnknownTask(task))
    }

    pub fn contains(&self, task: TaskId) -> bool {
        self.node(task).is_ok()
    }

    pub(crate) fn node(&self, task: TaskId) -> Result<&TaskNode, GraphError> {
        self.graph
            .node_weight(task.0)
            .filter(|node| node.generation == task.1)
            .ok_or(GraphError::UnknownTask(task))
    }

    pub(crate) fn node_mut(&mut self, task: TaskId) -> Result<&mut TaskNode, GraphError> {
        self.graph
            .node_weight_mut(task.0)
            .filter(|node| node.generation == task.1)
            .ok_or(GraphError::UnknownTask(task))
    }

    /// The handle of the live task stored at `index`.
    fn id_at(&self, index: NodeIndex) -> TaskId {
        TaskId(index, self.graph[index].generation)
    }

    pub fn task_name(&self, task: TaskId) -> Result<&str, GraphError> {
        Ok(&self.node(task)?.name)
    }

    pub fn inputs(&self, task: TaskId) -> Result<&[PortDescriptor], GraphError> {
        Ok(self.node(task)?.ports.inputs())
    }

    pub fn outputs(&self, task: TaskId) -> Result<&[PortDescriptor], GraphError> {
        Ok(self.node(task)?.ports.outputs())
    }

    /// Borrows the kind of a task as its concrete type.
    pub fn kind<K: TaskKind>(&self, task: TaskId) -> Result<&K, GraphError> {
        let kind: &dyn Any = &*self.node(task)?.kind;
        kind.downcast_ref::<K>().ok_or(GraphError::KindMismatch {
            task,
            expected: type_name::<K>(),
        })
    }

    /// Mutates the kind of a task and invalidates it, since its outputs may
    /// no longer match what the kind would now compute.
    pub fn update<K, R>(&mut self, task: TaskId, f: impl FnOnce(&mut K) -> R) -> Result<R, GraphError>
    where
        K: TaskKind,
    {
        let kind: &mut dyn Any = &mut *self.node_mut(task)?.kind;
        let kind = kind.downcast_mut::<K>().ok_or(GraphError::KindMismatch {
            task,
            expected: type_name::<K>(),
        })?;

        let result = f(kind);
        self.invalidate(task)?;
        Ok(result)
    }

    /// Returns the named output port instance, or the sole one when `name`
    /// is `None`.
    pub fn get_output(&self, task: TaskId, name: Option<&str>) -> Result<OutputRef, GraphError> {
        let index = self.node(task)?.ports.resolve(Direction::Output, name)?;
        Ok(OutputRef { task, index })
    }

    /// Returns the named input port instance, or the sole one when `name` is
    /// `None`.
    pub fn get_input(&self, task: TaskId, name: Option<&str>) -> Result<InputRef, GraphError> {
        let index = self.node(task)?.ports.resolve(Direction::Input, name)?;
        Ok(InputRef { task, index })
    }

    /// The output currently bound to an input, if any.
    pub fn source(&self, input: InputRef) -> Result<Option<OutputRef>, GraphError> {
        let node = self.node(input.task)?;
        node.inputs
            .get(input.index)
            .copied()
            .ok_or_else(|| index_error(&node.ports, Direction::Input, input.index))
    }

    /// The inputs currently bound to an output.
    pub fn consumers(&self, output: OutputRef) -> Result<Vec<InputRef>, GraphError> {
        let node = self.node(output.task)?;
        if output.index >= node.ports.outputs().len() {
            return Err(index_error(&node.ports, Direction::Output, output.index));
        }

        Ok(self
            .graph
            .edges_directed(output.task.0, Outgoing)
            .filter(|edge| edge.weight().output == output.index)
            .map(|edge| InputRef {
                task: self.id_at(edge.target()),
                index: edge.weight().input,
            })
            .collect())
    }

    /// Binds an input of `task` to the output `port` of another task.
    ///
    /// A previously bound source is replaced. The consumer is invalidated,
    /// together with everything downstream of it. On error the graph is left
    /// untouched.
    pub fn set_input(
        &mut self,
        task: TaskId,
        name: Option<&str>,
        port: OutputRef,
    ) -> Result<(), GraphError> {
        let input = self.get_input(task, name)?;
        let producer = self.node(port.task)?;
        let emits = producer
            .ports
            .outputs()
            .get(port.index)
            .ok_or_else(|| index_error(&producer.ports, Direction::Output, port.index))?
            .data_type();

        if port.task == task {
            return Err(GraphError::SelfConnection);
        }

        let accepts = self.node(task)?.ports.inputs()[input.index].data_type();
        if !self.compat.is_compatible(emits, accepts) {
            return Err(GraphError::Incompatible {
                producer: emits,
                consumer: accepts,
            });
        }

        if has_path_connecting(&self.graph, task.0, port.task.0, None) {
            return Err(GraphError::Cycle {
                producer: port.task,
                consumer: task,
            });
        }

        self.unlink(input);
        self.graph.add_edge(
            port.task.0,
            task.0,
            Edge {
                output: port.index,
                input: input.index,
            },
        );
        self.graph[task.0].inputs[input.index] = Some(port);

        tracing::debug!(
            producer = %port.task,
            consumer = %task,
            input = input.index,
            "connected"
        );

        self.invalidate(task)
    }

    /// Unbinds an input. The task is invalidated if the input was bound.
    pub fn clear_input(&mut self, task: TaskId, name: Option<&str>) -> Result<(), GraphError> {
        let input = self.get_input(task, name)?;

        if self.unlink(input) {
            self.graph[task.0].inputs[input.index] = None;
            self.invalidate(task)?;
        }

        Ok(())
    }

    /// Removes the edge feeding `input`, returning whether there was one.
    fn unlink(&mut self, input: InputRef) -> bool {
        let edge = self
            .graph
            .edges_directed(input.task.0, Incoming)
            .find(|edge| edge.weight().input == input.index)
            .map(|edge| edge.id());

        match edge {
            Some(edge) => self.graph.remove_edge(edge).is_some(),
            None => false,
        }
    }

    /// The task owning the output bound to the named input.
    pub fn get_input_task(
        &self,
        task: TaskId,
        name: Option<&str>,
    ) -> Result<Option<TaskId>, GraphError> {
        let input = self.get_input(task, name)?;
        Ok(self.source(input)?.map(|output| output.task))
    }

    /// The tasks consuming the named output.
    pub fn get_output_tasks(
        &self,
        task: TaskId,
        name: Option<&str>,
    ) -> Result<Vec<TaskId>, GraphError> {
        let output = self.get_output(task, name)?;
        let mut tasks: Vec<TaskId> = self
            .consumers(output)?
            .into_iter()
            .map(|input| input.task)
            .collect();

        tasks.sort();
        tasks.dedup();
        Ok(tasks)
    }

    /// Distinct tasks consuming any output of `task`; empty for unknown tasks.
    pub fn downstream(&self, task: TaskId) -> Vec<TaskId> {
        if !self.contains(task) {
            return Vec::new();
        }

        dedup(
            self.graph
                .neighbors_directed(task.0, Outgoing)
                .map(|index| self.id_at(index)),
        )
    }

    /// Every task in the pipeline.
    pub fn tasks(&self) -> Vec<TaskId> {
        self.graph.node_indices().map(|index| self.id_at(index)).collect()
    }

    /// Input port instances with no source.
    pub fn unconnected_inputs(&self) -> Vec<InputRef> {
        self.graph
            .node_indices()
            .flat_map(|index| {
                let task = self.id_at(index);
                self.graph[index]
                    .inputs
                    .iter()
                    .enumerate()
                    .filter(|(_, source)| source.is_none())
                    .map(move |(input, _)| InputRef {
                        task,
                        index: input,
                    })
            })
            .collect()
    }

    /// Output port instances nothing consumes.
    pub fn unconnected_outputs(&self) -> Vec<OutputRef> {
        self.graph
            .node_indices()
            .flat_map(|index| {
                let task = self.id_at(index);
                (0..self.graph[index].outputs.len())
                    .filter(move |&output| {
                        !self
                            .graph
                            .edges_directed(index, Outgoing)
                            .any(|edge| edge.weight().output == output)
                    })
                    .map(move |output| OutputRef {
                        task,
                        index: output,
                    })
            })
            .collect()
    }

    /// Tasks with at least one unconnected input.
    pub fn input_tasks(&self) -> Vec<TaskId> {
        dedup(self.unconnected_inputs().into_iter().map(|input| input.task))
    }

    /// Tasks with at least one unconnected output.
    pub fn output_tasks(&self) -> Vec<TaskId> {
        dedup(self.unconnected_outputs().into_iter().map(|output| output.task))
    }

    /// Tasks with every port connected.
    pub fn interior(&self) -> Vec<TaskId> {
        let inputs = self.input_tasks();
        let outputs = self.output_tasks();

        self.tasks()
            .into_iter()
            .filter(|task| !inputs.contains(task) && !outputs.contains(task))
            .collect()
    }

    /// Tasks ordered so that every producer comes before its consumers.
    pub fn topological_order(&self) -> Result<Vec<TaskId>, GraphError> {
        toposort(&self.graph, None)
            .map(|order| order.into_iter().map(|index| self.id_at(index)).collect())
            .map_err(|cycle| GraphError::Cycle {
                producer: self.id_at(cycle.node_id()),
                consumer: self.id_at(cycle.node_id()),
            })
    }

    /// A multi-line text description of a task and its ports.
    pub fn describe(&self, task: TaskId) -> Result<String, GraphError> {
        let node = self.node(task)?;
        let state = if node.dirty { "stale" } else { "fresh" };

        let mut acc = format!("task {task} '{}' ({state})\n", node.name);
        for port in node.ports.inputs() {
            acc.push_str(&port.describe("  "));
        }
        for port in node.ports.outputs() {
            acc.push_str(&port.describe("  "));
        }

        Ok(acc)
    }
}

impl std::fmt::Display for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "graph LR")?;

        for index in self.graph.node_indices() {
            let name = self.graph[index].name.replace('"', "\\\"");
            writeln!(f, "    {:?}[\"{}\"]", index.index(), name)?;
        }

        for edge in IntoEdgeReferences::edge_references(&self.graph) {
            let output = &self.graph[edge.source()].ports.outputs()[edge.weight().output];
            let input = &self.graph[edge.target()].ports.inputs()[edge.weight().input];
            let label = format!("{} → {}", output.name(), input.name())
                .replace('<', "&lt;")
                .replace('>', "&gt;");

            writeln!(
                f,
                "    {:?} -- \"{}\" --> {:?}",
                edge.source().index(),
                label,
                edge.target().index()
            )?;
        }

        Ok(())
    }
}

fn index_error(ports: &Ports, direction: Direction, index: usize) -> GraphError {
    GraphError::UnknownPort {
        direction,
        name: format!("#{index} of {}", ports.list(direction).len()),
    }
}

fn dedup(tasks: impl Iterator<Item = TaskId>) -> Vec<TaskId> {
    let mut tasks: Vec<TaskId> = tasks.collect();
    tasks.sort();
    tasks.dedup();
    tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataType;
    use crate::testing::{D1, D2, S1, SimpleTask, d1, make_task, source};

    #[test]
    fn test_task_port_error() {
        let mut pipeline = Pipeline::new();
        let t = pipeline.add_task(make_task(&[("input", d1())], &[("output", d1())]));
        let u = pipeline.add_task(make_task(&[("input", d1())], &[("output", d1())]));

        assert_eq!(pipeline.get_input_task(t, Some("input")), Ok(None));
        assert!(matches!(
            pipeline.get_output(t, Some("not a port")),
            Err(GraphError::UnknownPort { direction: Direction::Output, .. })
        ));

        let port = pipeline.get_output(u, Some("output")).unwrap();
        assert!(matches!(
            pipeline.set_input(t, Some("not a port"), port),
            Err(GraphError::UnknownPort { direction: Direction::Input, .. })
        ));
        assert!(matches!(
            pipeline.get_input_task(t, Some("not a port")),
            Err(GraphError::UnknownPort { .. })
        ));
    }

    #[test]
    fn test_sole_port_shortcut() {
        let mut pipeline = Pipeline::new();
        let s = pipeline.add_task(source());
        let t = pipeline.add_task(SimpleTask::new());

        let port = pipeline.get_output(s, None).unwrap();
        pipeline.set_input(t, None, port).unwrap();

        assert_eq!(pipeline.get_input_task(t, None), Ok(Some(s)));
        assert_eq!(pipeline.get_output_tasks(s, None), Ok(vec![t]));
        assert!(matches!(
            pipeline.get_output(t, None),
            Err(GraphError::AmbiguousPort { count: 2, .. })
        ));
    }

    #[test]
    fn test_self_connection() {
        let mut pipeline = Pipeline::new();
        let t = pipeline.add_task(SimpleTask::new());

        let port = pipeline.get_output(t, Some("O1")).unwrap();
        assert_eq!(pipeline.set_input(t, None, port), Err(GraphError::SelfConnection));
        assert_eq!(pipeline.get_input_task(t, None), Ok(None));
    }

    #[test]
    fn test_cycle_rejected() {
        let mut pipeline = Pipeline::new();
        let a = pipeline.add_task(SimpleTask::new());
        let b = pipeline.add_task(SimpleTask::new());
        let c = pipeline.add_task(SimpleTask::new());

        let port = pipeline.get_output(a, Some("O1")).unwrap();
        pipeline.set_input(b, None, port).unwrap();
        let port = pipeline.get_output(b, Some("O1")).unwrap();
        pipeline.set_input(c, None, port).unwrap();

        let port = pipeline.get_output(c, Some("O2")).unwrap();
        assert_eq!(
            pipeline.set_input(a, None, port),
            Err(GraphError::Cycle {
                producer: c,
                consumer: a,
            })
        );
        assert_eq!(pipeline.get_input_task(a, None), Ok(None));
        assert_eq!(pipeline.topological_order(), Ok(vec![a, b, c]));
    }

    #[test]
    fn test_incompatible_types() {
        let mut pipeline = Pipeline::new();
        let producer = pipeline.add_task(make_task(&[], &[("out", DataType::of::<D2>())]));
        let consumer = pipeline.add_task(SimpleTask::new());

        let port = pipeline.get_output(producer, None).unwrap();
        assert!(matches!(
            pipeline.set_input(consumer, None, port),
            Err(GraphError::Incompatible { .. })
        ));
        assert!(pipeline.get_output_tasks(producer, None).unwrap().is_empty());
    }

    #[test]
    fn test_registered_subtype_connects() {
        use crate::core::TypeRegistry;

        let mut registry = TypeRegistry::new();
        registry.register::<S1, D1>();

        let mut pipeline = Pipeline::new().with_compatibility(registry);
        let producer = pipeline.add_task(make_task(&[], &[("out", DataType::of::<S1>())]));
        let consumer = pipeline.add_task(SimpleTask::new());

        let port = pipeline.get_output(producer, None).unwrap();
        assert_eq!(pipeline.set_input(consumer, None, port), Ok(()));

        let reverse = pipeline.add_task(make_task(&[("in", DataType::of::<S1>())], &[]));
        let port = pipeline.get_output(consumer, Some("O1")).unwrap();
        assert!(matches!(
            pipeline.set_input(reverse, None, port),
            Err(GraphError::Incompatible { .. })
        ));
    }

    #[test]
    fn test_rebind_moves_consumer() {
        let mut pipeline = Pipeline::new();
        let a = pipeline.add_task(source());
        let b = pipeline.add_task(source());
        let t = pipeline.add_task(SimpleTask::new());

        let port = pipeline.get_output(a, None).unwrap();
        pipeline.set_input(t, None, port).unwrap();
        let port = pipeline.get_output(b, None).unwrap();
        pipeline.set_input(t, None, port).unwrap();

        assert_eq!(pipeline.get_input_task(t, None), Ok(Some(b)));
        assert!(pipeline.get_output_tasks(a, None).unwrap().is_empty());
        assert_eq!(pipeline.get_output_tasks(b, None), Ok(vec![t]));
        assert_eq!(pipeline.graph.edge_count(), 1);

        pipeline.clear_input(t, None).unwrap();
        assert_eq!(pipeline.get_input_task(t, None), Ok(None));
        assert_eq!(pipeline.graph.edge_count(), 0);
    }

    #[test]
    fn test_queries() {
        let mut pipeline = Pipeline::new();
        let s = pipeline.add_task(source());
        let t = pipeline.add_task(SimpleTask::new());
        let u = pipeline.add_task(SimpleTask::new());
        let v = pipeline.add_task(SimpleTask::new());

        let port = pipeline.get_output(s, None).unwrap();
        pipeline.set_input(t, None, port).unwrap();
        let port = pipeline.get_output(t, Some("O1")).unwrap();
        pipeline.set_input(u, None, port).unwrap();
        let port = pipeline.get_output(t, Some("O2")).unwrap();
        pipeline.set_input(v, None, port).unwrap();
        let port = pipeline.get_output(u, Some("O1")).unwrap();
        let w = pipeline.add_task(SimpleTask::new());
        pipeline.set_input(w, None, port).unwrap();

        assert_eq!(pipeline.tasks().len(), 5);
        assert!(pipeline.input_tasks().is_empty());
        assert!(pipeline.unconnected_inputs().is_empty());
        assert_eq!(pipeline.output_tasks(), vec![u, v, w]);
        assert_eq!(pipeline.interior(), vec![s, t]);
        assert_eq!(pipeline.unconnected_outputs().len(), 5);

        let mut sorted = pipeline.get_output_tasks(t, Some("O1")).unwrap();
        sorted.extend(pipeline.get_output_tasks(t, Some("O2")).unwrap());
        assert_eq!(sorted, vec![u, v]);
    }

    #[test]
    fn test_remove_task_unbinds_consumers() {
        let mut pipeline = Pipeline::new();
        let s = pipeline.add_task(source());
        let t = pipeline.add_task(SimpleTask::new());

        let port = pipeline.get_output(s, None).unwrap();
        pipeline.set_input(t, None, port).unwrap();
        pipeline.get_output_data(t, Some("O1")).unwrap();

        let kind = pipeline.remove_task(s).unwrap();
        assert_eq!(kind.name(), "source");
        assert!(!pipeline.contains(s));
        assert_eq!(pipeline.get_input_task(t, None), Ok(None));
        assert_eq!(pipeline.is_dirty(t), Ok(true));
        assert_eq!(pipeline.remove_task(s).err(), Some(GraphError::UnknownTask(s)));
    }

    #[test]
    fn test_removed_handle_not_reused() {
        let mut pipeline = Pipeline::new();
        let s = pipeline.add_task(source());
        let t = pipeline.add_task(SimpleTask::new());
        let port = pipeline.get_output(s, None).unwrap();
        pipeline.set_input(t, None, port).unwrap();
        pipeline.get_output_data(t, Some("O1")).unwrap();
        assert_eq!(pipeline.diagnostics().runs(t), 1);

        pipeline.remove_task(t).unwrap();
        assert_eq!(pipeline.diagnostics().runs(t), 0);

        let fresh = pipeline.add_named_task("brand-new", SimpleTask::new());
        assert_eq!(fresh.index(), t.index());
        assert_ne!(fresh, t);

        assert!(!pipeline.contains(t));
        assert!(pipeline.contains(fresh));
        assert_eq!(pipeline.task_name(t), Err(GraphError::UnknownTask(t)));
        assert_eq!(pipeline.task_name(fresh), Ok("brand-new"));
        assert_eq!(pipeline.diagnostics().runs(fresh), 0);
        assert!(pipeline.invalidate(t).is_err());
        assert!(pipeline.downstream(t).is_empty());
        assert_eq!(
            pipeline.set_input(t, None, port),
            Err(GraphError::UnknownTask(t))
        );
        assert_eq!(pipeline.tasks(), vec![s, fresh]);

        pipeline.set_input(fresh, None, port).unwrap();
        assert_eq!(pipeline.get_output_tasks(s, None), Ok(vec![fresh]));
    }

    #[test]
    fn test_kind_access() {
        let mut pipeline = Pipeline::new();
        let t = pipeline.add_task(SimpleTask::new());

        assert_eq!(pipeline.kind::<SimpleTask>(t).unwrap().count, 0);
        assert!(matches!(
            pipeline.kind::<crate::operators::Source<D2>>(t),
            Err(GraphError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_describe_and_render() {
        let mut pipeline = Pipeline::new();
        let s = pipeline.add_task(source());
        let t = pipeline.add_named_task("simple", SimpleTask::new());
        let port = pipeline.get_output(s, None).unwrap();
        pipeline.set_input(t, None, port).unwrap();

        let text = pipeline.describe(t).unwrap();
        assert!(text.starts_with(&format!("task {t} 'simple' (stale)\n")));
        assert!(text.contains("  output port 'O2'"));

        let graph = pipeline.to_string();
        assert!(graph.starts_with("graph LR\n"));
        assert!(graph.contains("[\"simple\"]"));
        assert!(graph.contains(&format!("{} -- \" → \" --> {}", s.index().index(), t.index().index())));
    }

    #[test]
    fn test_inputs_outputs_tables() {
        let mut pipeline = Pipeline::new();
        let t = pipeline.add_task(SimpleTask::new());

        let names: Vec<&str> = pipeline.outputs(t).unwrap().iter().map(PortDescriptor::name).collect();
        assert_eq!(names, vec!["O1", "O2"]);
        assert_eq!(pipeline.inputs(t).unwrap().len(), 1);
    }
}
