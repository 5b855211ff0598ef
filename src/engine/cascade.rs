use petgraph::Direction::Outgoing;

use crate::Pipeline;
use crate::error::GraphError;
use crate::task::TaskId;

impl Pipeline {
    /// Marks a task stale, along with every task downstream of it.
    ///
    /// Cached outputs of each affected task are dropped. The traversal stops
    /// at tasks that are already stale, since everything below a stale task
    /// is stale as well. Invalidation never runs anything; recomputation
    /// happens lazily on the next read.
    pub fn invalidate(&mut self, task: TaskId) -> Result<(), GraphError> {
        self.node(task)?;

        let mut stack = vec![task.0];
        let mut marked = 0usize;

        while let Some(index) = stack.pop() {
            let node = &mut self.graph[index];

            if node.dirty && index != task.0 {
                continue;
            }

            if !node.dirty {
                marked += 1;
            }

            node.dirty = true;
            node.outputs.iter_mut().for_each(|output| *output = None);

            stack.extend(self.graph.neighbors_directed(index, Outgoing));
        }

        tracing::debug!(task = %task, marked, "invalidated");
        Ok(())
    }

    /// Whether a task must recompute before its outputs can be read.
    pub fn is_dirty(&self, task: TaskId) -> Result<bool, GraphError> {
        Ok(self.node(task)?.dirty)
    }
}

#[cfg(test)]
mod tests {
    use crate::Pipeline;
    use crate::testing::{SimpleTask, source};

    #[test]
    fn test_cascade_reaches_unread_tasks() {
        let mut pipeline = Pipeline::new();
        let s = pipeline.add_task(source());
        let a = pipeline.add_task(SimpleTask::new());
        let b = pipeline.add_task(SimpleTask::new());
        let c = pipeline.add_task(SimpleTask::new());

        let port = pipeline.get_output(s, None).unwrap();
        pipeline.set_input(a, None, port).unwrap();
        let port = pipeline.get_output(a, Some("O1")).unwrap();
        pipeline.set_input(b, None, port).unwrap();
        let port = pipeline.get_output(b, Some("O2")).unwrap();
        pipeline.set_input(c, None, port).unwrap();

        pipeline.get_output_data(b, Some("O1")).unwrap();
        assert_eq!(pipeline.is_dirty(a), Ok(false));
        assert_eq!(pipeline.is_dirty(b), Ok(false));
        assert_eq!(pipeline.is_dirty(c), Ok(true));

        pipeline.invalidate(a).unwrap();
        for task in [a, b, c] {
            assert_eq!(pipeline.is_dirty(task), Ok(true));
        }
        assert_eq!(pipeline.is_dirty(s), Ok(false));
    }

    #[test]
    fn test_invalidation_drops_cache() {
        let mut pipeline = Pipeline::new();
        let s = pipeline.add_task(source());
        let a = pipeline.add_task(SimpleTask::new());
        let port = pipeline.get_output(s, None).unwrap();
        pipeline.set_input(a, None, port).unwrap();

        pipeline.get_output_data(a, Some("O1")).unwrap();
        assert!(pipeline.graph[a.0].outputs.iter().all(Option::is_some));

        pipeline.invalidate(s).unwrap();
        assert!(pipeline.graph[a.0].outputs.iter().all(Option::is_none));
        assert!(pipeline.graph[s.0].outputs.iter().all(Option::is_none));
    }

    #[test]
    fn test_invalidate_unknown_task() {
        let mut pipeline = Pipeline::new();
        let t = pipeline.add_task(SimpleTask::new());
        pipeline.remove_task(t).unwrap();

        assert!(pipeline.invalidate(t).is_err());
        assert!(pipeline.is_dirty(t).is_err());
    }
}
