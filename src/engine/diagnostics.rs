use std::collections::HashMap;
use std::fmt::Write;
use std::time::{Duration, Instant};

use crate::Pipeline;
use crate::task::TaskId;

/// Execution record of one task.
#[derive(Debug, Clone)]
pub struct TaskExecution {
    /// How many times the task has run successfully.
    pub runs: usize,
    /// When the latest successful run started.
    pub start: Instant,
    /// How long the latest successful run took.
    pub duration: Duration,
}

/// Run counts and timings collected while a pipeline computes.
///
/// Only successful runs are recorded. Recording can be switched off through
/// [`Config::diagnostics`](crate::Config::diagnostics).
#[derive(Debug, Default)]
pub struct Diagnostics {
    /// A map of tasks to their execution metrics.
    pub execution_times: HashMap<TaskId, TaskExecution>,
}

impl Diagnostics {
    pub(crate) fn record(&mut self, task: TaskId, start: Instant, duration: Duration) {
        self.execution_times
            .entry(task)
            .and_modify(|exec| {
                exec.runs += 1;
                exec.start = start;
                exec.duration = duration;
            })
            .or_insert(TaskExecution {
                runs: 1,
                start,
                duration,
            });
    }

    /// How many times a task has run; zero for tasks that never ran.
    pub fn runs(&self, task: TaskId) -> usize {
        self.execution_times
            .get(&task)
            .map(|exec| exec.runs)
            .unwrap_or(0)
    }

    /// Total number of runs across every task.
    pub fn total_runs(&self) -> usize {
        self.execution_times.values().map(|exec| exec.runs).sum()
    }

    /// Renders the pipeline as a Mermaid diagram, color-coded by the duration
    /// of each task's latest run.
    ///
    /// * **Green**: Fast
    /// * **Yellow**: Moderate
    /// * **Red**: Slow
    /// * **Blue**: Never ran
    pub fn render_mermaid(&self, pipeline: &Pipeline) -> String {
        let mut f = String::new();
        writeln!(f, "graph LR").unwrap();

        let times = &self.execution_times;
        let mut min_time = f64::MAX;
        let mut max_time = f64::MIN;

        for t in times.values() {
            let secs = t.duration.as_secs_f64();
            min_time = min_time.min(secs);
            max_time = max_time.max(secs);
        }

        if min_time > max_time {
            // No tasks ran
            min_time = 0.0;
            max_time = 0.0;
        }

        // Avoid divide by zero if all tasks took same time
        if (max_time - min_time).abs() < f64::EPSILON {
            max_time = min_time + 1.0;
        }

        for task in pipeline.tasks() {
            let name = pipeline
                .task_name(task)
                .unwrap_or_default()
                .replace('"', "\\\"");
            let index = task.index().index();

            let (label_extra, color_code) = match times.get(&task) {
                Some(exec) => {
                    let t = (exec.duration.as_secs_f64() - min_time) / (max_time - min_time);

                    // 0.0 (Green) -> 0.5 (Yellow) -> 1.0 (Red)
                    let (r, g) = if t < 0.5 {
                        ((255.0 * t * 2.0) as u8, 255)
                    } else {
                        (255, (255.0 * (1.0 - (t - 0.5) * 2.0)) as u8)
                    };

                    (
                        format!("{:.2?} ×{}", exec.duration, exec.runs),
                        format!("#{r:02X}{g:02X}00"),
                    )
                }
                None => ("Never ran".to_string(), "#ADD8E6".to_string()),
            };

            writeln!(f, "    {index}[\"{name}\\n{label_extra}\"]").unwrap();
            writeln!(f, "    style {index} fill:{color_code}").unwrap();
        }

        for task in pipeline.tasks() {
            for consumer in pipeline.downstream(task) {
                writeln!(f, "    {} --> {}", task.index().index(), consumer.index().index()).unwrap();
            }
        }

        f
    }
}
