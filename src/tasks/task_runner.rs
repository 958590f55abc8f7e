use std::future::Future;
use std::pin::Pin;

use tokio::task::JoinHandle;
use tracing::{debug, info};

type Task = Pin<Box<dyn Future<Output = ()> + Send>>;

pub struct TaskRunner {
    tasks: Vec<(&'static str, Task)>,
}

impl TaskRunner {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    pub fn add_task<F>(&mut self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.push((name, Box::pin(task)));
    }

    pub fn start_all(self) -> Vec<JoinHandle<()>> {
        self.tasks
            .into_iter()
            .map(|(name, task)| {
                info!(task = name, "Starting task");
                tokio::spawn(async move {
                    task.await;
                    debug!(task = name, "Task finished");
                })
            })
            .collect()
    }
}

impl Default for TaskRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn start_all_spawns_every_task() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut runner = TaskRunner::new();
        for name in ["a", "b"] {
            let counter = counter.clone();
            runner.add_task(name, async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        for handle in runner.start_all() {
            handle.await.unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
