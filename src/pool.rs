use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::CookieError;

/// One scan task: a chunk of the file plus a slot for its outcome.
#[derive(Debug)]
pub struct Task<T> {
    index: usize,
    offset: u64,
    len: u64,
    outcome: Mutex<Option<Result<T, CookieError>>>,
}

impl<T> Task<T> {
    fn new(index: usize, offset: u64, len: u64) -> Self {
        Self {
            index,
            offset,
            len,
            outcome: Mutex::new(None),
        }
    }

    /// Submission order of the task.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Nominal length of the chunk; the last one may be shorter than the chunk size.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn run<F>(&self, job: &F)
    where
        F: Fn(&Task<T>) -> Result<T, CookieError>,
    {
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| job(self))).unwrap_or_else(|payload| {
                Err(CookieError::TaskPanicked {
                    offset: self.offset,
                    message: panic_message(payload.as_ref()),
                })
            });
        *self.outcome.lock() = Some(outcome);
    }
}

/// Scan tasks in submission order.
#[derive(Debug)]
pub struct Tasks<T> {
    tasks: Vec<Task<T>>,
}

impl<T> Tasks<T> {
    /// Split `[0, size)` into consecutive chunks of `chunk_size` bytes.
    pub fn partition(size: u64, chunk_size: u64) -> Self {
        let chunk_size = chunk_size.max(1);
        let mut tasks = Vec::new();
        let mut start = 0;
        while start < size {
            let len = chunk_size.min(size - start);
            tasks.push(Task::new(tasks.len(), start, len));
            start += len;
        }
        Self { tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task<T>> {
        self.tasks.iter()
    }

    /// Outcomes in submission order. Call after [`WorkerPool::run`] returned.
    pub fn into_outcomes(self) -> Vec<Result<T, CookieError>> {
        self.tasks
            .into_iter()
            .map(|task| {
                task.outcome.into_inner().unwrap_or_else(|| {
                    Err(CookieError::TaskPanicked {
                        offset: task.offset,
                        message: "task never ran".to_string(),
                    })
                })
            })
            .collect()
    }
}

/// Fixed set of worker threads pulling tasks from a shared FIFO queue.
pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Result<Self, CookieError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("cookie-scan-{i}"))
            .build()?;
        Ok(Self { pool })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `job` once per task and block until every task has finished.
    ///
    /// A failing or panicking task only fills its own outcome slot; the
    /// remaining tasks still run.
    pub fn run<T, F>(&self, tasks: &Tasks<T>, job: F)
    where
        T: Send,
        F: Fn(&Task<T>) -> Result<T, CookieError> + Sync,
    {
        let job = &job;
        self.pool.scope_fifo(|scope| {
            for task in tasks.iter() {
                scope.spawn_fifo(move |_| task.run(job));
            }
        });
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn partition_covers_file_with_short_tail() {
        let tasks = Tasks::<()>::partition(10, 4);
        let ranges: Vec<_> = tasks.iter().map(|t| (t.index(), t.offset(), t.len())).collect();
        assert_eq!(ranges, [(0, 0, 4), (1, 4, 4), (2, 8, 2)]);
    }

    #[test]
    fn partition_of_empty_file_has_no_tasks() {
        assert!(Tasks::<()>::partition(0, 4).is_empty());
        assert_eq!(Tasks::<()>::partition(3, 100).len(), 1);
        assert_eq!(Tasks::<()>::partition(5, 1).len(), 5);
    }

    #[test]
    fn runs_every_task_and_keeps_submission_order() {
        let pool = WorkerPool::new(3).unwrap();
        assert_eq!(pool.workers(), 3);
        let tasks = Tasks::partition(100, 10);
        pool.run(&tasks, |task| Ok(task.offset() * 2));
        let outcomes: Vec<u64> = tasks.into_outcomes().into_iter().map(Result::unwrap).collect();
        assert_eq!(outcomes, (0..10).map(|i| i * 20).collect::<Vec<_>>());
    }

    #[test]
    fn failures_do_not_cancel_siblings() {
        let pool = WorkerPool::new(2).unwrap();
        let tasks = Tasks::partition(8, 1);
        let ran = AtomicUsize::new(0);
        pool.run(&tasks, |task| {
            ran.fetch_add(1, Ordering::SeqCst);
            if task.index() % 3 == 1 {
                return Err(CookieError::Config(format!("task {}", task.index())));
            }
            Ok(())
        });
        assert_eq!(ran.load(Ordering::SeqCst), 8);

        let failed: Vec<String> = tasks
            .into_outcomes()
            .into_iter()
            .filter_map(Result::err)
            .map(|err| err.to_string())
            .collect();
        assert_eq!(failed.len(), 3);
        assert!(failed[0].ends_with("task 1"));
        assert!(failed[1].ends_with("task 4"));
        assert!(failed[2].ends_with("task 7"));
    }

    #[test]
    fn panics_become_task_failures() {
        let pool = WorkerPool::new(2).unwrap();
        let tasks = Tasks::partition(4, 1);
        pool.run(&tasks, |task| {
            if task.index() == 2 {
                panic!("chunk exploded");
            }
            Ok(task.index())
        });
        let outcomes = tasks.into_outcomes();
        assert_eq!(outcomes.len(), 4);
        match &outcomes[2] {
            Err(CookieError::TaskPanicked { offset, message }) => {
                assert_eq!(*offset, 2);
                assert_eq!(message, "chunk exploded");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(outcomes[3], Ok(3)));
    }

    #[test]
    fn never_exceeds_worker_count() {
        let pool = WorkerPool::new(2).unwrap();
        let tasks = Tasks::partition(12, 1);
        let active = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        pool.run(&tasks, |_| {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
            active.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        });
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn single_worker_runs_tasks_in_order() {
        let pool = WorkerPool::new(1).unwrap();
        let tasks = Tasks::partition(6, 1);
        let order = Mutex::new(Vec::new());
        pool.run(&tasks, |task| {
            order.lock().push(task.index());
            Ok(())
        });
        assert_eq!(order.into_inner(), [0, 1, 2, 3, 4, 5]);
    }
}
