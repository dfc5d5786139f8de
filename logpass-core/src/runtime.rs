//! A single dedicated OS thread draining a queue of boxed closures, run
//! one at a time in submission order. The database orchestrator owns
//! one for its background flush/compaction task; `logpass-node` owns
//! another as its transaction submission entry point.

use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

type Task = Box<dyn FnOnce() + Send + 'static>;

pub struct Worker {
    sender: Option<Sender<Task>>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn spawn(name: impl Into<String>) -> Self {
        let (sender, receiver) = mpsc::channel::<Task>();
        let handle = std::thread::Builder::new()
            .name(name.into())
            .spawn(move || {
                while let Ok(task) = receiver.recv() {
                    task();
                }
            })
            .expect("failed to spawn worker thread");
        Worker { sender: Some(sender), handle: Some(handle) }
    }

    /// Enqueues `task` to run after every previously submitted task.
    /// Silently dropped if the worker is already shutting down.
    pub fn submit(&self, task: impl FnOnce() + Send + 'static) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(Box::new(task));
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // Dropping the sender closes the channel, so the thread's recv()
        // loop ends once every already-queued task has run.
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc::channel;
    use std::sync::Arc;

    #[test]
    fn runs_tasks_serially_in_order() {
        let worker = Worker::spawn("test-worker");
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        for i in 0..10 {
            let seen = seen.clone();
            worker.submit(move || seen.lock().unwrap().push(i));
        }
        drop(worker);
        assert_eq!(*seen.lock().unwrap(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn drop_waits_for_queued_tasks() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let worker = Worker::spawn("test-worker");
            for _ in 0..100 {
                let counter = counter.clone();
                worker.submit(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }
        }
        assert_eq!(counter.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn completion_channel_signals_after_task_runs() {
        let worker = Worker::spawn("test-worker");
        let (tx, rx) = channel::<()>();
        worker.submit(move || {
            let _ = tx.send(());
        });
        rx.recv().unwrap();
    }
}
