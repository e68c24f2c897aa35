use crate::errors::{Error, Result};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

/// Fixed-size pool of worker threads, joining all of them on drop.
///
/// Jobs go through a single shared channel, so they start in submission order.
pub struct ThreadPool {
    workers: Vec<Worker>,
    sender: Option<mpsc::Sender<Job>>,
}

impl ThreadPool {
    /// Create a new ThreadPool with `size` threads. A size of 0 is bumped to 1.
    pub fn new(size: usize) -> ThreadPool {
        let size = size.max(1);

        let (sender, receiver) = mpsc::channel();
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..size)
            .map(|id| Worker::new(id, Arc::clone(&receiver)))
            .collect();

        ThreadPool {
            workers,
            sender: Some(sender),
        }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queue a task to run on the threadpool when a worker is available.
    ///
    /// Fails only if every worker is gone.
    pub fn execute<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| Error::ThreadPool("shutting down"))?;
        sender
            .send(Box::new(f))
            .map_err(|_| Error::ThreadPool("no worker left"))
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        drop(self.sender.take());
        for worker in &mut self.workers {
            if let Some(thread) = worker.handle.take() {
                if thread.join().is_err() {
                    tracing::error!(worker = worker.id, "Worker panicked");
                }
            }
        }
    }
}

/// Type of jobs to be executed by the threadpool.
type Job = Box<dyn FnOnce() + Send + 'static>;

/// Worker struct, holding a thread handle.
struct Worker {
    id: usize,
    handle: Option<thread::JoinHandle<()>>,
}

impl Worker {
    /// Create a new worker that will execute jobs from the given receiver until this one is
    /// closed.
    fn new(id: usize, receiver: Arc<Mutex<mpsc::Receiver<Job>>>) -> Worker {
        let handle = thread::spawn(move || loop {
            // A poisoned lock only means another worker panicked while waiting, the receiver
            // itself is still fine
            let message = match receiver.lock() {
                Ok(guard) => guard.recv(),
                Err(poisoned) => poisoned.into_inner().recv(),
            };
            match message {
                Ok(job) => job(),
                Err(_) => {
                    tracing::debug!(worker = id, "Worker stopping");
                    break;
                }
            }
        });
        Worker {
            id,
            handle: Some(handle),
        }
    }
}
