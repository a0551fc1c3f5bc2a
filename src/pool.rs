// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! A bounded pool of worker threads with a pending-task barrier.
//!
//! Tasks are closures pushed onto a FIFO queue; a fixed set of OS threads
//! drains it. The pool tracks *outstanding* tasks (submitted but not yet
//! finished) in a separate counter, so [`WorkQueue::barrier`] only returns
//! when all work, including tasks submitted by other tasks, has actually
//! completed. An empty queue is not the same as done: the crawler enqueues
//! from inside its own tasks and relies on the distinction.
//!
//! A panicking task is logged and swallowed; the counter decrement lives in
//! a drop guard so the barrier cannot hang on a failed task, and the worker
//! thread survives to run the next one.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use tracing::{debug, warn};

type Job = Box<dyn FnOnce() + Send + 'static>;

struct QueueState {
    tasks: VecDeque<Job>,
    shutdown: bool,
}

struct Inner {
    queue: Mutex<QueueState>,
    work_available: Condvar,
    pending: Mutex<usize>,
    all_idle: Condvar,
}

pub struct WorkQueue {
    inner: Arc<Inner>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    size: usize,
}

impl WorkQueue {
    /// Spawn a pool of `threads` workers. Panics if `threads` is zero; the
    /// configuration layer clamps user input before it gets here.
    pub fn new(threads: usize) -> Self {
        assert!(threads >= 1, "worker pool needs at least one thread");

        let inner = Arc::new(Inner {
            queue: Mutex::new(QueueState {
                tasks: VecDeque::new(),
                shutdown: false,
            }),
            work_available: Condvar::new(),
            pending: Mutex::new(0),
            all_idle: Condvar::new(),
        });

        let workers = (0..threads)
            .map(|i| {
                let inner = Arc::clone(&inner);
                std::thread::Builder::new()
                    .name(format!("worker-{i}"))
                    .spawn(move || worker_loop(&inner))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        WorkQueue {
            inner,
            workers: Mutex::new(workers),
            size: threads,
        }
    }

    /// Enqueue a task. FIFO; never blocks beyond the queue's own mutex.
    ///
    /// After [`shutdown`](WorkQueue::shutdown) the task is dropped with a
    /// warning instead of being queued.
    pub fn submit(&self, task: impl FnOnce() + Send + 'static) {
        let mut queue = self.inner.queue.lock().expect("task queue poisoned");
        if queue.shutdown {
            warn!("task submitted after shutdown; dropping it");
            return;
        }
        *self.inner.pending.lock().expect("pending counter poisoned") += 1;
        queue.tasks.push_back(Box::new(task));
        self.inner.work_available.notify_one();
    }

    /// Block until the outstanding-task count reaches zero.
    ///
    /// The pool stays usable afterwards; this is the fan-in point for both
    /// builders and the crawler.
    pub fn barrier(&self) {
        let mut pending = self.inner.pending.lock().expect("pending counter poisoned");
        while *pending > 0 {
            pending = self
                .inner
                .all_idle
                .wait(pending)
                .expect("pending counter poisoned");
        }
    }

    /// Stop accepting work. Workers drain whatever is already queued and
    /// then exit.
    pub fn shutdown(&self) {
        let mut queue = self.inner.queue.lock().expect("task queue poisoned");
        queue.shutdown = true;
        self.inner.work_available.notify_all();
    }

    /// Wait for all outstanding work, then shut down and reap the workers.
    pub fn join(&self) {
        self.barrier();
        self.shutdown();
        let handles: Vec<_> = {
            let mut workers = self.workers.lock().expect("worker list poisoned");
            workers.drain(..).collect()
        };
        for handle in handles {
            if handle.join().is_err() {
                warn!("worker thread exited by panic");
            }
        }
        debug!("work queue joined");
    }

    /// The number of worker threads in the pool.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

fn worker_loop(inner: &Inner) {
    loop {
        let job = {
            let mut queue = inner.queue.lock().expect("task queue poisoned");
            loop {
                if let Some(job) = queue.tasks.pop_front() {
                    break job;
                }
                if queue.shutdown {
                    return;
                }
                queue = inner
                    .work_available
                    .wait(queue)
                    .expect("task queue poisoned");
            }
        };

        // The guard decrements the counter on every exit path, so a panic
        // inside the job still wakes the barrier.
        let _guard = PendingGuard { inner };
        if catch_unwind(AssertUnwindSafe(job)).is_err() {
            warn!("task panicked; worker continues");
        }
    }
}

struct PendingGuard<'a> {
    inner: &'a Inner,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut pending = self
            .inner
            .pending
            .lock()
            .expect("pending counter poisoned");
        *pending -= 1;
        if *pending == 0 {
            self.inner.all_idle.notify_all();
        }
    }
}
