// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! A multi-reader, single-writer lock with writer preference.
//!
//! [`MultiReaderLock`] owns its protected value and hands out RAII guards:
//! any number of [`ReadGuard`]s may be live at once, a [`WriteGuard`] is
//! exclusive against both readers and other writers. Once a writer is
//! waiting, new readers block until it has run, so a continuous stream of
//! readers cannot starve index merges.
//!
//! The lock is not reentrant. A thread that already holds a guard and
//! acquires again on the same lock deadlocks; the index code avoids this by
//! having its public locking methods delegate to non-locking internals.

use std::cell::UnsafeCell;
use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex};

#[derive(Default)]
struct LockState {
    readers: usize,
    writer: bool,
    writers_waiting: usize,
}

pub struct MultiReaderLock<T> {
    state: Mutex<LockState>,
    readers_cv: Condvar,
    writers_cv: Condvar,
    value: UnsafeCell<T>,
}

// Readers share &T and a writer gets &mut T, which is exactly the standard
// library's RwLock bound set.
unsafe impl<T: Send> Send for MultiReaderLock<T> {}
unsafe impl<T: Send + Sync> Sync for MultiReaderLock<T> {}

impl<T> MultiReaderLock<T> {
    pub fn new(value: T) -> Self {
        MultiReaderLock {
            state: Mutex::new(LockState::default()),
            readers_cv: Condvar::new(),
            writers_cv: Condvar::new(),
            value: UnsafeCell::new(value),
        }
    }

    /// Acquire the shared read side, blocking while a writer holds the lock
    /// or is waiting for it.
    pub fn read(&self) -> ReadGuard<'_, T> {
        let mut state = self.state.lock().expect("lock state poisoned");
        while state.writer || state.writers_waiting > 0 {
            state = self
                .readers_cv
                .wait(state)
                .expect("lock state poisoned");
        }
        state.readers += 1;
        ReadGuard { lock: self }
    }

    /// Acquire the exclusive write side, blocking until all readers and any
    /// current writer have released.
    pub fn write(&self) -> WriteGuard<'_, T> {
        let mut state = self.state.lock().expect("lock state poisoned");
        state.writers_waiting += 1;
        while state.writer || state.readers > 0 {
            state = self
                .writers_cv
                .wait(state)
                .expect("lock state poisoned");
        }
        state.writers_waiting -= 1;
        state.writer = true;
        WriteGuard { lock: self }
    }

    /// Consume the lock and return the protected value.
    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }
}

impl<T: Default> Default for MultiReaderLock<T> {
    fn default() -> Self {
        MultiReaderLock::new(T::default())
    }
}

/// Shared access to the protected value; released on drop.
pub struct ReadGuard<'a, T> {
    lock: &'a MultiReaderLock<T>,
}

impl<T> Deref for ReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Safe: the state machine guarantees no writer while readers > 0.
        unsafe { &*self.lock.value.get() }
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        let mut state = self.lock.state.lock().expect("lock state poisoned");
        state.readers -= 1;
        if state.readers == 0 {
            self.lock.writers_cv.notify_one();
        }
    }
}

/// Exclusive access to the protected value; released on drop.
pub struct WriteGuard<'a, T> {
    lock: &'a MultiReaderLock<T>,
}

impl<T> Deref for WriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Safe: the state machine guarantees exclusivity while writer is set.
        unsafe { &*self.lock.value.get() }
    }
}

impl<T> DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // Safe: same exclusivity argument as Deref.
        unsafe { &mut *self.lock.value.get() }
    }
}

impl<T> Drop for WriteGuard<'_, T> {
    fn drop(&mut self) {
        let mut state = self.lock.state.lock().expect("lock state poisoned");
        state.writer = false;
        if state.writers_waiting > 0 {
            self.lock.writers_cv.notify_one();
        } else {
            self.lock.readers_cv.notify_all();
        }
    }
}
