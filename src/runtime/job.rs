/*!
 * Job Records and the Worker Deque
 * Three-state jobs linked through a sentinel-head doubly-linked list
 *
 * A job lives in its `join` caller's stack frame and moves through three
 * states: pending (constructed, handler not yet runnable), queued (linked
 * into the owner's deque, `prev` non-null), executing (unlinked, claimed by
 * the owner or a thief; `prev` null). The execution state - completion
 * event plus result slot - also lives in the caller's frame, so claiming a
 * job transfers no ownership of heap memory.
 */

use parking_lot::{Condvar, Mutex};
use std::cell::UnsafeCell;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::time::Duration;

/// One-shot completion event
pub struct Event {
    done: Mutex<bool>,
    cv: Condvar,
}

impl Event {
    #[must_use]
    pub fn new() -> Self {
        Self {
            done: Mutex::new(false),
            cv: Condvar::new(),
        }
    }

    pub fn set(&self) {
        let mut done = self.done.lock();
        *done = true;
        self.cv.notify_all();
    }

    pub fn wait(&self) {
        let mut done = self.done.lock();
        while !*done {
            self.cv.wait(&mut done);
        }
    }

    /// Returns false on timeout
    pub fn wait_timeout(&self, dur: Duration) -> bool {
        let mut done = self.done.lock();
        if *done {
            return true;
        }
        self.cv.wait_for(&mut done, dur);
        *done
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

/// Handler invoked by whichever thread claims the job
pub type JobHandler = unsafe fn(*mut Job);

/// Intrusive deque node; `handler` null-equivalent (None) means pending,
/// `prev` null means the job left the queue (executing)
pub struct Job {
    handler: Option<JobHandler>,
    prev: *mut Job,
    next: *mut Job,
}

impl Job {
    #[must_use]
    pub fn new(handler: JobHandler) -> Self {
        Self {
            handler: Some(handler),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }

    /// Run the job's handler. Caller must hold the unique execution claim.
    ///
    /// # Safety
    /// `this` must point to a live job embedded in a live execution frame,
    /// and no other thread may hold the claim.
    pub unsafe fn execute(this: *mut Job) {
        let handler = (*this).handler.take().expect("job executed twice");
        handler(this);
    }
}

/// Sentinel-head doubly-linked deque of queued jobs.
///
/// The sentinel removes every null check from the link/unlink paths: an
/// empty deque is the sentinel pointing at itself.
pub struct JobQueue {
    sentinel: *mut Job,
    len: usize,
}

// Raw job pointers are only dereferenced under the owning worker's lock
unsafe impl Send for JobQueue {}

impl JobQueue {
    #[must_use]
    pub fn new() -> Self {
        let sentinel = Box::into_raw(Box::new(Job {
            handler: None,
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }));
        // SAFETY: freshly allocated, exclusively owned
        unsafe {
            (*sentinel).prev = sentinel;
            (*sentinel).next = sentinel;
        }
        Self { sentinel, len: 0 }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn head(&self) -> *mut Job {
        self.sentinel
    }

    /// Link a job at the tail (the owner's end). The job becomes queued.
    ///
    /// # Safety
    /// `job` must outlive its time in the queue and not be linked elsewhere.
    pub unsafe fn push_tail(&mut self, job: *mut Job) {
        let head = self.head();
        let tail = (*head).prev;
        (*job).prev = tail;
        (*job).next = head;
        (*tail).next = job;
        (*head).prev = job;
        self.len += 1;
    }

    /// Re-link a job at the head; used to restore a promotion no thief took
    ///
    /// # Safety
    /// Same contract as `push_tail`.
    pub unsafe fn push_head(&mut self, job: *mut Job) {
        let head = self.head();
        let first = (*head).next;
        (*job).prev = head;
        (*job).next = first;
        (*first).prev = job;
        (*head).next = job;
        self.len += 1;
    }

    /// Unlink the oldest job (head end) for a thief. Marks it executing.
    pub fn pop_head(&mut self) -> Option<*mut Job> {
        if self.len == 0 {
            return None;
        }
        unsafe {
            let head = self.head();
            let job = (*head).next;
            let after = (*job).next;
            (*head).next = after;
            (*after).prev = head;
            (*job).prev = ptr::null_mut();
            (*job).next = ptr::null_mut();
            self.len -= 1;
            Some(job)
        }
    }

    /// Unlink a specific job if it is still queued. Returns true when the
    /// caller reclaimed it; false means a thief already holds the claim.
    ///
    /// # Safety
    /// `job` must be a pointer previously passed to `push_tail` on this
    /// queue, still alive.
    pub unsafe fn unlink_if_queued(&mut self, job: *mut Job) -> bool {
        if (*job).prev.is_null() {
            return false;
        }
        let prev = (*job).prev;
        let next = (*job).next;
        (*prev).next = next;
        (*next).prev = prev;
        (*job).prev = ptr::null_mut();
        (*job).next = ptr::null_mut();
        self.len -= 1;
        true
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for JobQueue {
    fn drop(&mut self) {
        debug_assert!(self.is_empty(), "jobs outlived their queue");
        // SAFETY: allocated via Box::into_raw in `new`
        unsafe {
            drop(Box::from_raw(self.sentinel));
        }
    }
}

/// A `join` frame's second task: the job node plus its execution state
/// (closure, result slot, completion event), all inline in one record.
#[repr(C)]
pub struct StackJob<F, R> {
    job: UnsafeCell<Job>,
    func: UnsafeCell<Option<F>>,
    result: UnsafeCell<Option<std::thread::Result<R>>>,
    pub done: Event,
}

// The queue protocol guarantees exactly one claimant touches func/result
unsafe impl<F: Send, R: Send> Sync for StackJob<F, R> {}

impl<F, R> StackJob<F, R>
where
    F: FnOnce() -> R,
{
    #[must_use]
    pub fn new(func: F) -> Self {
        Self {
            job: UnsafeCell::new(Job::new(Self::run_from_handler)),
            func: UnsafeCell::new(Some(func)),
            result: UnsafeCell::new(None),
            done: Event::new(),
        }
    }

    #[must_use]
    pub fn job_ptr(&self) -> *mut Job {
        self.job.get()
    }

    /// Thief-side entry: run the closure, store the result, signal.
    ///
    /// # Safety
    /// Called at most once, by the single claimant of the job.
    unsafe fn run_from_handler(job: *mut Job) {
        // repr(C): the job node is the first field, so the frame pointer is
        // the job pointer
        let this = &*(job as *const Self);
        let func = (*this.func.get()).take().expect("stack job run twice");
        let result = panic::catch_unwind(AssertUnwindSafe(func));
        *this.result.get() = Some(result);
        this.done.set();
    }

    /// Owner-side inline run after reclaiming the job from the tail.
    ///
    /// # Safety
    /// The caller must have reclaimed the job (unlink_if_queued == true).
    pub unsafe fn run_inline(&self) -> R {
        let func = (*self.func.get()).take().expect("stack job run twice");
        func()
    }

    /// Take the thief-stored result after `done` fired, re-raising a panic
    /// from the stolen task on the owner's thread.
    ///
    /// # Safety
    /// Only after `done.wait()` returned.
    pub unsafe fn take_result(&self) -> R {
        match (*self.result.get()).take().expect("result missing") {
            Ok(v) => v,
            Err(payload) => panic::resume_unwind(payload),
        }
    }
}
