/*!
 * Worker Pool
 * Heartbeat-scheduled work-stealing executor
 *
 * Worker-per-core pool, process-wide singleton, created lazily on the
 * first parallel call. Stealing is a handoff: an idle worker registers a
 * steal request; a busy worker's heartbeat tick promotes its oldest queued
 * job to one waiting thief, and only when at least two jobs are queued.
 * No promotion happens without a committed thief, so an un-stolen job is
 * always reclaimable by its owner and the empty-join fast path stays at a
 * flag check.
 */

use super::job::{Job, JobQueue, StackJob};
use crate::core::limits::{HEARTBEAT_INTERVAL, STEAL_MIN_QUEUED, WORKER_IDLE_WAIT};
use crossbeam_queue::SegQueue;
use parking_lot::{Condvar, Mutex, RwLock};
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;

// =============================================================================
// Steal handoff
// =============================================================================

#[derive(Clone, Copy)]
enum HandoffState {
    Waiting,
    Cancelled,
    Filled(*mut Job),
    Poked,
}

enum WaitOutcome {
    Filled(*mut Job),
    Poked,
    TimedOut,
}

/// Single-use rendezvous between one idle thief and one promoting worker.
/// A thief registers once per idle episode and keeps waiting on the same
/// record across timeout cycles, so the steal queue holds at most one live
/// entry per idle worker.
struct Handoff {
    state: Mutex<HandoffState>,
    cv: Condvar,
}

// The job pointer crosses threads exactly once, with the claim transferred
// by the queue protocol before it is published here
unsafe impl Send for Handoff {}
unsafe impl Sync for Handoff {}

impl Handoff {
    fn new() -> Self {
        Self {
            state: Mutex::new(HandoffState::Waiting),
            cv: Condvar::new(),
        }
    }

    /// Thief side: block for one cycle. Timeout leaves the state Waiting.
    fn wait_cycle(&self, timeout: std::time::Duration) -> WaitOutcome {
        let mut state = self.state.lock();
        loop {
            match *state {
                HandoffState::Filled(job) => return WaitOutcome::Filled(job),
                HandoffState::Poked | HandoffState::Cancelled => return WaitOutcome::Poked,
                HandoffState::Waiting => {
                    if self.cv.wait_for(&mut state, timeout).timed_out() {
                        return match *state {
                            HandoffState::Filled(job) => WaitOutcome::Filled(job),
                            HandoffState::Poked | HandoffState::Cancelled => WaitOutcome::Poked,
                            HandoffState::Waiting => WaitOutcome::TimedOut,
                        };
                    }
                }
            }
        }
    }

    /// Thief side: withdraw the registration. A concurrent fill wins and
    /// hands its job back to the caller, which must execute it.
    fn cancel(&self) -> Option<*mut Job> {
        let mut state = self.state.lock();
        match *state {
            HandoffState::Filled(job) => {
                *state = HandoffState::Cancelled;
                Some(job)
            }
            _ => {
                *state = HandoffState::Cancelled;
                None
            }
        }
    }

    /// Promoter side: true when the thief committed to running the job
    fn fill(&self, job: *mut Job) -> bool {
        let mut state = self.state.lock();
        if matches!(*state, HandoffState::Waiting) {
            *state = HandoffState::Filled(job);
            self.cv.notify_one();
            true
        } else {
            false
        }
    }

    /// Wake the thief with nothing; it re-checks the injector and shutdown
    fn poke(&self) {
        let mut state = self.state.lock();
        if matches!(*state, HandoffState::Waiting) {
            *state = HandoffState::Poked;
            self.cv.notify_one();
        }
    }
}

// =============================================================================
// Workers
// =============================================================================

pub(crate) struct WorkerState {
    queue: Mutex<JobQueue>,
    heartbeat: AtomicBool,
}

impl WorkerState {
    fn new() -> Self {
        Self {
            queue: Mutex::new(JobQueue::new()),
            heartbeat: AtomicBool::new(false),
        }
    }

    /// Heartbeat poll on the join fast path: one relaxed load when the
    /// flag is clear
    #[inline]
    fn tick(&self, pool: &ThreadPool) {
        if self.heartbeat.swap(false, Ordering::Relaxed) {
            self.promote(pool);
        }
    }

    /// Hand the oldest queued job to a waiting thief, keeping at least one
    /// job for the owner's own pop
    #[cold]
    fn promote(&self, pool: &ThreadPool) {
        let Some(thief) = pool.thieves.pop() else {
            return;
        };
        let mut queue = self.queue.lock();
        if queue.len() < STEAL_MIN_QUEUED {
            drop(queue);
            pool.thieves.push(thief);
            return;
        }
        let job = queue.pop_head().expect("len checked above");
        if thief.fill(job) {
            return;
        }
        // That thief timed out; try the rest under the same lock so the
        // owner can never observe the job missing without a claimant
        loop {
            match pool.thieves.pop() {
                Some(t) => {
                    if t.fill(job) {
                        return;
                    }
                }
                None => {
                    // SAFETY: the job was popped from this queue moments ago
                    // and its frame is still blocked in join
                    unsafe { queue.push_head(job) };
                    return;
                }
            }
        }
    }
}

struct RootTask(*mut Job);

// Root jobs live in the submitting thread's frame, which blocks until the
// completion event fires
unsafe impl Send for RootTask {}

// =============================================================================
// Pool
// =============================================================================

pub struct ThreadPool {
    workers: Vec<Arc<WorkerState>>,
    thieves: SegQueue<Arc<Handoff>>,
    injector: SegQueue<RootTask>,
    shutdown: AtomicBool,
    handles: Mutex<Vec<thread::JoinHandle<()>>>,
}

#[derive(Clone)]
struct WorkerCtx {
    pool: Arc<ThreadPool>,
    worker: Arc<WorkerState>,
}

thread_local! {
    static CURRENT: RefCell<Option<WorkerCtx>> = const { RefCell::new(None) };
}

impl ThreadPool {
    fn build(threads: usize) -> std::io::Result<Arc<Self>> {
        let workers: Vec<Arc<WorkerState>> =
            (0..threads).map(|_| Arc::new(WorkerState::new())).collect();
        let pool = Arc::new(Self {
            workers,
            thieves: SegQueue::new(),
            injector: SegQueue::new(),
            shutdown: AtomicBool::new(false),
            handles: Mutex::new(Vec::new()),
        });

        for (i, worker) in pool.workers.iter().enumerate() {
            let pool_ref = Arc::clone(&pool);
            let worker_ref = Arc::clone(worker);
            let handle = thread::Builder::new()
                .name(format!("quiver-worker-{i}"))
                .spawn(move || worker_loop(pool_ref, worker_ref));
            match handle {
                Ok(h) => pool.handles.lock().push(h),
                Err(e) => {
                    pool.stop_and_join();
                    return Err(e);
                }
            }
        }

        let pool_ref = Arc::clone(&pool);
        match thread::Builder::new()
            .name("quiver-heartbeat".into())
            .spawn(move || heartbeat_loop(pool_ref))
        {
            Ok(h) => pool.handles.lock().push(h),
            Err(e) => {
                pool.stop_and_join();
                return Err(e);
            }
        }

        Ok(pool)
    }

    fn stop_and_join(&self) {
        self.shutdown.store(true, Ordering::Release);
        while let Some(t) = self.thieves.pop() {
            t.poke();
        }
        let handles = std::mem::take(&mut *self.handles.lock());
        for h in handles {
            let _ = h.join();
        }
    }

    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

fn worker_loop(pool: Arc<ThreadPool>, me: Arc<WorkerState>) {
    CURRENT.with(|c| {
        *c.borrow_mut() = Some(WorkerCtx {
            pool: Arc::clone(&pool),
            worker: Arc::clone(&me),
        });
    });

    while !pool.shutdown.load(Ordering::Acquire) {
        if let Some(RootTask(job)) = pool.injector.pop() {
            // SAFETY: the submitter blocks on the job's event; the frame
            // is alive and this thread holds the only claim
            unsafe { Job::execute(job) };
            continue;
        }
        let handoff = Arc::new(Handoff::new());
        pool.thieves.push(Arc::clone(&handoff));
        let taken = loop {
            match handoff.wait_cycle(WORKER_IDLE_WAIT) {
                WaitOutcome::Filled(job) => break Some(job),
                WaitOutcome::Poked => break None,
                WaitOutcome::TimedOut => {
                    if pool.shutdown.load(Ordering::Acquire) || !pool.injector.is_empty() {
                        break handoff.cancel();
                    }
                }
            }
        };
        if let Some(job) = taken {
            // SAFETY: promotion transferred the unique claim to this thief
            unsafe { Job::execute(job) };
        }
    }

    // Unblock any straggling submitters before exiting
    while let Some(RootTask(job)) = pool.injector.pop() {
        unsafe { Job::execute(job) };
    }

    CURRENT.with(|c| *c.borrow_mut() = None);
}

fn heartbeat_loop(pool: Arc<ThreadPool>) {
    while !pool.shutdown.load(Ordering::Acquire) {
        for w in &pool.workers {
            w.heartbeat.store(true, Ordering::Relaxed);
        }
        thread::sleep(HEARTBEAT_INTERVAL);
    }
}

// =============================================================================
// Singleton & configuration
// =============================================================================

static POOL: OnceLock<RwLock<Option<Arc<ThreadPool>>>> = OnceLock::new();

/// 0 means auto-detect from the core count
static MAX_THREADS: AtomicUsize = AtomicUsize::new(0);

fn pool_slot() -> &'static RwLock<Option<Arc<ThreadPool>>> {
    POOL.get_or_init(|| RwLock::new(None))
}

fn effective_threads() -> usize {
    match MAX_THREADS.load(Ordering::Acquire) {
        0 => thread::available_parallelism().map_or(1, |n| n.get()),
        n => n,
    }
}

/// Lazily create (or fetch) the pool. Returns None on a single-core
/// configuration or when thread spawn fails; callers degrade to the
/// sequential path.
pub(crate) fn get_or_init_pool() -> Option<Arc<ThreadPool>> {
    if let Some(pool) = pool_slot().read().as_ref() {
        return Some(Arc::clone(pool));
    }
    let mut slot = pool_slot().write();
    if let Some(pool) = slot.as_ref() {
        return Some(Arc::clone(pool));
    }
    let threads = effective_threads();
    if threads < 2 {
        return None;
    }
    match ThreadPool::build(threads) {
        Ok(pool) => {
            tracing::info!(workers = threads, "worker pool started");
            *slot = Some(Arc::clone(&pool));
            Some(pool)
        }
        Err(e) => {
            tracing::warn!(error = %e, "thread spawn failed; running sequentially");
            None
        }
    }
}

/// Explicit pool startup; a no-op if it already runs
pub fn init_pool() {
    let _ = get_or_init_pool();
}

/// Stop and join all workers. Must not race with live parallel calls.
pub fn deinit_pool() {
    let pool = pool_slot().write().take();
    if let Some(pool) = pool {
        pool.stop_and_join();
        tracing::info!("worker pool stopped");
    }
}

/// Set the worker count (0 = auto). Re-initializes the pool lazily; the
/// running pool is stopped first.
pub fn set_max_threads(n: usize) {
    MAX_THREADS.store(n, Ordering::Release);
    deinit_pool();
}

/// Configured or detected worker count
#[must_use]
pub fn get_max_threads() -> usize {
    effective_threads()
}

#[must_use]
pub fn is_threads_auto_detected() -> bool {
    MAX_THREADS.load(Ordering::Acquire) == 0
}

/// Worker count of the (lazily created) pool; 1 when the pool is
/// unavailable
#[must_use]
pub fn num_workers() -> usize {
    get_or_init_pool().map_or(1, |p| p.worker_count())
}

// =============================================================================
// join
// =============================================================================

/// Run two closures, potentially in parallel; returns both results.
///
/// On a worker thread, `b` is pushed onto the local deque while `a` runs
/// inline; if a heartbeat promoted `b` to a thief, the caller blocks on
/// its completion event, otherwise it pops `b` back and runs it inline.
/// On a non-worker thread both closures run sequentially (the public
/// parallel operations dispatch their root onto the pool first).
pub fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    let ctx = CURRENT.with(|c| c.borrow().clone());
    match ctx {
        None => {
            let ra = a();
            let rb = b();
            (ra, rb)
        }
        Some(ctx) => join_on_worker(&ctx, a, b),
    }
}

fn join_on_worker<A, B, RA, RB>(ctx: &WorkerCtx, a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    let stack = StackJob::new(b);
    let job = stack.job_ptr();
    // SAFETY: the job outlives this frame; reclaimed or awaited below on
    // every path, including unwind
    unsafe { ctx.worker.queue.lock().push_tail(job) };
    ctx.worker.tick(&ctx.pool);

    let ra = match panic::catch_unwind(AssertUnwindSafe(a)) {
        Ok(v) => v,
        Err(payload) => {
            // Settle b before unwinding: reclaim it, or wait out the thief
            let reclaimed = unsafe { ctx.worker.queue.lock().unlink_if_queued(job) };
            if !reclaimed {
                stack.done.wait();
            }
            panic::resume_unwind(payload);
        }
    };

    let reclaimed = unsafe { ctx.worker.queue.lock().unlink_if_queued(job) };
    let rb = if reclaimed {
        // SAFETY: unlink returned true, so this thread holds the claim
        unsafe { stack.run_inline() }
    } else {
        stack.done.wait();
        // SAFETY: the event fired, the thief's write is visible
        unsafe { stack.take_result() }
    };
    (ra, rb)
}

/// Run a closure on a pool worker, blocking until it completes. Falls back
/// to inline execution on nested calls or when no pool is available.
pub(crate) fn run_on_pool<F, R>(f: F) -> R
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    if CURRENT.with(|c| c.borrow().is_some()) {
        return f();
    }
    let Some(pool) = get_or_init_pool() else {
        return f();
    };
    let stack = StackJob::new(f);
    pool.injector.push(RootTask(stack.job_ptr()));
    if let Some(t) = pool.thieves.pop() {
        t.poke();
    }
    stack.done.wait();
    // SAFETY: event fired; result written by the executing worker
    unsafe { stack.take_result() }
}
