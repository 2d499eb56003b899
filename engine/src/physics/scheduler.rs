//! Worker pool and temporary arena used while stepping scenes
//!
//! One [`JobScheduler`] is shared by every scene of a system. Sub-steps are
//! pushed onto its rayon pool one at a time and the caller blocks until each
//! finishes. The [`TempArena`] does not own memory: it is a byte budget set
//! at startup that scenes charge their contact-event storage against. Each
//! lease reserves its buffer on the heap up front, so nothing is allocated
//! for events while a step is in flight.

use crate::config::PhysicsConfig;
use crate::physics::error::{PhysicsError, PhysicsResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Byte budget for per-scene scratch storage; buffers come from the heap
#[derive(Debug)]
pub struct TempArena {
    capacity_bytes: usize,
    used_bytes: AtomicUsize,
}

/// Bytes borrowed from a [`TempArena`]; returned on drop
#[derive(Debug)]
pub struct ArenaLease {
    arena: Arc<TempArena>,
    bytes: usize,
}

impl TempArena {
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            capacity_bytes,
            used_bytes: AtomicUsize::new(0),
        }
    }

    pub fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes.load(Ordering::Acquire)
    }

    /// Reserve room for `count` values of `T`, charged against the budget.
    ///
    /// Fails with [`PhysicsError::OutOfMemory`] when the budget is exhausted
    /// or the allocator refuses the reservation.
    pub fn lease_vec<T>(self: &Arc<Self>, count: usize) -> PhysicsResult<(Vec<T>, ArenaLease)> {
        let bytes = count.saturating_mul(std::mem::size_of::<T>());

        let mut current = self.used_bytes.load(Ordering::Acquire);
        loop {
            let next = current
                .checked_add(bytes)
                .filter(|next| *next <= self.capacity_bytes)
                .ok_or(PhysicsError::OutOfMemory(bytes))?;
            match self.used_bytes.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
        let lease = ArenaLease {
            arena: Arc::clone(self),
            bytes,
        };

        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(count)
            .map_err(|_| PhysicsError::OutOfMemory(bytes))?;

        debug!(
            bytes = bytes,
            used = self.used_bytes(),
            capacity = self.capacity_bytes,
            "Leased temp arena space"
        );
        Ok((buffer, lease))
    }
}

impl ArenaLease {
    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

impl Drop for ArenaLease {
    fn drop(&mut self) {
        self.arena.used_bytes.fetch_sub(self.bytes, Ordering::AcqRel);
    }
}

/// Fixed-size worker pool plus the shared temp arena
pub struct JobScheduler {
    pool: rayon::ThreadPool,
    arena: Arc<TempArena>,
}

impl JobScheduler {
    pub fn new(config: &PhysicsConfig) -> PhysicsResult<Self> {
        let threads = config.resolved_worker_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("physics-worker-{index}"))
            .panic_handler(|payload| {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                error!(message = %message, "Physics worker panicked");
            })
            .build()?;

        info!(
            threads = threads,
            arena_bytes = config.temp_arena_bytes,
            "Started physics job scheduler"
        );

        Ok(Self {
            pool,
            arena: Arc::new(TempArena::new(config.temp_arena_bytes)),
        })
    }

    pub fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn arena(&self) -> &Arc<TempArena> {
        &self.arena
    }

    /// Run one job on the pool and block until it returns
    pub fn run<R, F>(&self, job: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(job)
    }
}

impl std::fmt::Debug for JobScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobScheduler")
            .field("workers", &self.worker_count())
            .field("arena", &self.arena)
            .finish()
    }
}
