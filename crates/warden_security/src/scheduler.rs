//! # Tick Scheduler
//!
//! Repeating tasks driven by the host's fixed-timestep tick.
//!
//! ## Design
//!
//! The scheduler must:
//! - Never run a task while holding its own lock (tasks may schedule or
//!   cancel other tasks)
//! - Treat cancellation as idempotent
//! - Report ticks whose tasks overran the tick budget

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Work run by the scheduler.
pub type Task = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by [`Scheduler::schedule_repeating`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

/// Registers periodic callbacks with the host tick.
pub trait Scheduler: Send + Sync {
    /// Runs `task` every `period_ticks`, first after `delay_ticks`.
    fn schedule_repeating(&self, delay_ticks: u64, period_ticks: u64, task: Task) -> TaskHandle;

    /// Stops a task. Returns false if it was already cancelled.
    fn cancel(&self, handle: TaskHandle) -> bool;
}

struct ScheduledTask {
    handle: TaskHandle,
    next_run: u64,
    period: u64,
    task: Task,
}

/// Tick timing statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Longest tick observed, in microseconds.
    pub max_tick_us: u64,
    /// Rolling average tick duration, in microseconds.
    pub avg_tick_us: u64,
    /// Ticks whose tasks took longer than the budget.
    pub late_ticks: u64,
    /// Total ticks measured.
    pub total_ticks: u64,
}

/// [`Scheduler`] advanced explicitly once per host tick.
pub struct TickScheduler {
    tasks: Mutex<Vec<ScheduledTask>>,
    next_handle: AtomicU64,
    tick: AtomicU64,
    tick_duration: Duration,
    stats: Mutex<TickStats>,
}

impl TickScheduler {
    /// Creates a scheduler for a host running at `tick_rate` ticks per second.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        let tick_duration = Duration::from_micros(1_000_000 / u64::from(tick_rate.max(1)));
        Self {
            tasks: Mutex::new(Vec::new()),
            next_handle: AtomicU64::new(1),
            tick: AtomicU64::new(0),
            tick_duration,
            stats: Mutex::new(TickStats::default()),
        }
    }

    /// Advances one tick and runs every task that is due.
    ///
    /// Returns the new tick number.
    pub fn advance(&self) -> u64 {
        let tick = self.tick.fetch_add(1, Ordering::AcqRel) + 1;
        let start = Instant::now();

        let due: Vec<Task> = {
            let mut tasks = self.tasks.lock();
            tasks
                .iter_mut()
                .filter(|scheduled| scheduled.next_run <= tick)
                .map(|scheduled| {
                    scheduled.next_run = tick + scheduled.period;
                    Arc::clone(&scheduled.task)
                })
                .collect()
        };

        for task in &due {
            task();
        }

        self.record(start.elapsed());
        tick
    }

    /// Ticks advanced so far.
    #[must_use]
    pub fn current_tick(&self) -> u64 {
        self.tick.load(Ordering::Acquire)
    }

    /// Number of live tasks.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Timing statistics.
    #[must_use]
    pub fn stats(&self) -> TickStats {
        *self.stats.lock()
    }

    /// Drops every task.
    pub fn clear(&self) {
        self.tasks.lock().clear();
    }

    fn record(&self, elapsed: Duration) {
        let elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        let mut stats = self.stats.lock();
        stats.total_ticks += 1;
        stats.max_tick_us = stats.max_tick_us.max(elapsed_us);
        stats.avg_tick_us = (stats.avg_tick_us * 15 + elapsed_us) / 16;
        if elapsed > self.tick_duration {
            stats.late_ticks += 1;
            tracing::warn!(
                elapsed_us,
                budget_us = u64::try_from(self.tick_duration.as_micros()).unwrap_or(u64::MAX),
                "scheduled tasks overran the tick budget"
            );
        }
    }
}

impl Scheduler for TickScheduler {
    fn schedule_repeating(&self, delay_ticks: u64, period_ticks: u64, task: Task) -> TaskHandle {
        let handle = TaskHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let next_run = self.current_tick() + delay_ticks.max(1);
        self.tasks.lock().push(ScheduledTask {
            handle,
            next_run,
            period: period_ticks.max(1),
            task,
        });
        handle
    }

    fn cancel(&self, handle: TaskHandle) -> bool {
        let mut tasks = self.tasks.lock();
        let before = tasks.len();
        tasks.retain(|scheduled| scheduled.handle != handle);
        tasks.len() != before
    }
}

impl std::fmt::Debug for TickScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickScheduler")
            .field("tick", &self.current_tick())
            .field("tasks", &self.task_count())
            .finish_non_exhaustive()
    }
}
