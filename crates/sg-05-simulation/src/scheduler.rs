//! Virtual-time job scheduler.
//!
//! Entries are one-shot (`start_at`) or periodic (`start_at`, `every`,
//! optional repeat count). [`Scheduler::into_events`] turns them into a lazy
//! stream of `(delta, jobs)` pairs: the time elapsed since the previous
//! emission and every job due at the new instant.
//!
//! Jobs due at the same instant are emitted together. Periodic jobs come
//! first, in registration order, followed by one-shot jobs in registration
//! order. The stream ends once no entry can fire again, so a schedule with
//! an unbounded periodic entry never ends.

use shared_types::SimDuration;

use crate::error::{Result, SimulationError};

#[derive(Debug, Clone)]
struct ScheduleEntry<J> {
    job: J,
    start_at: i64,
    repeat_every: Option<i64>,
    num_repeats: Option<i64>,
}

impl<J> ScheduleEntry<J> {
    /// Earliest firing strictly after `cur`, or `None` once exhausted.
    ///
    /// Arithmetic saturates; a periodic entry whose next firing would pass
    /// `i64::MAX` is exhausted.
    fn next_after(&self, cur: i64) -> Option<i64> {
        match self.repeat_every {
            None => (self.start_at > cur).then_some(self.start_at),
            Some(every) => {
                if let Some(n) = self.num_repeats {
                    let last = self.start_at.saturating_add(every.saturating_mul(n - 1));
                    if cur >= last {
                        return None;
                    }
                }
                let k = cur
                    .saturating_sub(self.start_at)
                    .div_euclid(every)
                    .saturating_add(1)
                    .max(0);
                let at = k.saturating_mul(every).saturating_add(self.start_at);
                (at > cur).then_some(at)
            }
        }
    }
}

/// Ordered list of schedule entries.
#[derive(Debug, Clone)]
pub struct Scheduler<J> {
    entries: Vec<ScheduleEntry<J>>,
}

impl<J> Default for Scheduler<J> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<J: Clone> Scheduler<J> {
    /// Empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `job` once at `start_at`.
    pub fn schedule_once(&mut self, job: J, start_at: SimDuration) -> &mut Self {
        self.entries.push(ScheduleEntry {
            job,
            start_at: to_signed(start_at),
            repeat_every: None,
            num_repeats: None,
        });
        self
    }

    /// Fire `job` at `start_at` and then every `every` ticks, `repeats`
    /// times in total (`None` means forever, `Some(0)` means never).
    pub fn schedule_every(
        &mut self,
        job: J,
        start_at: SimDuration,
        every: SimDuration,
        repeats: Option<u64>,
    ) -> Result<&mut Self> {
        if every == 0 {
            return Err(SimulationError::ZeroPeriod);
        }
        self.entries.push(ScheduleEntry {
            job,
            start_at: to_signed(start_at),
            repeat_every: Some(to_signed(every)),
            num_repeats: repeats.map(to_signed),
        });
        Ok(self)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the schedule into its event stream.
    pub fn into_events(self) -> ScheduleEvents<J> {
        ScheduleEvents {
            entries: self.entries,
            cur: -1,
        }
    }

    /// Event stream over a copy of the schedule.
    pub fn events(&self) -> ScheduleEvents<J> {
        self.clone().into_events()
    }
}

fn to_signed(ticks: u64) -> i64 {
    i64::try_from(ticks).unwrap_or(i64::MAX / 2)
}

/// Lazy stream of `(delta, jobs)` emissions.
#[derive(Debug, Clone)]
pub struct ScheduleEvents<J> {
    entries: Vec<ScheduleEntry<J>>,
    cur: i64,
}

impl<J: Clone> Iterator for ScheduleEvents<J> {
    type Item = (SimDuration, Vec<J>);

    fn next(&mut self) -> Option<Self::Item> {
        let mut cyclic: Option<(i64, Vec<&ScheduleEntry<J>>)> = None;
        let mut oneshot: Option<(i64, Vec<&ScheduleEntry<J>>)> = None;

        for entry in &self.entries {
            let Some(at) = entry.next_after(self.cur) else {
                continue;
            };
            let slot = if entry.repeat_every.is_some() {
                &mut cyclic
            } else {
                &mut oneshot
            };
            let replace = match slot {
                Some((best, due)) if at == *best => {
                    due.push(entry);
                    false
                }
                Some((best, _)) => at < *best,
                None => true,
            };
            if replace {
                *slot = Some((at, vec![entry]));
            }
        }

        let (at, due) = match (cyclic, oneshot) {
            (None, None) => return None,
            (Some(c), None) => c,
            (None, Some(o)) => o,
            (Some((tc, dc)), Some((to, _))) if tc < to => (tc, dc),
            (Some((tc, _)), Some((to, d))) if to < tc => (to, d),
            (Some((tc, mut dc)), Some((_, d))) => {
                dc.extend(d);
                (tc, dc)
            }
        };

        let base = self.cur.max(0);
        let jobs = due.into_iter().map(|entry| entry.job.clone()).collect();
        self.cur = at;
        Some((u64::try_from(at - base).unwrap_or(0), jobs))
    }
}
