/// Handle to one scheduled response buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scheduled {
    pub id: u64,
    /// Output-clock time (seconds) the buffer begins playing.
    pub start: f64,
    pub duration: f64,
}

impl Scheduled {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Gapless scheduling of decoded response chunks.
///
/// Keeps a "next available start" cursor: each buffer is scheduled at
/// `max(cursor, now)` and the cursor advances by the buffer's duration,
/// so chunks arriving faster than real time queue back-to-back without
/// gaps or overlap, and a consumer that falls behind still plays at the
/// earliest available moment. The cursor only moves backwards on
/// [`stop_all`](Self::stop_all).
#[derive(Debug, Default)]
pub struct PlaybackScheduler {
    next_start: f64,
    active: Vec<Scheduled>,
    next_id: u64,
}

impl PlaybackScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next available start time.
    pub fn cursor(&self) -> f64 {
        self.next_start
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Schedules a buffer of `duration` seconds against the output clock
    /// reading `now`.
    pub fn enqueue(&mut self, duration: f64, now: f64) -> Scheduled {
        self.next_start = self.next_start.max(now);

        let entry = Scheduled {
            id: self.next_id,
            start: self.next_start,
            duration,
        };
        self.next_id += 1;
        self.next_start += duration;
        self.active.push(entry);
        entry
    }

    /// Deregisters one entry after it finished playing naturally.
    pub fn finish(&mut self, id: u64) {
        self.active.retain(|s| s.id != id);
    }

    /// Deregisters every entry whose playback window has passed.
    pub fn prune(&mut self, now: f64) {
        self.active.retain(|s| s.end() > now);
    }

    /// Halts every active entry and resets the cursor; the next enqueue
    /// starts at the current clock reading. Used on barge-in and teardown.
    pub fn stop_all(&mut self) {
        self.active.clear();
        self.next_start = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_queue_back_to_back_when_ahead_of_real_time() {
        let mut scheduler = PlaybackScheduler::new();
        let durations = [0.5, 0.25, 1.0];

        let mut previous: Option<Scheduled> = None;
        for &d in &durations {
            let entry = scheduler.enqueue(d, 0.0);
            if let Some(prev) = previous {
                assert!(entry.start >= prev.end());
                assert_eq!(entry.start, prev.end());
            }
            previous = Some(entry);
        }

        assert_eq!(scheduler.cursor(), durations.iter().sum::<f64>());
        assert_eq!(scheduler.active_count(), 3);
    }

    #[test]
    fn late_consumer_schedules_at_current_time_not_cursor() {
        let mut scheduler = PlaybackScheduler::new();
        scheduler.enqueue(0.1, 0.0);

        // The clock has moved past the end of everything scheduled.
        let entry = scheduler.enqueue(0.2, 5.0);
        assert_eq!(entry.start, 5.0);
        assert_eq!(scheduler.cursor(), 5.2);
    }

    #[test]
    fn cursor_is_monotone_between_interruptions() {
        let mut scheduler = PlaybackScheduler::new();
        let mut last = scheduler.cursor();
        for (d, now) in [(0.3, 0.0), (0.1, 0.05), (0.2, 2.0), (0.4, 1.0)] {
            scheduler.enqueue(d, now);
            assert!(scheduler.cursor() >= last);
            last = scheduler.cursor();
        }
    }

    #[test]
    fn stop_all_empties_the_set_and_resets_the_cursor() {
        let mut scheduler = PlaybackScheduler::new();
        scheduler.enqueue(1.0, 0.0);
        scheduler.enqueue(1.0, 0.0);

        scheduler.stop_all();
        assert_eq!(scheduler.active_count(), 0);
        assert_eq!(scheduler.cursor(), 0.0);

        // Post-interruption audio starts at the clock, not the old cursor.
        let entry = scheduler.enqueue(0.5, 3.0);
        assert_eq!(entry.start, 3.0);
    }

    #[test]
    fn natural_end_deregisters_only_that_entry() {
        let mut scheduler = PlaybackScheduler::new();
        let first = scheduler.enqueue(0.5, 0.0);
        let _second = scheduler.enqueue(0.5, 0.0);

        scheduler.finish(first.id);
        assert_eq!(scheduler.active_count(), 1);
        // Cursor is untouched by natural completion.
        assert_eq!(scheduler.cursor(), 1.0);
    }

    #[test]
    fn prune_drops_entries_whose_window_has_passed() {
        let mut scheduler = PlaybackScheduler::new();
        scheduler.enqueue(0.5, 0.0);
        scheduler.enqueue(0.5, 0.0);

        scheduler.prune(0.6);
        assert_eq!(scheduler.active_count(), 1);
        scheduler.prune(2.0);
        assert_eq!(scheduler.active_count(), 0);
    }
}
