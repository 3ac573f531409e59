//! Reactive active-line scheduling.
//!
//! The scheduler recomputes the active line from (document, playback
//! position) and arms a single-shot re-check timer at the predicted time of
//! the next line transition. A coarse safety interval bounds how long a
//! missed playback event can leave the active line desynchronized.

use crate::document::LyricsDocument;
use crate::engine::EngineMessage;
use crate::time::DurationExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Upper bound on the time between re-checks, so missed or uncoordinated
/// playback-position events cannot permanently desynchronize the active line.
pub const SAFETY_RECHECK_INTERVAL: Duration = Duration::from_secs(42);

/// Slack added to the transition delay so the re-check lands past the line
/// boundary rather than a rounding error before it.
pub const RECHECK_TOLERANCE: Duration = Duration::from_millis(20);

/// Owns the stored active-line index and the pending re-check timer.
///
/// Timers are single-shot and replaced wholesale on every [`schedule`](Self::schedule)
/// call, never stacked; each timer fires a [`EngineMessage::Tick`] back into
/// the engine's single-writer queue, which calls `schedule` again.
pub struct LineScheduler {
    active_index: Option<usize>,
    timer: CancellationToken,
    tick_tx: mpsc::Sender<EngineMessage>,
}

impl LineScheduler {
    #[must_use]
    pub fn new(tick_tx: mpsc::Sender<EngineMessage>) -> Self {
        Self {
            active_index: None,
            timer: CancellationToken::new(),
            tick_tx,
        }
    }

    /// The currently stored active line index.
    #[must_use]
    pub const fn active_index(&self) -> Option<usize> {
        self.active_index
    }

    /// Clear the stored index and cancel any pending timer.
    pub fn reset(&mut self) {
        self.cancel_timer();
        self.active_index = None;
    }

    /// Cancel the pending timer. Idempotent; once this returns, the cancelled
    /// timer task will never deliver a tick.
    pub fn cancel_timer(&mut self) {
        self.timer.cancel();
        self.timer = CancellationToken::new();
    }

    /// Recompute the active line and re-arm the re-check timer.
    ///
    /// Returns `Some(new_index)` when the stored index changed, so the caller
    /// can emit a notification; redundant recomputations return `None`. Idle
    /// (no document or no playback position) cancels the timer and changes
    /// nothing.
    pub fn schedule(
        &mut self,
        document: Option<&LyricsDocument>,
        position: Option<Duration>,
        correction_ms: i64,
    ) -> Option<Option<usize>> {
        self.cancel_timer();
        let (Some(document), Some(position)) = (document, position) else {
            return None;
        };

        let adjusted = document.adjusted_position_ms(position, correction_ms);
        let (active, next) = document.line_index_at(adjusted);
        let changed = active != self.active_index;
        self.active_index = active;

        // Delay to the next transition, clamped non-negative.
        let delay = next.map(|index| {
            let ms = document.lines()[index].position.as_millis_i64() - adjusted;
            Duration::from_millis(u64::try_from(ms).unwrap_or(0)).saturating_add(RECHECK_TOLERANCE)
        });
        let wait = delay.map_or(SAFETY_RECHECK_INTERVAL, |d| d.min(SAFETY_RECHECK_INTERVAL));

        let token = self.timer.clone();
        let tx = self.tick_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                () = tokio::time::sleep(wait) => {
                    let _ = tx.send(EngineMessage::Tick).await;
                }
            }
        });

        changed.then_some(self.active_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::LyricsLine;
    use tokio::time::timeout;

    fn doc(positions_secs: &[u64]) -> LyricsDocument {
        LyricsDocument::new(
            positions_secs
                .iter()
                .map(|&s| LyricsLine::new(Duration::from_secs(s), format!("line {s}")))
                .collect(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_updates_index_and_fires_tick() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut scheduler = LineScheduler::new(tx);
        let document = doc(&[0, 10, 20]);

        let changed = scheduler.schedule(Some(&document), Some(Duration::from_secs(5)), 0);
        assert_eq!(changed, Some(Some(0)));
        assert_eq!(scheduler.active_index(), Some(0));

        // The one-shot timer fires at the next transition.
        let tick = timeout(Duration::from_secs(60), rx.recv()).await;
        assert!(matches!(tick, Ok(Some(EngineMessage::Tick))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_reports_change_only_once() {
        let (tx, _rx) = mpsc::channel(8);
        let mut scheduler = LineScheduler::new(tx);
        let document = doc(&[0, 10, 20]);

        assert!(scheduler
            .schedule(Some(&document), Some(Duration::from_secs(5)), 0)
            .is_some());
        // Same position again: no change, no notification.
        assert!(scheduler
            .schedule(Some(&document), Some(Duration::from_secs(6)), 0)
            .is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_ticks() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut scheduler = LineScheduler::new(tx);
        let document = doc(&[0, 10, 20]);

        scheduler.schedule(Some(&document), Some(Duration::from_secs(5)), 0);
        scheduler.cancel_timer();
        scheduler.cancel_timer(); // idempotent

        let tick = timeout(Duration::from_secs(120), rx.recv()).await;
        assert!(tick.is_err(), "cancelled timer must not tick");
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_without_document_or_position() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut scheduler = LineScheduler::new(tx);
        let document = doc(&[0, 10, 20]);

        assert!(scheduler.schedule(None, Some(Duration::ZERO), 0).is_none());
        assert!(scheduler.schedule(Some(&document), None, 0).is_none());
        let tick = timeout(Duration::from_secs(120), rx.recv()).await;
        assert!(tick.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_safety_recheck_fires_after_last_line() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut scheduler = LineScheduler::new(tx);
        let document = doc(&[0, 10, 20]);

        // Past the last line there is no next transition, only the safety
        // re-check.
        let changed = scheduler.schedule(Some(&document), Some(Duration::from_secs(25)), 0);
        assert_eq!(changed, Some(Some(2)));
        let tick = timeout(SAFETY_RECHECK_INTERVAL + Duration::from_secs(1), rx.recv()).await;
        assert!(matches!(tick, Ok(Some(EngineMessage::Tick))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_offset_change_moves_active_line() {
        let (tx, _rx) = mpsc::channel(8);
        let mut scheduler = LineScheduler::new(tx);
        let mut document = doc(&[0, 10, 20]);

        scheduler.schedule(Some(&document), Some(Duration::from_secs(5)), 0);
        assert_eq!(scheduler.active_index(), Some(0));

        document.offset_ms = 6_000;
        let changed = scheduler.schedule(Some(&document), Some(Duration::from_secs(5)), 0);
        assert_eq!(changed, Some(Some(1)));
    }
}
