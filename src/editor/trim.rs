//! # Trim Timeline Module
//!
//! Questo modulo gestisce il range di trim di un video e il protocollo di
//! drag delle due maniglie sulla timeline.
//!
//! ## Invarianti:
//! - `0 <= start < end <= duration`
//! - `end - start >= 1` secondo (collassa alla durata piena per clip < 1 s)
//!
//! ## Protocollo di drag:
//! - La posizione orizzontale del puntatore dentro l'elemento timeline viene
//!   mappata su un tempo via interpolazione lineare sulla larghezza
//! - Spostare la maniglia start clampa a `min(t, end - 1)`; la maniglia end
//!   clampa a `max(t, start + 1)`: il range non può mai invertirsi
//! - Durante il drag il playback è in pausa e la posizione del video segue la
//!   maniglia trascinata (scrubbing preview)
//! - Fuori dal drag il playback loopa: raggiunto `end` si riparte da `start`

use serde::Serialize;

/// Minimum selectable clip length in seconds
pub const MIN_CLIP_SECS: f64 = 1.0;

/// Which timeline handle is being dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimHandle {
    Start,
    End,
}

/// Selected sub-interval of a media file's duration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrimRange {
    pub start: f64,
    pub end: f64,
    #[serde(skip)]
    pub duration: f64,
}

impl TrimRange {
    /// Full-length range for a freshly loaded video
    pub fn new(duration: f64) -> Self {
        let duration = duration.max(0.0);
        Self {
            start: 0.0,
            end: duration,
            duration,
        }
    }

    /// Minimum gap between the handles, collapsed for sub-second clips
    fn min_gap(&self) -> f64 {
        MIN_CLIP_SECS.min(self.duration)
    }

    /// Move the start handle, clamped so the range never collapses
    pub fn set_start(&mut self, time: f64) {
        let upper = self.end - self.min_gap();
        self.start = time.clamp(0.0, upper.max(0.0));
    }

    /// Move the end handle, clamped so the range never collapses
    pub fn set_end(&mut self, time: f64) {
        let lower = self.start + self.min_gap();
        self.end = time.clamp(lower.min(self.duration), self.duration);
    }

    /// Seconds of media selected
    pub fn len(&self) -> f64 {
        self.end - self.start
    }

    /// Loop policy outside of dragging: wrap playback back to `start`
    /// whenever the playhead reaches `end`.
    pub fn loop_position(&self, current: f64) -> Option<f64> {
        if current >= self.end {
            Some(self.start)
        } else {
            None
        }
    }

    /// Holds iff the invariants of the range are intact
    pub fn is_valid(&self) -> bool {
        0.0 <= self.start
            && self.start < self.end
            && self.end <= self.duration
            && self.len() + 1e-9 >= self.min_gap()
    }
}

/// Map a horizontal pointer position within the timeline element to a time
/// value via linear interpolation against the element's width.
pub fn time_at_pointer(pointer_x: f64, element_left: f64, element_width: f64, duration: f64) -> f64 {
    if element_width <= 0.0 {
        return 0.0;
    }
    let fraction = ((pointer_x - element_left) / element_width).clamp(0.0, 1.0);
    fraction * duration
}

/// One in-flight drag of a trim handle.
///
/// While a session is active playback stays paused and the scrub position
/// tracks the handle being moved.
pub struct TrimSession {
    range: TrimRange,
    dragging: Option<TrimHandle>,
}

impl TrimSession {
    pub fn new(duration: f64) -> Self {
        Self {
            range: TrimRange::new(duration),
            dragging: None,
        }
    }

    pub fn range(&self) -> &TrimRange {
        &self.range
    }

    /// Direct adjustment, for callers that set times instead of dragging
    pub fn range_mut(&mut self) -> &mut TrimRange {
        &mut self.range
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }

    /// Playback must be paused for the whole duration of a drag
    pub fn playback_paused(&self) -> bool {
        self.is_dragging()
    }

    pub fn begin_drag(&mut self, handle: TrimHandle) {
        self.dragging = Some(handle);
    }

    /// Track a pointer move; returns the scrub position the video should
    /// seek to (the time of the handle being moved), or None when no drag
    /// is active.
    pub fn drag_to(
        &mut self,
        pointer_x: f64,
        element_left: f64,
        element_width: f64,
    ) -> Option<f64> {
        let handle = self.dragging?;
        let time = time_at_pointer(pointer_x, element_left, element_width, self.range.duration);
        match handle {
            TrimHandle::Start => {
                self.range.set_start(time);
                Some(self.range.start)
            }
            TrimHandle::End => {
                self.range.set_end(time);
                Some(self.range.end)
            }
        }
    }

    pub fn end_drag(&mut self) {
        self.dragging = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_range_spans_whole_clip() {
        let range = TrimRange::new(12.5);
        assert_eq!(range.start, 0.0);
        assert_eq!(range.end, 12.5);
        assert!(range.is_valid());
    }

    #[test]
    fn test_start_clamps_against_end() {
        let mut range = TrimRange::new(10.0);
        range.set_end(5.0);
        range.set_start(4.9);
        assert_eq!(range.start, 4.0);
        assert!(range.len() >= MIN_CLIP_SECS);
        assert!(range.is_valid());
    }

    #[test]
    fn test_end_clamps_against_start() {
        let mut range = TrimRange::new(10.0);
        range.set_start(6.0);
        range.set_end(6.2);
        assert_eq!(range.end, 7.0);
        assert!(range.is_valid());
    }

    #[test]
    fn test_handles_never_leave_clip_bounds() {
        let mut range = TrimRange::new(10.0);
        range.set_start(-3.0);
        assert_eq!(range.start, 0.0);
        range.set_end(99.0);
        assert_eq!(range.end, 10.0);
        assert!(range.is_valid());
    }

    #[test]
    fn test_sub_second_clip_collapses_min_gap() {
        let mut range = TrimRange::new(0.4);
        range.set_start(0.2);
        // The 1-second floor is unsatisfiable; the gap collapses to the
        // clip duration instead of inverting the range.
        assert!(range.start < range.end);
        assert!(range.end <= 0.4);
        assert!(range.is_valid());
    }

    #[test]
    fn test_invariant_under_drag_storm() {
        let mut range = TrimRange::new(30.0);
        let moves = [
            (TrimHandle::Start, 12.0),
            (TrimHandle::End, 12.5),
            (TrimHandle::Start, 29.0),
            (TrimHandle::End, 0.0),
            (TrimHandle::Start, -5.0),
            (TrimHandle::End, 31.0),
            (TrimHandle::Start, 15.0),
        ];
        for (handle, t) in moves {
            match handle {
                TrimHandle::Start => range.set_start(t),
                TrimHandle::End => range.set_end(t),
            }
            assert!(range.is_valid(), "invariant broken at move {:?} {}", handle, t);
            assert!(range.len() + 1e-9 >= MIN_CLIP_SECS);
        }
    }

    #[test]
    fn test_pointer_mapping() {
        assert_eq!(time_at_pointer(50.0, 0.0, 100.0, 10.0), 5.0);
        assert_eq!(time_at_pointer(-20.0, 0.0, 100.0, 10.0), 0.0);
        assert_eq!(time_at_pointer(500.0, 0.0, 100.0, 10.0), 10.0);
        // Offset element
        assert_eq!(time_at_pointer(150.0, 100.0, 200.0, 8.0), 2.0);
        // Degenerate width never divides by zero
        assert_eq!(time_at_pointer(10.0, 0.0, 0.0, 8.0), 0.0);
    }

    #[test]
    fn test_loop_wraps_at_end() {
        let mut range = TrimRange::new(20.0);
        range.set_start(4.0);
        range.set_end(9.0);
        assert_eq!(range.loop_position(8.9), None);
        assert_eq!(range.loop_position(9.0), Some(4.0));
        assert_eq!(range.loop_position(15.0), Some(4.0));
    }

    #[test]
    fn test_drag_session_scrubs_and_pauses() {
        let mut session = TrimSession::new(10.0);
        assert!(!session.playback_paused());

        session.begin_drag(TrimHandle::Start);
        assert!(session.playback_paused());

        let scrub = session.drag_to(30.0, 0.0, 100.0).unwrap();
        assert_eq!(scrub, 3.0);
        assert_eq!(session.range().start, 3.0);

        session.end_drag();
        assert!(!session.playback_paused());
        assert!(session.drag_to(50.0, 0.0, 100.0).is_none());
    }
}
