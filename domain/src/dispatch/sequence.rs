//! Ordering guard for a single dispatch's event sequence.

use super::event::StreamEvent;
use thiserror::Error;

/// A violation of the "progress events, then exactly one terminal" rule.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SequenceViolation {
    #[error("event '{kind}' at position {index} follows the terminal event")]
    AfterTerminal { index: usize, kind: &'static str },
    #[error("sequence has no terminal event")]
    MissingTerminal,
}

/// Tracks one dispatch's emitted events and refuses anything after the
/// terminal event.
#[derive(Debug, Default)]
pub struct EventSequence {
    emitted: usize,
    terminated: bool,
}

impl EventSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `event` if it may still be emitted. Returns `false` (and
    /// records nothing) once a terminal event has been admitted.
    pub fn admit(&mut self, event: &StreamEvent) -> bool {
        if self.terminated {
            return false;
        }
        self.emitted += 1;
        self.terminated = event.is_terminal();
        true
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }
}

/// Check a complete recorded sequence.
pub fn validate_sequence(events: &[StreamEvent]) -> Result<(), SequenceViolation> {
    let mut seq = EventSequence::new();
    for (index, event) in events.iter().enumerate() {
        if !seq.admit(event) {
            return Err(SequenceViolation::AfterTerminal {
                index,
                kind: event.kind(),
            });
        }
    }
    if seq.is_terminated() {
        Ok(())
    } else {
        Err(SequenceViolation::MissingTerminal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(s: &str) -> StreamEvent {
        StreamEvent::ContentDelta {
            text: s.to_string(),
        }
    }

    #[test]
    fn admits_until_terminal() {
        let mut seq = EventSequence::new();
        assert!(seq.admit(&delta("a")));
        assert!(seq.admit(&StreamEvent::failed("x")));
        assert!(seq.is_terminated());
        assert!(!seq.admit(&delta("late")));
        assert!(!seq.admit(&StreamEvent::failed("again")));
        assert_eq!(seq.emitted(), 2);
    }

    #[test]
    fn validate_accepts_well_formed() {
        let events = vec![delta("a"), delta("b"), StreamEvent::failed("x")];
        assert_eq!(validate_sequence(&events), Ok(()));
    }

    #[test]
    fn validate_rejects_event_after_terminal() {
        let events = vec![StreamEvent::failed("x"), delta("late")];
        assert_eq!(
            validate_sequence(&events),
            Err(SequenceViolation::AfterTerminal {
                index: 1,
                kind: "content-delta"
            })
        );
    }

    #[test]
    fn validate_rejects_missing_terminal() {
        assert_eq!(
            validate_sequence(&[delta("a")]),
            Err(SequenceViolation::MissingTerminal)
        );
        assert_eq!(validate_sequence(&[]), Err(SequenceViolation::MissingTerminal));
    }
}
