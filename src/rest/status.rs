use serde::{Deserialize, Serialize};

/// Normalized submission lifecycle state.
///
/// `Pending → {Submitted →} {Accepted | Rejected | Error}`. Transitions are
/// driven only by polling the registrar; a terminal state is never reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubmissionStatus {
    Pending,
    Submitted,
    Accepted,
    Rejected,
    Error,
}

impl SubmissionStatus {
    /// Map the registrar's raw status vocabulary onto the canonical enum.
    ///
    /// Unrecognized values normalize to `Pending` — fail-safe, so an
    /// unknown status is re-polled instead of silently dropped.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim() {
            "Pendiente" => Self::Pending,
            "Correcto" | "Aceptado con errores" => Self::Accepted,
            "Incorrecto" | "Duplicado" => Self::Rejected,
            // Cancellation confirmed by the registrar
            "Anulado" => Self::Accepted,
            "Error servidor AEAT" | "No registrado" | "Factura inexistente" => Self::Error,
            _ => Self::Pending,
        }
    }

    /// Terminal states cannot be left.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected | Self::Error)
    }

    /// Whether moving to `next` is a legal lifecycle transition.
    pub fn can_transition_to(&self, next: Self) -> bool {
        match self {
            Self::Pending => true,
            Self::Submitted => next == Self::Submitted || next.is_terminal(),
            _ => *self == next,
        }
    }
}

/// Lifecycle state attached to the tracking identifier the registrar
/// returned at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionTracker {
    pub tracking_id: String,
    pub status: SubmissionStatus,
}

impl SubmissionTracker {
    /// A fresh tracker, as returned by a successful `create`.
    pub fn new(tracking_id: impl Into<String>) -> Self {
        Self {
            tracking_id: tracking_id.into(),
            status: SubmissionStatus::Pending,
        }
    }

    /// Apply a polled raw status. Illegal transitions (anything away from a
    /// terminal state) are ignored and the current status is kept.
    pub fn update_from_raw(&mut self, raw: &str) -> SubmissionStatus {
        let next = SubmissionStatus::from_raw(raw);
        if self.status.can_transition_to(next) {
            self.status = next;
        }
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_vocabulary_is_mapped_exhaustively() {
        let table = [
            ("Pendiente", SubmissionStatus::Pending),
            ("Correcto", SubmissionStatus::Accepted),
            ("Aceptado con errores", SubmissionStatus::Accepted),
            ("Incorrecto", SubmissionStatus::Rejected),
            ("Duplicado", SubmissionStatus::Rejected),
            ("Anulado", SubmissionStatus::Accepted),
            ("Error servidor AEAT", SubmissionStatus::Error),
            ("No registrado", SubmissionStatus::Error),
            ("Factura inexistente", SubmissionStatus::Error),
        ];
        for (raw, expected) in table {
            assert_eq!(SubmissionStatus::from_raw(raw), expected, "{raw}");
        }
    }

    #[test]
    fn unknown_raw_status_defaults_to_pending() {
        assert_eq!(
            SubmissionStatus::from_raw("EstadoDesconocido"),
            SubmissionStatus::Pending
        );
        assert_eq!(SubmissionStatus::from_raw(""), SubmissionStatus::Pending);
    }

    #[test]
    fn terminal_states_are_never_reversed() {
        let mut tracker = SubmissionTracker::new("uuid-1");
        assert_eq!(tracker.update_from_raw("Correcto"), SubmissionStatus::Accepted);
        // A later "Pendiente" must not regress the tracker
        assert_eq!(tracker.update_from_raw("Pendiente"), SubmissionStatus::Accepted);
        assert_eq!(tracker.update_from_raw("Incorrecto"), SubmissionStatus::Accepted);
    }

    #[test]
    fn pending_may_move_to_any_state() {
        for raw in ["Correcto", "Incorrecto", "Error servidor AEAT"] {
            let mut tracker = SubmissionTracker::new("uuid-1");
            let next = tracker.update_from_raw(raw);
            assert!(next.is_terminal());
        }
    }

    #[test]
    fn submitted_transitions() {
        let s = SubmissionStatus::Submitted;
        assert!(s.can_transition_to(SubmissionStatus::Accepted));
        assert!(s.can_transition_to(SubmissionStatus::Error));
        assert!(!s.can_transition_to(SubmissionStatus::Pending));
    }
}
