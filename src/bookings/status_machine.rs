use crate::bookings::BookingStatus;

/// Service for managing booking status transitions
pub struct StatusMachine;

impl StatusMachine {
    /// Check if a status transition is valid
    ///
    /// # Valid Transitions
    /// - Pending → Confirmed, Cancelled
    /// - Confirmed → Cancelled, Completed
    /// - Cancelled → Refunded (once the refund completes)
    /// - Completed → (terminal)
    /// - Refunded → (terminal)
    /// - Any status → Same status (idempotent; safe webhook retries)
    pub fn is_valid_transition(from: BookingStatus, to: BookingStatus) -> bool {
        // Same status is always valid (idempotent)
        if from == to {
            return true;
        }

        match (from, to) {
            // From Pending
            (BookingStatus::Pending, BookingStatus::Confirmed) => true,
            (BookingStatus::Pending, BookingStatus::Cancelled) => true,

            // From Confirmed
            (BookingStatus::Confirmed, BookingStatus::Cancelled) => true,
            (BookingStatus::Confirmed, BookingStatus::Completed) => true,

            // From Cancelled - only the refund edge
            (BookingStatus::Cancelled, BookingStatus::Refunded) => true,
            (BookingStatus::Cancelled, _) => false,

            // Completed and Refunded are terminal
            (BookingStatus::Completed, _) => false,
            (BookingStatus::Refunded, _) => false,

            // All other transitions are invalid
            _ => false,
        }
    }

    /// Attempt to transition from one status to another
    ///
    /// # Returns
    /// `Ok(to)` if the transition is valid, `Err(message)` otherwise
    pub fn transition(from: BookingStatus, to: BookingStatus) -> Result<BookingStatus, String> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(format!("Invalid status transition from {} to {}", from, to))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_to_confirmed() {
        assert!(StatusMachine::is_valid_transition(
            BookingStatus::Pending,
            BookingStatus::Confirmed
        ));
    }

    #[test]
    fn test_pending_to_cancelled() {
        assert!(StatusMachine::is_valid_transition(
            BookingStatus::Pending,
            BookingStatus::Cancelled
        ));
    }

    #[test]
    fn test_confirmed_to_cancelled() {
        assert!(StatusMachine::is_valid_transition(
            BookingStatus::Confirmed,
            BookingStatus::Cancelled
        ));
    }

    #[test]
    fn test_confirmed_to_completed() {
        assert!(StatusMachine::is_valid_transition(
            BookingStatus::Confirmed,
            BookingStatus::Completed
        ));
    }

    #[test]
    fn test_cancelled_to_refunded() {
        assert!(StatusMachine::is_valid_transition(
            BookingStatus::Cancelled,
            BookingStatus::Refunded
        ));
    }

    #[test]
    fn test_pending_to_completed_rejected() {
        assert!(!StatusMachine::is_valid_transition(
            BookingStatus::Pending,
            BookingStatus::Completed
        ));
    }

    #[test]
    fn test_pending_to_refunded_rejected() {
        assert!(!StatusMachine::is_valid_transition(
            BookingStatus::Pending,
            BookingStatus::Refunded
        ));
    }

    #[test]
    fn test_confirmed_to_pending_rejected() {
        assert!(!StatusMachine::is_valid_transition(
            BookingStatus::Confirmed,
            BookingStatus::Pending
        ));
    }

    #[test]
    fn test_cancelled_to_confirmed_rejected() {
        assert!(!StatusMachine::is_valid_transition(
            BookingStatus::Cancelled,
            BookingStatus::Confirmed
        ));
    }

    #[test]
    fn test_nothing_leaves_completed() {
        for to in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
            BookingStatus::Refunded,
        ] {
            assert!(
                !StatusMachine::is_valid_transition(BookingStatus::Completed, to),
                "completed -> {} should be rejected",
                to
            );
        }
    }

    #[test]
    fn test_nothing_leaves_refunded() {
        for to in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ] {
            assert!(
                !StatusMachine::is_valid_transition(BookingStatus::Refunded, to),
                "refunded -> {} should be rejected",
                to
            );
        }
    }

    #[test]
    fn test_transition_valid() {
        let result = StatusMachine::transition(BookingStatus::Pending, BookingStatus::Confirmed);
        assert_eq!(result.unwrap(), BookingStatus::Confirmed);
    }

    #[test]
    fn test_transition_invalid() {
        let result = StatusMachine::transition(BookingStatus::Pending, BookingStatus::Completed);
        assert!(result.unwrap_err().contains("Invalid status transition"));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn booking_status_strategy() -> impl Strategy<Value = BookingStatus> {
        prop_oneof![
            Just(BookingStatus::Pending),
            Just(BookingStatus::Confirmed),
            Just(BookingStatus::Cancelled),
            Just(BookingStatus::Completed),
            Just(BookingStatus::Refunded),
        ]
    }

    /// Same-status transitions are always valid (idempotent retries).
    #[test]
    fn prop_same_status_is_valid() {
        proptest!(|(status in booking_status_strategy())| {
            prop_assert!(StatusMachine::is_valid_transition(status, status));
        });
    }

    /// The only edge out of cancelled is the refund edge.
    #[test]
    fn prop_cancelled_only_refunds() {
        proptest!(|(to in booking_status_strategy())| {
            let valid = StatusMachine::is_valid_transition(BookingStatus::Cancelled, to);
            let expected = matches!(to, BookingStatus::Cancelled | BookingStatus::Refunded);
            prop_assert_eq!(valid, expected);
        });
    }

    /// transition() and is_valid_transition() agree on every pair.
    #[test]
    fn prop_transition_consistency() {
        proptest!(|(
            from in booking_status_strategy(),
            to in booking_status_strategy()
        )| {
            let is_valid = StatusMachine::is_valid_transition(from, to);
            let result = StatusMachine::transition(from, to);
            prop_assert_eq!(is_valid, result.is_ok());
        });
    }
}
