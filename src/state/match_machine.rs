use thiserror::Error;

use crate::dao::models::MatchStatus;

/// Events that can move a match through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEvent {
    /// Both coaches settled on the same schedule, location, and referee.
    ScheduleAgreed,
    /// The invited referee declined, reopening negotiation.
    RefereeDeclined,
    /// The invited referee accepted the assignment.
    RefereeAccepted,
    /// The agreed referee started play.
    KickOff,
    /// The agreed referee ended play.
    End,
    /// A coach cancelled the match before play.
    Cancel,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The status the match was in when the invalid event was received.
    pub from: MatchStatus,
    /// The event that cannot be applied from this status.
    pub event: MatchEvent,
}

/// Compute the next status for an event, or reject the transition.
///
/// Transitions are one-directional except the referee-decline back-edge into
/// `coachs_edit`. `finish` and `cancled` are terminal: no event applies.
/// A match cannot be cancelled once in progress; it has to run to its end.
pub fn compute_transition(
    status: MatchStatus,
    event: MatchEvent,
) -> Result<MatchStatus, InvalidTransition> {
    let next = match (status, event) {
        (MatchStatus::CoachesEdit, MatchEvent::ScheduleAgreed) => MatchStatus::RefereeWaiting,
        (MatchStatus::RefereeWaiting, MatchEvent::RefereeDeclined) => MatchStatus::CoachesEdit,
        (MatchStatus::RefereeWaiting, MatchEvent::RefereeAccepted) => MatchStatus::Pending,
        (MatchStatus::Pending, MatchEvent::KickOff) => MatchStatus::InProgress,
        (MatchStatus::InProgress, MatchEvent::End) => MatchStatus::Finished,
        (
            MatchStatus::CoachesEdit | MatchStatus::RefereeWaiting | MatchStatus::Pending,
            MatchEvent::Cancel,
        ) => MatchStatus::Cancelled,
        (from, event) => return Err(InvalidTransition { from, event }),
    };

    Ok(next)
}
