/// Notification reaction dispatcher (edge-triggered routing).
pub mod dispatcher;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Match lifecycle engine.
pub mod match_service;
/// Team roster membership rules and fan-out.
pub mod membership_service;
/// Notification emitter.
pub mod notify;
/// Team admin procedures.
pub mod team_service;
/// Tournament roster rules and procedures.
pub mod tournament_service;
/// User account procedures.
pub mod user_service;

#[cfg(test)]
pub(crate) mod testutil;

/// Which side initiated a join flow; picks the notification titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOrigin {
    /// The joiner asked to join.
    Request,
    /// The other party extended an invitation.
    Invite,
}

impl JoinOrigin {
    /// Title used on the paired rejection notifications.
    pub fn declined_title(self) -> &'static str {
        match self {
            JoinOrigin::Request => "Request Declined",
            JoinOrigin::Invite => "Invite Declined",
        }
    }

    /// Title used on the acceptance notification to the joiner.
    pub fn accepted_title(self) -> &'static str {
        match self {
            JoinOrigin::Request => "Request Accepted",
            JoinOrigin::Invite => "Invite Accepted",
        }
    }
}
