//! Session state held by the manager

use bunq_domain::Session;

/// Where the session half of the handshake stands
///
/// `Unauthenticated` and `Invalidated` both mean "no usable session", but
/// they differ in stage 4: a fresh manager may resume a stored session,
/// while an invalidated one must always obtain a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No session has been established by this manager yet
    #[default]
    Unauthenticated,
    /// A handshake attempt is in progress
    Authenticating,
    Authenticated(Session),
    /// The last session was rejected or explicitly dropped
    Invalidated,
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// Short label for log fields
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticating => "authenticating",
            Self::Authenticated(_) => "authenticated",
            Self::Invalidated => "invalidated",
        }
    }
}

#[cfg(test)]
mod tests {
    use bunq_domain::UserType;

    use super::*;

    #[test]
    fn labels_and_accessors() {
        let session = Session { token: "t".into(), user_id: 1, user_type: UserType::Person };
        let authenticated = SessionState::Authenticated(session.clone());

        assert_eq!(SessionState::default().label(), "unauthenticated");
        assert_eq!(SessionState::Authenticating.label(), "authenticating");
        assert_eq!(SessionState::Invalidated.label(), "invalidated");
        assert_eq!(authenticated.label(), "authenticated");
        assert_eq!(authenticated.session(), Some(&session));
        assert!(!SessionState::Invalidated.is_authenticated());
    }
}
