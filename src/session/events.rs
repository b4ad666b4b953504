/// Session lifecycle notifications broadcast by the [`SessionStore`](super::SessionStore).
///
/// `Expired` is the hard-logout signal: a renewal failed and the session was
/// cleared. Presentation layers react to it by routing to their login view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn,
    SignedOut,
    Expired,
}

impl SessionEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionEvent::SignedIn => "signed_in",
            SessionEvent::SignedOut => "signed_out",
            SessionEvent::Expired => "expired",
        }
    }
}
