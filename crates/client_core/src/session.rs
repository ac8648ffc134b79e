//! Session state: bearer token ownership and the logged-in/out view.

use shared::domain::SessionView;

/// The view is derived from the token, so `LoggedIn` without a token (or the
/// reverse) cannot be represented.
#[derive(Debug, Default)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn view(&self) -> SessionView {
        if self.token.is_some() {
            SessionView::LoggedIn
        } else {
            SessionView::LoggedOut
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn authenticate(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Clears the token. Returns whether a token was actually held, so
    /// callers only announce a transition when one happened.
    pub fn invalidate(&mut self) -> bool {
        self.token.take().is_some()
    }
}
