use futures::stream::{self, Stream, StreamExt};
use tokio::sync::watch;
use tracing::debug;

use crate::models::SessionState;
use crate::store::TokenStore;

/// Broadcasts the derived session state to any number of subscribers.
///
/// Subscribers always observe the latest state; dropping a receiver
/// unsubscribes it.
pub struct SessionPublisher {
    sender: watch::Sender<SessionState>,
}

impl SessionPublisher {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(SessionState::logged_out());
        SessionPublisher { sender }
    }

    /// The state most recently published.
    pub fn current(&self) -> SessionState {
        self.sender.borrow().clone()
    }

    /// Recomputes the state from the token store and publishes it when it
    /// differs from the current one. Returns the recomputed state.
    pub fn sync(&self, tokens: &TokenStore) -> SessionState {
        let next = SessionState::derive(&tokens.record());
        let published = next.clone();
        let changed = self.sender.send_if_modified(|current| {
            if *current == published {
                false
            } else {
                *current = published;
                true
            }
        });
        if changed {
            debug!(
                event_name = "session.state.published",
                event_domain = "session",
                logged_in = next.logged_in,
                is_admin = next.is_admin,
                session_expired = next.session_expired,
                subscribers = self.sender.receiver_count(),
                "session state changed"
            );
        }
        next
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.sender.subscribe()
    }

    /// The current state followed by every subsequent change.
    pub fn updates(&self) -> impl Stream<Item = SessionState> + Send + 'static {
        let mut receiver = self.subscribe();
        let initial = receiver.borrow_and_update().clone();
        stream::once(async move { initial }).chain(stream::unfold(
            receiver,
            |mut receiver| async move {
                receiver.changed().await.ok()?;
                let state = receiver.borrow_and_update().clone();
                Some((state, receiver))
            },
        ))
    }
}

impl Default for SessionPublisher {
    fn default() -> Self {
        Self::new()
    }
}
