use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::{mpsc, oneshot, watch};

use super::{SessionSnapshot, SessionState};
use crate::backend::{AuthBackend, AuthChange, AuthEvent, BackendError};
use crate::models::{Session, SignUpResponse};

/// How long to wait for the backend's sign-out event after a successful call.
pub(super) const SIGN_OUT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(10);

pub(super) enum Command {
    Initialize {
        reply: oneshot::Sender<SessionState>,
    },
    SignIn {
        email: String,
        password: String,
        reply: oneshot::Sender<Result<Session, BackendError>>,
    },
    SignUp {
        email: String,
        password: String,
        reply: oneshot::Sender<Result<SignUpResponse, BackendError>>,
    },
    SignOut {
        reply: oneshot::Sender<Result<(), BackendError>>,
    },
}

pub(super) struct SessionActor {
    auth: Arc<dyn AuthBackend>,
    commands: mpsc::Receiver<Command>,
    events: Option<broadcast::Receiver<AuthChange>>,
    snapshot: watch::Sender<SessionSnapshot>,
}

async fn next_event(
    events: &mut Option<broadcast::Receiver<AuthChange>>,
) -> Result<AuthChange, RecvError> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

impl SessionActor {
    pub(super) fn new(
        auth: Arc<dyn AuthBackend>,
        commands: mpsc::Receiver<Command>,
        snapshot: watch::Sender<SessionSnapshot>,
    ) -> Self {
        Self {
            auth,
            commands,
            events: None,
            snapshot,
        }
    }

    pub(super) async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                event = next_event(&mut self.events) => self.handle_event(event),
            }
        }
        tracing::debug!("Session holder stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Initialize { reply } => {
                let state = self.initialize().await;
                let _ = reply.send(state);
            }
            Command::SignIn {
                email,
                password,
                reply,
            } => {
                let result = self.auth.sign_in_with_password(&email, &password).await;
                match &result {
                    Ok(session) => {
                        self.publish(Some(session.clone()));
                    }
                    Err(e) => tracing::warn!("Sign-in failed: {}", e),
                }
                let _ = reply.send(result);
            }
            Command::SignUp {
                email,
                password,
                reply,
            } => {
                let result = self.auth.sign_up(&email, &password).await;
                if let Err(e) = &result {
                    tracing::warn!("Sign-up failed: {}", e);
                }
                let _ = reply.send(result);
            }
            Command::SignOut { reply } => {
                // Listen before calling so the confirmation cannot be missed.
                self.subscribe();
                let result = self.auth.sign_out().await;
                match &result {
                    Ok(()) => self.await_signed_out().await,
                    Err(e) => tracing::warn!("Sign-out failed: {}", e),
                }
                let _ = reply.send(result);
            }
        }
    }

    async fn initialize(&mut self) -> SessionState {
        self.subscribe();

        let current = self.snapshot.borrow().session.clone();
        self.snapshot.send_replace(SessionSnapshot {
            state: SessionState::Loading,
            session: current,
        });

        let session = match self.auth.get_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("Error initializing session: {}", e);
                None
            }
        };
        self.publish(session)
    }

    /// Applies pushed events until the sign-out confirmation arrives.
    async fn await_signed_out(&mut self) {
        let Some(mut events) = self.events.take() else {
            self.publish(None);
            return;
        };

        let deadline = tokio::time::sleep(SIGN_OUT_CONFIRM_TIMEOUT);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(change) if change.event == AuthEvent::SignedOut => {
                        self.apply(change);
                        break;
                    }
                    Ok(change) => self.apply(change),
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!("Missed {} auth events while signing out", missed);
                    }
                    Err(RecvError::Closed) => {
                        self.publish(None);
                        return;
                    }
                },
                _ = &mut deadline => {
                    tracing::warn!(
                        "No sign-out event within {:?}, clearing session",
                        SIGN_OUT_CONFIRM_TIMEOUT
                    );
                    self.publish(None);
                    break;
                }
            }
        }

        self.events = Some(events);
    }

    fn handle_event(&mut self, event: Result<AuthChange, RecvError>) {
        match event {
            Ok(change) => self.apply(change),
            Err(RecvError::Lagged(missed)) => {
                tracing::warn!("Missed {} auth events", missed);
            }
            Err(RecvError::Closed) => {
                tracing::debug!("Auth event stream closed");
                self.events = None;
            }
        }
    }

    fn apply(&mut self, change: AuthChange) {
        tracing::debug!(event = ?change.event, "Applying auth event");
        match change.event {
            AuthEvent::SignedOut => {
                self.publish(None);
            }
            AuthEvent::SignedIn | AuthEvent::TokenRefreshed => {
                self.publish(change.session);
            }
        }
    }

    fn subscribe(&mut self) {
        if self.events.is_none() {
            self.events = Some(self.auth.on_auth_state_change());
        }
    }

    fn publish(&mut self, session: Option<Session>) -> SessionState {
        let state = if session.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        };

        let previous = self.snapshot.borrow().state;
        if previous != state {
            match session.as_ref() {
                Some(s) => tracing::info!(user = %s.user.id, "Session {} -> {}", previous, state),
                None => tracing::info!("Session {} -> {}", previous, state),
            }
        }

        self.snapshot.send_replace(SessionSnapshot { state, session });
        state
    }
}
