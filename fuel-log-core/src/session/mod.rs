//! Session holder.
//!
//! One actor task owns the signed-in identity. Commands from handles and
//! auth events pushed by the backend go through that task one at a time, so
//! the initial session fetch and later events cannot interleave. Readers see
//! the latest published [`SessionSnapshot`] without waiting on the actor.
//!
//! # States
//!
//! 1. **Uninitialized** - `initialize` has not run
//! 2. **Loading** - fetching the current session
//! 3. **Authenticated** - a user is signed in
//! 4. **Anonymous** - nobody is signed in (or the fetch failed)

mod actor;

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};

use crate::backend::{AuthBackend, BackendError};
use crate::models::{Session, SignUpResponse, User};

use actor::{Command, SessionActor};

/// Depth of the command queue.
const COMMAND_CAPACITY: usize = 32;

/// Session holder state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Loading,
    Authenticated,
    Anonymous,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Uninitialized => write!(f, "uninitialized"),
            SessionState::Loading => write!(f, "loading"),
            SessionState::Authenticated => write!(f, "authenticated"),
            SessionState::Anonymous => write!(f, "anonymous"),
        }
    }
}

/// What the session holder currently knows.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub session: Option<Session>,
}

impl SessionSnapshot {
    fn uninitialized() -> Self {
        Self {
            state: SessionState::Uninitialized,
            session: None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}

/// Cloneable handle to the session actor.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Spawns the actor on the current tokio runtime.
    pub fn spawn(auth: Arc<dyn AuthBackend>) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::uninitialized());

        let actor = SessionActor::new(auth, commands_rx, snapshot_tx);
        tokio::spawn(actor.run());

        Self {
            commands: commands_tx,
            snapshot: snapshot_rx,
        }
    }

    async fn call<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, BackendError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| BackendError::Closed)?;
        response.await.map_err(|_| BackendError::Closed)
    }

    /// Fetches the current session and starts following backend events.
    ///
    /// Always completes; a failed fetch is logged and leaves the holder
    /// anonymous. Returns the resulting state.
    pub async fn initialize(&self) -> SessionState {
        match self.call(|reply| Command::Initialize { reply }).await {
            Ok(state) => state,
            Err(_) => SessionState::Anonymous,
        }
    }

    /// Signs in. Backend errors are returned unchanged.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        let email = email.to_string();
        let password = password.to_string();
        self.call(|reply| Command::SignIn {
            email,
            password,
            reply,
        })
        .await?
    }

    /// Registers an account without signing in.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignUpResponse, BackendError> {
        let email = email.to_string();
        let password = password.to_string();
        self.call(|reply| Command::SignUp {
            email,
            password,
            reply,
        })
        .await?
    }

    /// Signs out. Resolves only after the backend's sign-out event has been
    /// applied, so `is_authenticated()` is false once this returns `Ok`.
    pub async fn sign_out(&self) -> Result<(), BackendError> {
        self.call(|reply| Command::SignOut { reply }).await?
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.snapshot.borrow().state
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot.borrow().is_authenticated()
    }

    pub fn user(&self) -> Option<User> {
        self.snapshot.borrow().user().cloned()
    }

    /// Waits for the next published snapshot. `None` once the actor is gone.
    pub async fn changed(&mut self) -> Option<SessionSnapshot> {
        self.snapshot.changed().await.ok()?;
        Some(self.snapshot.borrow_and_update().clone())
    }
}
