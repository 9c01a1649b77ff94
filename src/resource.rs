//! ResourceArc Wrapper
//!
//! Keeps a viewer session alive between NIF calls.

use crate::error::ViewerError;
use crate::session::ViewerSession;
use rustler::ResourceArc;
use std::sync::Mutex;

/// A loaded viewer session. `None` once closed.
pub struct SessionResource {
    pub session: Mutex<Option<ViewerSession>>,
}

impl SessionResource {
    pub fn new(session: ViewerSession) -> Self {
        SessionResource {
            session: Mutex::new(Some(session)),
        }
    }

    /// Run `f` against the session.
    ///
    /// # Errors
    ///
    /// `Poisoned` if a previous call panicked while holding the lock,
    /// `NoDocument` after `close`.
    pub fn with_session<F, R>(&self, f: F) -> Result<R, ViewerError>
    where
        F: FnOnce(&mut ViewerSession) -> R,
    {
        let mut guard = self.session.lock().map_err(|_| ViewerError::Poisoned)?;
        let session = guard.as_mut().ok_or(ViewerError::NoDocument)?;
        Ok(f(session))
    }

    /// Drop the session; later calls report `NoDocument`
    pub fn close(&self) -> Result<bool, ViewerError> {
        let mut guard = self.session.lock().map_err(|_| ViewerError::Poisoned)?;
        Ok(guard.take().is_some())
    }
}

#[rustler::resource_impl]
impl rustler::Resource for SessionResource {}

pub type SessionRef = ResourceArc<SessionResource>;
