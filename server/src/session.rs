//! Login sessions.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::info;

use crate::error::RequestError;

/// One logged-in client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: i32,
    /// Username sent with `/login`, if any.
    pub user: Option<String>,
    pub address: IpAddr,
    pub last_active: Instant,
    /// `/update` requests currently blocked on this session.
    pub waiting: usize,
}

impl Session {
    fn is_idle(&self, now: Instant, timeout: Duration) -> bool {
        self.waiting == 0 && now.duration_since(self.last_active) > timeout
    }
}

/// Session table with idle expiry and an optional user cap.
///
/// Idle sessions are swept at every login; a request on a session that
/// has been idle too long is rejected even if no sweep has run yet.
#[derive(Debug)]
pub struct SessionManager {
    sessions: Mutex<HashMap<i32, Session>>,
    timeout: Duration,
    max_users: usize,
}

impl SessionManager {
    /// `max_users` of zero means unlimited.
    #[must_use]
    pub fn new(timeout: Duration, max_users: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            timeout,
            max_users,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<i32, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Creates a session with a fresh random non-zero id.
    pub fn login(&self, user: Option<String>, address: IpAddr) -> Result<Session, RequestError> {
        let mut sessions = self.lock();
        self.sweep(&mut sessions);
        if self.max_users > 0 && sessions.len() >= self.max_users {
            return Err(RequestError::TooManyUsers);
        }
        let mut rng = rand::thread_rng();
        let id = loop {
            let id = rng.gen_range(1..=i32::MAX);
            if !sessions.contains_key(&id) {
                break id;
            }
        };
        let session = Session {
            id,
            user,
            address,
            last_active: Instant::now(),
            waiting: 0,
        };
        sessions.insert(id, session.clone());
        Ok(session)
    }

    /// Marks a session active. Unknown, zero and idle-expired ids fail.
    pub fn touch(&self, id: i32) -> Result<(), RequestError> {
        let mut sessions = self.lock();
        let session = sessions.get_mut(&id).ok_or(RequestError::InvalidSession)?;
        let now = Instant::now();
        if session.is_idle(now, self.timeout) {
            if let Some(expired) = sessions.remove(&id) {
                info!(session = expired.id, user = ?expired.user, address = %expired.address, "session expired");
            }
            return Err(RequestError::InvalidSession);
        }
        session.last_active = now;
        Ok(())
    }

    /// Holds a session open across a long-poll.
    ///
    /// The session cannot go idle while the guard lives, and counts as
    /// active from the moment the guard drops.
    pub fn hold(&self, id: i32) -> SessionHold<'_> {
        if let Some(session) = self.lock().get_mut(&id) {
            session.waiting += 1;
        }
        SessionHold { sessions: self, id }
    }

    pub fn logout(&self, id: i32) -> Option<Session> {
        self.lock().remove(&id)
    }

    /// Removes every idle session and returns them.
    pub fn expire(&self) -> Vec<Session> {
        let mut sessions = self.lock();
        self.sweep(&mut sessions)
    }

    fn sweep(&self, sessions: &mut HashMap<i32, Session>) -> Vec<Session> {
        let now = Instant::now();
        let idle: Vec<i32> = sessions
            .values()
            .filter(|session| session.is_idle(now, self.timeout))
            .map(|session| session.id)
            .collect();
        idle.into_iter()
            .filter_map(|id| sessions.remove(&id))
            .inspect(|session| {
                info!(session = session.id, user = ?session.user, address = %session.address, "session expired");
            })
            .collect()
    }

    #[must_use]
    pub fn sessions(&self) -> Vec<Session> {
        self.lock().values().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Returned by [`SessionManager::hold`].
#[derive(Debug)]
pub struct SessionHold<'a> {
    sessions: &'a SessionManager,
    id: i32,
}

impl Drop for SessionHold<'_> {
    fn drop(&mut self) {
        if let Some(session) = self.sessions.lock().get_mut(&self.id) {
            session.waiting = session.waiting.saturating_sub(1);
            session.last_active = Instant::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;
    use std::thread;

    use super::*;

    const LOCAL: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    #[test]
    fn login_issues_distinct_nonzero_ids() {
        let sessions = SessionManager::new(Duration::from_secs(60), 0);
        let a = sessions.login(Some("alice".into()), LOCAL).unwrap();
        let b = sessions.login(None, LOCAL).unwrap();
        assert_ne!(a.id, 0);
        assert_ne!(a.id, b.id);
        assert_eq!(sessions.len(), 2);
        assert!(sessions.touch(a.id).is_ok());
    }

    #[test]
    fn zero_and_unknown_ids_are_invalid() {
        let sessions = SessionManager::new(Duration::from_secs(60), 0);
        assert!(matches!(sessions.touch(0), Err(RequestError::InvalidSession)));
        assert!(matches!(sessions.touch(1234), Err(RequestError::InvalidSession)));
    }

    #[test]
    fn logout_removes() {
        let sessions = SessionManager::new(Duration::from_secs(60), 0);
        let session = sessions.login(None, LOCAL).unwrap();
        assert_eq!(sessions.logout(session.id).map(|s| s.id), Some(session.id));
        assert!(sessions.touch(session.id).is_err());
        assert!(sessions.is_empty());
    }

    #[test]
    fn max_users() {
        let sessions = SessionManager::new(Duration::from_secs(60), 1);
        let first = sessions.login(None, LOCAL).unwrap();
        assert!(matches!(
            sessions.login(None, LOCAL),
            Err(RequestError::TooManyUsers)
        ));
        sessions.logout(first.id);
        assert!(sessions.login(None, LOCAL).is_ok());
    }

    #[test]
    fn idle_session_is_rejected() {
        let sessions = SessionManager::new(Duration::from_millis(30), 0);
        let session = sessions.login(None, LOCAL).unwrap();
        assert!(sessions.touch(session.id).is_ok());
        thread::sleep(Duration::from_millis(60));
        assert!(matches!(
            sessions.touch(session.id),
            Err(RequestError::InvalidSession)
        ));
        assert!(sessions.is_empty());
    }

    #[test]
    fn held_session_outlives_the_timeout() {
        let sessions = SessionManager::new(Duration::from_millis(30), 1);
        let session = sessions.login(None, LOCAL).unwrap();
        let hold = sessions.hold(session.id);
        thread::sleep(Duration::from_millis(60));
        // neither a login sweep nor a touch expires it while held
        assert!(sessions.login(None, LOCAL).is_err());
        assert!(sessions.touch(session.id).is_ok());
        thread::sleep(Duration::from_millis(60));
        drop(hold);
        assert!(sessions.touch(session.id).is_ok());
        assert_eq!(sessions.sessions()[0].waiting, 0);
    }

    #[test]
    fn hold_on_unknown_session_is_harmless() {
        let sessions = SessionManager::new(Duration::from_secs(60), 0);
        drop(sessions.hold(77));
        assert!(sessions.is_empty());
    }

    #[test]
    fn login_sweeps_idle_sessions() {
        let sessions = SessionManager::new(Duration::from_millis(30), 1);
        sessions.login(None, LOCAL).unwrap();
        thread::sleep(Duration::from_millis(60));
        // the idle session no longer counts against the cap
        let fresh = sessions.login(None, LOCAL).unwrap();
        assert_eq!(sessions.sessions().len(), 1);
        assert_eq!(sessions.sessions()[0].id, fresh.id);
        assert!(sessions.expire().is_empty());
    }
}
