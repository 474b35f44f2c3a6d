use crate::directory::Directory;
use crate::io::SessionStorage;
use crate::models::{Identity, Role};
use crate::{Error, Result};

pub const USER_KEY: &str = "portal.user";
pub const REDIRECT_KEY: &str = "portal.redirect";
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// What the router should do after a guard check.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Navigation {
    Proceed,
    /// The restore has not finished; render nothing yet.
    Loading,
    RedirectToLogin(String),
}

/// Owns who is logged in for the lifetime of the tab.
pub struct SessionGuard {
    directory: Directory,
    storage: Box<dyn SessionStorage>,
    login_path: String,
    identity: Option<Identity>,
    pending_redirect: Option<String>,
    loading: bool,
}

impl SessionGuard {
    pub fn new(directory: Directory, storage: Box<dyn SessionStorage>) -> Self {
        Self::with_login_path(directory, storage, DEFAULT_LOGIN_PATH)
    }

    pub fn with_login_path<S: Into<String>>(
        directory: Directory,
        storage: Box<dyn SessionStorage>,
        login_path: S,
    ) -> Self {
        Self {
            directory,
            storage,
            login_path: login_path.into(),
            identity: None,
            pending_redirect: None,
            loading: true,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn current(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn pending_redirect(&self) -> Option<&str> {
        self.pending_redirect.as_deref()
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Picks up a previously stored identity. Anything unreadable counts as
    /// no session.
    pub fn restore_session(&mut self) -> Option<&Identity> {
        self.identity = match self.read_identity() {
            Ok(found) => found,
            Err(err) => {
                log::warn!("Discarding stored session: {}", err);
                self.forget(USER_KEY);
                None
            }
        };

        self.pending_redirect = if self.identity.is_some() {
            self.forget(REDIRECT_KEY);
            None
        } else {
            match self.read_redirect() {
                Ok(path) => path,
                Err(err) => {
                    log::warn!("Discarding stored redirect: {}", err);
                    self.forget(REDIRECT_KEY);
                    None
                }
            }
        };

        self.loading = false;
        match &self.identity {
            Some(identity) => log::info!("Restored session for {} ({})", identity.id(), identity.role()),
            None => log::debug!("No stored session to restore"),
        }
        self.identity.as_ref()
    }

    /// Logs in when `password` equals `id` and `id` is listed under `role`.
    /// Returns where to navigate next.
    pub fn login(&mut self, id: &str, password: &str, role: Role) -> Result<String> {
        let identity = match self.directory.find(role, id) {
            Some(identity) if password == id => identity.clone(),
            _ => {
                log::info!("Rejected login for `{}` as {}", id, role);
                return Err(Error::AuthenticationFailed {
                    message: format!("invalid credentials for {} `{}`", role, id),
                });
            }
        };

        if let Err(err) = self.write_identity(&identity) {
            log::warn!("Session for {} will not survive a reload: {}", identity.id(), err);
        }

        let target = match self.pending_redirect.take() {
            Some(path) => {
                self.forget(REDIRECT_KEY);
                path
            }
            None => role.landing_path(),
        };

        log::info!("Logged in {} ({}), heading to {}", identity.id(), role, target);
        self.identity = Some(identity);
        self.loading = false;
        Ok(target)
    }

    /// Clears everything and returns the login path to navigate to.
    pub fn logout(&mut self) -> String {
        if let Some(identity) = self.identity.take() {
            log::info!("Logged out {}", identity.id());
        }
        self.pending_redirect = None;
        self.forget(USER_KEY);
        self.forget(REDIRECT_KEY);
        self.login_path.clone()
    }

    /// Called on every route change.
    pub fn require_authenticated(&mut self, current_path: &str) -> Navigation {
        if self.loading {
            return Navigation::Loading;
        }
        if self.identity.is_some() || current_path == self.login_path {
            return Navigation::Proceed;
        }

        log::debug!("Unauthenticated visit to {}, remembering it", current_path);
        self.pending_redirect = Some(current_path.to_string());
        if let Err(err) = self.storage.set(REDIRECT_KEY, current_path.as_bytes()) {
            log::warn!("Could not persist redirect to {}: {}", current_path, err);
        }
        Navigation::RedirectToLogin(self.login_path.clone())
    }

    fn read_identity(&self) -> Result<Option<Identity>> {
        let bytes = match self.storage.get(USER_KEY)? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        Ok(Some(postcard::from_bytes(&bytes)?))
    }

    fn read_redirect(&self) -> Result<Option<String>> {
        match self.storage.get(REDIRECT_KEY)? {
            Some(bytes) => Ok(Some(String::from_utf8(bytes)?)),
            None => Ok(None),
        }
    }

    fn write_identity(&self, identity: &Identity) -> Result<()> {
        let bytes = postcard::to_allocvec(identity)?;
        self.storage.set(USER_KEY, &bytes)
    }

    fn forget(&self, key: &str) {
        if let Err(err) = self.storage.remove(key) {
            log::warn!("Could not clear `{}` from session storage: {}", key, err);
        }
    }
}
