//! The `/login` credential gate.

use std::sync::{PoisonError, RwLock};

use crate::request::BasicCredentials;

/// How `/login` checks credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AuthMethod {
    #[default]
    None,
    /// Only the password has to match a registered credential.
    Password,
    /// Username and password have to match the same credential.
    UserAndPassword,
}

impl AuthMethod {
    /// Value of `dmap.authenticationmethod`.
    #[must_use]
    pub const fn to_wire(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Password => 1,
            Self::UserAndPassword => 2,
        }
    }

    #[must_use]
    pub const fn from_wire(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Password),
            2 => Some(Self::UserAndPassword),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_required(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// A registered credential. The username is ignored in password-only mode.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Credential {
    #[cfg_attr(feature = "serde", serde(default))]
    pub username: Option<String>,
    pub password: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Credential {
    pub fn password(password: impl Into<String>) -> Self {
        Self {
            username: None,
            password: password.into(),
        }
    }

    pub fn user(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: password.into(),
        }
    }
}

/// Auth mode, realm and the ordered credential list, shared between the
/// connection threads and the owner of the server.
#[derive(Debug, Default)]
pub struct Authenticator {
    method: RwLock<AuthMethod>,
    realm: RwLock<String>,
    credentials: RwLock<Vec<Credential>>,
}

impl Authenticator {
    pub fn new(method: AuthMethod, realm: impl Into<String>) -> Self {
        Self {
            method: RwLock::new(method),
            realm: RwLock::new(realm.into()),
            credentials: RwLock::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn method(&self) -> AuthMethod {
        *self.method.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_method(&self, method: AuthMethod) {
        *self.method.write().unwrap_or_else(PoisonError::into_inner) = method;
    }

    #[must_use]
    pub fn realm(&self) -> String {
        self.realm
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_realm(&self, realm: impl Into<String>) {
        *self.realm.write().unwrap_or_else(PoisonError::into_inner) = realm.into();
    }

    pub fn add_credential(&self, credential: Credential) {
        self.credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(credential);
    }

    /// Removes the first matching credential; `false` if none matched.
    pub fn remove_credential(&self, credential: &Credential) -> bool {
        let mut credentials = self.credentials.write().unwrap_or_else(PoisonError::into_inner);
        match credentials.iter().position(|c| c == credential) {
            Some(index) => {
                credentials.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear_credentials(&self) {
        self.credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    #[must_use]
    pub fn credentials(&self) -> Vec<Credential> {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Checks what a `/login` request presented.
    ///
    /// Always true when no authentication is configured.
    #[must_use]
    pub fn is_valid(&self, presented: Option<&BasicCredentials>) -> bool {
        let method = self.method();
        if !method.is_required() {
            return true;
        }
        let Some(presented) = presented else {
            return false;
        };
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|credential| {
                let user_ok = method != AuthMethod::UserAndPassword
                    || credential.username.as_deref() == Some(presented.username.as_str());
                user_ok && credential.password == presented.password
            })
    }
}
