//! The signed-in identity and its persistence.
//!
//! A [`Session`] is created once at startup, rehydrated from local storage,
//! and handed explicitly to every screen that needs to know who is signed
//! in. Writes to storage only happen on login and logout.

use crate::api::Gateway;
use crate::auth::{validate_credentials, validate_registration};
use crate::error::ClientError;
use crate::models::{Credentials, Identity, Registration, Role, User};
use crate::storage::{Storage, TOKEN_KEY, USER_KEY};
use tracing::{info, warn};

#[derive(Debug)]
pub struct Session {
    storage: Storage,
    identity: Option<Identity>,
    loading: bool,
}

impl Session {
    /// A session that has not yet looked at local storage.
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            identity: None,
            loading: true,
        }
    }

    /// Restores the identity persisted by a previous run.
    ///
    /// `loading` is cleared whatever the outcome. A half-written or corrupt
    /// entry is discarded rather than reported.
    pub fn rehydrate(&mut self) -> Result<Option<&Identity>, ClientError> {
        let restored = self.read_persisted();
        self.loading = false;

        match restored? {
            Some(identity) => {
                info!(user_id = identity.id, role = %identity.role, "session restored");
                self.identity = Some(identity);
            }
            None => self.identity = None,
        }
        Ok(self.identity.as_ref())
    }

    fn read_persisted(&self) -> Result<Option<Identity>, ClientError> {
        let token = self.storage.get_item(TOKEN_KEY)?;
        let user = self.storage.get_item(USER_KEY)?;

        match (token, user) {
            (Some(token), Some(user)) => match serde_json::from_str::<User>(&user) {
                Ok(user) => Ok(Some(Identity::new(user, token))),
                Err(e) => {
                    warn!(error = %e, "discarding unreadable persisted user");
                    self.clear_storage()?;
                    Ok(None)
                }
            },
            (None, None) => Ok(None),
            _ => {
                warn!("discarding incomplete persisted session");
                self.clear_storage()?;
                Ok(None)
            }
        }
    }

    fn clear_storage(&self) -> Result<(), ClientError> {
        self.storage.remove_item(TOKEN_KEY)?;
        self.storage.remove_item(USER_KEY)?;
        Ok(())
    }

    /// True until [`Session::rehydrate`] has run.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn role(&self) -> Option<Role> {
        self.identity.as_ref().map(|i| i.role)
    }

    /// Stores `user` and `token` and makes them the current identity.
    pub fn login(&mut self, user: User, token: String) -> Result<&Identity, ClientError> {
        self.storage.set_item(TOKEN_KEY, &token)?;
        self.storage
            .set_item(USER_KEY, &serde_json::to_string(&user)?)?;

        info!(user_id = user.id, role = %user.role, "signed in");
        Ok(self.identity.insert(Identity::new(user, token)))
    }

    /// Forgets the identity both in memory and in storage.
    pub fn logout(&mut self) -> Result<(), ClientError> {
        if let Some(identity) = self.identity.take() {
            info!(user_id = identity.id, "signed out");
        }
        self.clear_storage()
    }

    /// Signs in through `POST /login`.
    pub fn authenticate(
        &mut self,
        gateway: &dyn Gateway,
        credentials: &Credentials,
    ) -> Result<&Identity, ClientError> {
        validate_credentials(credentials)?;
        let response = gateway.login(credentials)?;
        self.login(response.user, response.token)
    }

    /// Creates an account through `POST /register` and signs in as it.
    pub fn register(
        &mut self,
        gateway: &dyn Gateway,
        registration: &Registration,
    ) -> Result<&Identity, ClientError> {
        validate_registration(registration)?;
        let response = gateway.register(registration)?;
        self.login(response.user, response.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{user, MockGateway};
    use tempfile::TempDir;

    fn session() -> (TempDir, Session) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::in_dir(dir.path()).unwrap();
        (dir, Session::new(storage))
    }

    fn reload(dir: &TempDir) -> Session {
        let mut session = Session::new(Storage::in_dir(dir.path()).unwrap());
        session.rehydrate().unwrap();
        session
    }

    #[test]
    fn starts_loading_until_rehydrated() {
        let (_dir, mut session) = session();
        assert!(session.is_loading());
        assert!(session.rehydrate().unwrap().is_none());
        assert!(!session.is_loading());
    }

    #[test]
    fn login_survives_a_reload() {
        let (dir, mut session) = session();
        session
            .login(user(5, "Ada Lovelace", Role::Patient), "tok-5".to_string())
            .unwrap();

        let restored = reload(&dir);
        let identity = restored.identity().unwrap();
        assert_eq!(identity.id, 5);
        assert_eq!(identity.role, Role::Patient);
        assert_eq!(identity.token, "tok-5");
    }

    #[test]
    fn logout_clears_memory_and_storage() {
        let (dir, mut session) = session();
        session
            .login(user(5, "Ada", Role::Patient), "tok".to_string())
            .unwrap();
        session.logout().unwrap();

        assert!(session.identity().is_none());
        let storage = Storage::in_dir(dir.path()).unwrap();
        assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
        assert_eq!(storage.get_item(USER_KEY).unwrap(), None);
        assert!(reload(&dir).identity().is_none());
    }

    #[test]
    fn corrupt_persisted_user_is_discarded() {
        let (dir, session) = session();
        let storage = Storage::in_dir(dir.path()).unwrap();
        storage.set_item(TOKEN_KEY, "tok").unwrap();
        storage.set_item(USER_KEY, "{not json").unwrap();
        drop(session);

        let restored = reload(&dir);
        assert!(restored.identity().is_none());
        assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn register_signs_in_as_the_new_account() {
        let (_dir, mut session) = session();
        let gateway = MockGateway::new();
        let registration = Registration {
            name: "Grace Hopper".to_string(),
            email: "grace@clinic.org".to_string(),
            password: "cobol1959".to_string(),
            role: Role::Doctor,
        };

        let identity = session.register(&gateway, &registration).unwrap();
        assert_eq!(identity.name, "Grace Hopper");
        assert_eq!(identity.role, Role::Doctor);
        assert_eq!(gateway.calls_to("register"), 1);
    }

    #[test]
    fn invalid_credentials_never_reach_the_backend() {
        let (_dir, mut session) = session();
        let gateway = MockGateway::new();
        let credentials = Credentials {
            email: "ada@clinic.org".to_string(),
            password: "123".to_string(),
        };

        let err = session.authenticate(&gateway, &credentials).unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(gateway.total_calls(), 0);
        assert!(session.identity().is_none());
    }

    #[test]
    fn backend_rejection_is_surfaced() {
        let (_dir, mut session) = session();
        let gateway = MockGateway::new();
        let credentials = Credentials {
            email: "nobody@clinic.org".to_string(),
            password: "123456".to_string(),
        };

        let err = session.authenticate(&gateway, &credentials).unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");
        assert!(session.identity().is_none());
    }
}
