//! Credential storage adapters.

mod atomic_io;

use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use zeroize::Zeroizing;

use crate::domain::ports::{
    CredentialStore, CredentialStoreError, StoredCredentials, TOKEN_KEY, USER_KEY,
};

/// Stores each entry as a file in one directory.
///
/// The directory is opened once as a capability; entries cannot escape it.
pub struct FileCredentialStore {
    dir: Dir,
    root: Utf8PathBuf,
}

impl FileCredentialStore {
    /// Open `root`, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialStoreError::Io`] when the directory cannot be
    /// created or opened.
    pub fn open(root: &Utf8Path) -> Result<Self, CredentialStoreError> {
        Dir::create_ambient_dir_all(root, ambient_authority())
            .map_err(|err| CredentialStoreError::io(format!("{root}: {err}")))?;
        let dir = Dir::open_ambient_dir(root, ambient_authority())
            .map_err(|err| CredentialStoreError::io(format!("{root}: {err}")))?;
        Ok(Self {
            dir,
            root: root.to_owned(),
        })
    }

    /// Directory holding the entries.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<StoredCredentials, CredentialStoreError> {
        let token = atomic_io::read_if_present(&self.dir, TOKEN_KEY)?.map(Zeroizing::new);
        let user = atomic_io::read_if_present(&self.dir, USER_KEY)?;
        Ok(StoredCredentials { token, user })
    }

    fn save(&self, token: &str, user_json: &str) -> Result<(), CredentialStoreError> {
        atomic_io::write_atomic(&self.dir, Utf8Path::new(TOKEN_KEY), token)?;
        atomic_io::write_atomic(&self.dir, Utf8Path::new(USER_KEY), user_json)
    }

    fn clear(&self) -> Result<(), CredentialStoreError> {
        atomic_io::remove_if_present(&self.dir, TOKEN_KEY)?;
        atomic_io::remove_if_present(&self.dir, USER_KEY)
    }
}

/// Process-local store, for tests and ephemeral sessions.
#[derive(Default)]
pub struct InMemoryCredentialStore(Mutex<StoredCredentials>);

impl InMemoryCredentialStore {
    /// Seed the store with raw entries.
    pub fn with_entries(token: Option<&str>, user: Option<&str>) -> Self {
        Self(Mutex::new(StoredCredentials {
            token: token.map(|raw| Zeroizing::new(raw.to_owned())),
            user: user.map(str::to_owned),
        }))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StoredCredentials>, CredentialStoreError> {
        self.0
            .lock()
            .map_err(|_| CredentialStoreError::io("credential store mutex poisoned"))
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn load(&self) -> Result<StoredCredentials, CredentialStoreError> {
        Ok(self.lock()?.clone())
    }

    fn save(&self, token: &str, user_json: &str) -> Result<(), CredentialStoreError> {
        *self.lock()? = StoredCredentials {
            token: Some(Zeroizing::new(token.to_owned())),
            user: Some(user_json.to_owned()),
        };
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialStoreError> {
        *self.lock()? = StoredCredentials::default();
        Ok(())
    }
}
