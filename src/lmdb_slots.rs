//! LMDB-backed durable slots.
//!
//! Every slot of an application lives in one LMDB environment, stored in the
//! directory `<name>.lmdb`. Each write runs in its own write transaction, so a
//! slot is replaced atomically and a reader never observes a torn value.
//!
//! LMDB must not open the same environment twice in one process. Opening a
//! directory that is already open hands back the live environment instead, so
//! the favorites and compare handles of one host share it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Weak};

use lazy_static::lazy_static;
use lmdb::{Database, DatabaseFlags, Environment, Error as LmdbError, Transaction, WriteFlags};
use log::{debug, info, warn};

use crate::app_response::AppResponse;
use crate::config::{SlotDbConfig, SLOT_DB_NAME, SLOT_DIR_SUFFIX};
use crate::slot::DurableSlot;

struct SlotEnv {
    env: Environment,
    db: Database,
}

lazy_static! {
    /// Environments currently open in this process, by canonical directory.
    static ref OPEN_ENVS: Mutex<HashMap<PathBuf, Weak<SlotEnv>>> = Mutex::new(HashMap::new());
}

/// Handle to an open slot environment. Clones share the environment.
#[derive(Clone)]
pub struct LmdbSlots {
    shared: Arc<SlotEnv>,
    path: PathBuf,
}

impl std::fmt::Debug for LmdbSlots {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LmdbSlots").field("path", &self.path).finish()
    }
}

impl LmdbSlots {
    /// Opens (or creates) `<name>.lmdb` with default settings.
    pub fn init(name: impl AsRef<str>) -> Result<Self, AppResponse> {
        Self::init_with(name, SlotDbConfig::default())
    }

    pub fn init_with(name: impl AsRef<str>, config: SlotDbConfig) -> Result<Self, AppResponse> {
        let dir = PathBuf::from(format!("{}{}", name.as_ref(), SLOT_DIR_SUFFIX));
        Self::open_dir(&dir, config)
    }

    /// Opens an environment directly in `dir`, creating it when missing.
    ///
    /// If `dir` is already open in this process the live environment is
    /// reused and `config` is ignored.
    pub fn open_dir(dir: &Path, config: SlotDbConfig) -> Result<Self, AppResponse> {
        if !dir.exists() {
            info!("Creating slot database at: {}", dir.display());
            std::fs::create_dir_all(dir)?;
        }
        let path = dir.canonicalize()?;

        let mut envs = OPEN_ENVS
            .lock()
            .map_err(|_| AppResponse::StorageError("Slot environment registry poisoned".to_string()))?;
        envs.retain(|_, env| env.strong_count() > 0);

        if let Some(shared) = envs.get(&path).and_then(Weak::upgrade) {
            debug!("Reusing open slot database at: {}", path.display());
            return Ok(Self { shared, path });
        }

        let env = Environment::new()
            .set_max_dbs(config.max_dbs)
            .set_map_size(config.map_size)
            .open(&path)
            .map_err(|e| {
                warn!("Failed to open LMDB environment at {}: {}", path.display(), e);
                AppResponse::from(e)
            })?;

        let db = env.create_db(Some(SLOT_DB_NAME), DatabaseFlags::empty())?;
        info!("Slot database ready at: {}", path.display());

        let shared = Arc::new(SlotEnv { env, db });
        envs.insert(path.clone(), Arc::downgrade(&shared));
        Ok(Self { shared, path })
    }

    #[cfg(test)]
    pub(crate) fn shares_environment_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Forces buffered data to disk.
    pub fn sync(&self) -> Result<(), AppResponse> {
        self.shared.env.sync(true)?;
        Ok(())
    }

    /// Keys of every slot written so far, in LMDB key order.
    pub fn keys(&self) -> Result<Vec<String>, AppResponse> {
        use lmdb::Cursor;

        let txn = self.shared.env.begin_ro_txn()?;
        let mut cursor = txn.open_ro_cursor(self.shared.db)?;
        let mut keys = Vec::new();
        for (key, _) in cursor.iter_start() {
            match std::str::from_utf8(key) {
                Ok(k) => keys.push(k.to_string()),
                Err(e) => warn!("Skipping non UTF-8 slot key: {e}"),
            }
        }
        Ok(keys)
    }
}

impl DurableSlot for LmdbSlots {
    fn read(&self, key: &str) -> Result<Option<String>, AppResponse> {
        let txn = self.shared.env.begin_ro_txn()?;
        let value = match txn.get(self.shared.db, &key) {
            Ok(bytes) => Some(String::from_utf8(bytes.to_vec()).map_err(|e| {
                AppResponse::SerializationError(format!("Slot '{key}' is not UTF-8: {e}"))
            })?),
            Err(LmdbError::NotFound) => None,
            Err(e) => return Err(AppResponse::from(e)),
        };
        txn.abort();
        Ok(value)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), AppResponse> {
        let mut txn = self.shared.env.begin_rw_txn()?;
        txn.put(self.shared.db, &key, &value, WriteFlags::empty())?;
        txn.commit()?;
        debug!("Committed {} bytes to slot '{}'", value.len(), key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, AppResponse> {
        let mut txn = self.shared.env.begin_rw_txn()?;
        match txn.del(self.shared.db, &key, None) {
            Ok(()) => {
                txn.commit()?;
                Ok(true)
            }
            Err(LmdbError::NotFound) => Ok(false),
            Err(e) => Err(AppResponse::from(e)),
        }
    }
}
