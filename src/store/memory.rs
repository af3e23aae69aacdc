//! In-process store serializing every unit of work behind one lock

use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::{
    Error,
    domain::Settings,
    store::{Store, Tables},
};

/// Keeps all rows in memory. Units of work run one at a time; a failed unit is undone from a
/// checkpoint taken before it started.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            tables: Mutex::new(Tables::new(settings)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, Error> {
        self.tables
            .lock()
            .map_err(|_| Error::Storage("memory store lock poisoned".to_string()))
    }
}

impl Store for MemoryStore {
    fn transact<T>(&self, work: impl FnOnce(&mut Tables) -> Result<T, Error>) -> Result<T, Error> {
        let mut tables = self.lock()?;
        let checkpoint = tables.checkpoint();

        match work(&mut tables) {
            Ok(value) => Ok(value),
            Err(err) => {
                debug!("rolling back unit of work: {err}");
                tables.restore(checkpoint);
                Err(err)
            }
        }
    }

    fn read<T>(&self, query: impl FnOnce(&Tables) -> T) -> Result<T, Error> {
        let tables = self.lock()?;
        Ok(query(&tables))
    }
}
