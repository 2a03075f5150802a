use std::path::PathBuf;
use std::sync::Mutex;

use brezza::reading::SensorReading;
use brezza::resource::Resource;

use async_trait::async_trait;

use redb::{Database, TableDefinition};

use tracing::{debug, error, info, warn};

use super::PersistenceConnector;

const READINGS_TABLE: TableDefinition<'_, &str, &[u8]> = TableDefinition::new("latest_readings");

fn reading_key(resource: Resource, name: &str) -> String {
    format!("{}/{name}", resource.path())
}

/// The embedded best-effort persistence connector.
///
/// Keeps the latest reading per `(resource, name)` key in a single on-disk
/// table. Every failure is logged and reported through the boolean outcome;
/// nothing propagates to the caller.
pub struct RedbPersistence {
    path: PathBuf,
    database: Mutex<Option<Database>>,
}

impl core::fmt::Debug for RedbPersistence {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RedbPersistence")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RedbPersistence {
    /// Creates a [`RedbPersistence`] over the given database file path.
    ///
    /// The database is only opened by [`PersistenceConnector::connect`].
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            database: Mutex::new(None),
        }
    }

    fn write_reading(database: &Database, key: &str, payload: &[u8]) -> Result<(), redb::Error> {
        let txn = database.begin_write()?;
        {
            let mut table = txn.open_table(READINGS_TABLE)?;
            let _ = table.insert(key, payload)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn read_reading(database: &Database, key: &str) -> Result<Option<Vec<u8>>, redb::Error> {
        let txn = database.begin_read()?;
        let table = match txn.open_table(READINGS_TABLE) {
            Ok(table) => table,
            // The table does not exist until the first store.
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(table.get(key)?.map(|guard| guard.value().to_vec()))
    }

    /// Fetches the latest stored reading for the given resource and name.
    ///
    /// Returns [`None`] when the connector is not connected, the key has
    /// never been stored, or the stored payload cannot be decoded.
    pub fn fetch(&self, resource: Resource, name: &str) -> Option<SensorReading> {
        let database = self.database.lock().expect("persistence lock poisoned");
        let database = database.as_ref()?;

        let key = reading_key(resource, name);
        match Self::read_reading(database, &key) {
            Ok(Some(payload)) => match serde_json::from_slice(&payload) {
                Ok(reading) => Some(reading),
                Err(e) => {
                    error!("Stored reading for `{key}` cannot be decoded: {e}");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                error!("Failed to fetch the reading for `{key}`: {e}");
                None
            }
        }
    }
}

#[async_trait]
impl PersistenceConnector for RedbPersistence {
    async fn connect(&self) -> bool {
        let mut database = self.database.lock().expect("persistence lock poisoned");
        if database.is_some() {
            warn!("Persistence store already opened, ignoring request.");
            return false;
        }

        match Database::create(&self.path) {
            Ok(opened) => {
                info!("Persistence store opened at `{}`", self.path.display());
                *database = Some(opened);
                true
            }
            Err(e) => {
                error!(
                    "Failed to open the persistence store at `{}`: {e}",
                    self.path.display()
                );
                false
            }
        }
    }

    async fn disconnect(&self) -> bool {
        let closed = self
            .database
            .lock()
            .expect("persistence lock poisoned")
            .take()
            .is_some();

        if closed {
            info!("Persistence store closed.");
        } else {
            warn!("Persistence store already closed, ignoring request.");
        }
        closed
    }

    async fn store(&self, resource: Resource, reading: &SensorReading) -> bool {
        let payload = match reading.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                error!("Reading `{}` cannot be serialized: {e}", reading.name);
                return false;
            }
        };

        let database = self.database.lock().expect("persistence lock poisoned");
        let Some(database) = database.as_ref() else {
            warn!("Persistence store not opened, cannot store `{}`.", reading.name);
            return false;
        };

        let key = reading_key(resource, &reading.name);
        match Self::write_reading(database, &key, payload.as_bytes()) {
            Ok(()) => {
                debug!("Stored latest reading for `{key}`");
                true
            }
            Err(e) => {
                error!("Failed to store the reading for `{key}`: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use brezza::reading::{SensorKind, SensorReading};
    use brezza::resource::Resource;

    use crate::connection::PersistenceConnector;

    use super::RedbPersistence;

    fn reading(value: f64) -> SensorReading {
        SensorReading::new(SensorKind::Temperature, "temperature").with_value(value)
    }

    #[tokio::test]
    async fn stores_and_fetches_latest_reading() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbPersistence::new(dir.path().join("readings.redb"));

        // Storing before connecting is a guarded no-op.
        assert!(!store.store(Resource::SensorMsg, &reading(20.)).await);

        assert!(store.connect().await);
        assert!(store.store(Resource::SensorMsg, &reading(20.)).await);
        assert!(store.store(Resource::SensorMsg, &reading(23.5)).await);

        let fetched = store.fetch(Resource::SensorMsg, "temperature").unwrap();
        assert_eq!(fetched.value, 23.5);

        // Unknown names have never been observed.
        assert!(store.fetch(Resource::SensorMsg, "humidity").is_none());

        assert!(store.disconnect().await);
        assert!(!store.disconnect().await);
    }
}
