//! RedbStore: redb-backed persistence for deployments.
//!
//! Applications and resources are JSON-serialized into `&[u8]` value
//! columns. Both on-disk and in-memory backends are supported, the latter
//! for tests and for running the gateway without a data file.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, WriteTransaction};
use tracing::{debug, warn};

use crate::model::{Application, Resource, ResourceSpec};
use crate::store::tables::*;
use crate::store::{Store, StoreError, StoreResult};

/// Convert any `Display` error into a `StoreError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StoreError::$variant(e.to_string())
    };
}

/// Thread-safe store backed by redb.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store.
    pub fn open_in_memory() -> StoreResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory store opened");
        Ok(store)
    }

    fn ensure_tables(&self) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        txn.open_table(APPLICATIONS).map_err(map_err!(Table))?;
        txn.open_table(RESOURCES).map_err(map_err!(Table))?;
        txn.open_table(RESOURCE_IDENTIFIERS).map_err(map_err!(Table))?;
        txn.open_table(SEQUENCES).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Commit `txn` if `outcome` succeeded, abort it otherwise.
    fn finish<T>(txn: WriteTransaction, outcome: StoreResult<T>) -> StoreResult<T> {
        match outcome {
            Ok(value) => {
                txn.commit().map_err(map_err!(Transaction))?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort) = txn.abort() {
                    warn!(error = %abort, "failed to abort store transaction");
                }
                Err(e)
            }
        }
    }
}

fn decode_resource(bytes: &[u8]) -> StoreResult<Resource> {
    serde_json::from_slice(bytes).map_err(map_err!(Deserialize))
}

fn collect_resources<T>(table: &T, keep: impl Fn(&Resource) -> bool) -> StoreResult<Vec<Resource>>
where
    T: ReadableTable<u64, &'static [u8]>,
{
    let mut results = Vec::new();
    for entry in table.iter().map_err(map_err!(Read))? {
        let (_, value) = entry.map_err(map_err!(Read))?;
        let resource = decode_resource(value.value())?;
        if keep(&resource) {
            results.push(resource);
        }
    }
    Ok(results)
}

/// Remove every resource owned by `application_id` and its identifier entry.
fn remove_owned_resources(txn: &WriteTransaction, application_id: &str) -> StoreResult<usize> {
    let mut table = txn.open_table(RESOURCES).map_err(map_err!(Table))?;
    let mut identifiers = txn.open_table(RESOURCE_IDENTIFIERS).map_err(map_err!(Table))?;

    let owned = collect_resources(&table, |r| r.application_id == application_id)?;
    for resource in &owned {
        table.remove(resource.id).map_err(map_err!(Write))?;
        identifiers
            .remove(resource.identifier.as_str())
            .map_err(map_err!(Write))?;
    }
    Ok(owned.len())
}

fn write_deployment(
    txn: &WriteTransaction,
    application: &Application,
    resources: &[ResourceSpec],
) -> StoreResult<Vec<Resource>> {
    let replaced = remove_owned_resources(txn, &application.id)?;
    if replaced > 0 {
        debug!(application = %application.id, replaced, "previous resources removed");
    }

    let value = serde_json::to_vec(application).map_err(map_err!(Serialize))?;
    let mut applications = txn.open_table(APPLICATIONS).map_err(map_err!(Table))?;
    applications
        .insert(application.id.as_str(), value.as_slice())
        .map_err(map_err!(Write))?;

    let mut table = txn.open_table(RESOURCES).map_err(map_err!(Table))?;
    let mut identifiers = txn.open_table(RESOURCE_IDENTIFIERS).map_err(map_err!(Table))?;
    let mut sequences = txn.open_table(SEQUENCES).map_err(map_err!(Table))?;

    let mut next_id = sequences
        .get(RESOURCE_SEQUENCE)
        .map_err(map_err!(Read))?
        .map(|guard| guard.value())
        .unwrap_or(0);

    let mut saved = Vec::with_capacity(resources.len());
    for spec in resources {
        let taken = identifiers
            .get(spec.identifier.as_str())
            .map_err(map_err!(Read))?
            .is_some();
        if taken {
            return Err(StoreError::Conflict(spec.identifier.clone()));
        }

        next_id += 1;
        let resource = Resource {
            id: next_id,
            identifier: spec.identifier.clone(),
            path: spec.path.clone(),
            application_id: application.id.clone(),
        };
        let bytes = serde_json::to_vec(&resource).map_err(map_err!(Serialize))?;
        table
            .insert(next_id, bytes.as_slice())
            .map_err(map_err!(Write))?;
        identifiers
            .insert(spec.identifier.as_str(), next_id)
            .map_err(map_err!(Write))?;
        saved.push(resource);
    }

    sequences
        .insert(RESOURCE_SEQUENCE, next_id)
        .map_err(map_err!(Write))?;

    Ok(saved)
}

fn erase_deployment(txn: &WriteTransaction, application_id: &str) -> StoreResult<bool> {
    remove_owned_resources(txn, application_id)?;
    let mut applications = txn.open_table(APPLICATIONS).map_err(map_err!(Table))?;
    let existed = applications
        .remove(application_id)
        .map_err(map_err!(Write))?
        .is_some();
    Ok(existed)
}

impl Store for RedbStore {
    fn find_all_applications(&self) -> StoreResult<Vec<Application>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(APPLICATIONS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let application: Application =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(application);
        }
        Ok(results)
    }

    fn find_application(&self, id: &str) -> StoreResult<Option<Application>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(APPLICATIONS).map_err(map_err!(Table))?;
        match table.get(id).map_err(map_err!(Read))? {
            Some(guard) => {
                let application: Application =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(application))
            }
            None => Ok(None),
        }
    }

    fn save_deployment(
        &self,
        application: &Application,
        resources: &[ResourceSpec],
    ) -> StoreResult<Vec<Resource>> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let outcome = write_deployment(&txn, application, resources);
        let saved = Self::finish(txn, outcome)?;
        debug!(application = %application.id, resources = saved.len(), "deployment stored");
        Ok(saved)
    }

    fn delete_deployment(&self, application_id: &str) -> StoreResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let outcome = erase_deployment(&txn, application_id);
        let existed = Self::finish(txn, outcome)?;
        debug!(application = %application_id, existed, "deployment deleted");
        Ok(existed)
    }

    fn find_resources_by_application(&self, application_id: &str) -> StoreResult<Vec<Resource>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(RESOURCES).map_err(map_err!(Table))?;
        collect_resources(&table, |r| r.application_id == application_id)
    }

    fn find_resource_by_application_and_path(
        &self,
        application_id: &str,
        path: &str,
    ) -> StoreResult<Option<Resource>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(RESOURCES).map_err(map_err!(Table))?;
        let found = collect_resources(&table, |r| {
            r.application_id == application_id && r.path == path
        })?;
        Ok(found.into_iter().next())
    }

    fn find_resource_by_identifier(&self, identifier: &str) -> StoreResult<Option<Resource>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let identifiers = txn
            .open_table(RESOURCE_IDENTIFIERS)
            .map_err(map_err!(Table))?;
        let id = match identifiers.get(identifier).map_err(map_err!(Read))? {
            Some(guard) => guard.value(),
            None => return Ok(None),
        };

        let table = txn.open_table(RESOURCES).map_err(map_err!(Table))?;
        match table.get(id).map_err(map_err!(Read))? {
            Some(guard) => Ok(Some(decode_resource(guard.value())?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn application(id: &str) -> Application {
        Application {
            id: id.to_string(),
            name: format!("{id}-api"),
            description: "test application".to_string(),
            version: "1.0.0".to_string(),
            host: format!("http://{id}.local"),
        }
    }

    fn spec(identifier: &str, path: &str) -> ResourceSpec {
        ResourceSpec {
            identifier: identifier.to_string(),
            path: path.to_string(),
        }
    }

    #[test]
    fn test_save_and_find_deployment() {
        let store = RedbStore::open_in_memory().unwrap();
        let saved = store
            .save_deployment(
                &application("app-v3"),
                &[spec("resource-app", "/app/v1"), spec("users", "/users/{id}")],
            )
            .unwrap();

        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].id, 1);
        assert_eq!(saved[1].id, 2);
        assert!(saved.iter().all(|r| r.application_id == "app-v3"));

        assert_eq!(store.find_all_applications().unwrap(), vec![application("app-v3")]);
        assert_eq!(store.find_application("app-v3").unwrap(), Some(application("app-v3")));
        assert_eq!(store.find_resources_by_application("app-v3").unwrap(), saved);

        let exact = store
            .find_resource_by_application_and_path("app-v3", "/app/v1")
            .unwrap()
            .unwrap();
        assert_eq!(exact.identifier, "resource-app");
        assert!(store
            .find_resource_by_application_and_path("app-v3", "/users/1")
            .unwrap()
            .is_none());

        let by_identifier = store.find_resource_by_identifier("users").unwrap().unwrap();
        assert_eq!(by_identifier.path, "/users/{id}");
        assert!(store.find_resource_by_identifier("missing").unwrap().is_none());
    }

    #[test]
    fn test_save_replaces_previous_resources() {
        let store = RedbStore::open_in_memory().unwrap();
        store
            .save_deployment(&application("app"), &[spec("old", "/old")])
            .unwrap();

        let mut updated = application("app");
        updated.version = "2.0.0".to_string();
        store
            .save_deployment(&updated, &[spec("new", "/new")])
            .unwrap();

        let resources = store.find_resources_by_application("app").unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].identifier, "new");
        assert_eq!(resources[0].id, 2, "surrogate ids are never reused");
        assert!(store.find_resource_by_identifier("old").unwrap().is_none());
        assert_eq!(store.find_application("app").unwrap().unwrap().version, "2.0.0");
    }

    #[test]
    fn test_identifier_conflict_aborts_the_whole_deployment() {
        let store = RedbStore::open_in_memory().unwrap();
        store
            .save_deployment(&application("one"), &[spec("shared", "/a")])
            .unwrap();

        let err = store
            .save_deployment(&application("two"), &[spec("fresh", "/b"), spec("shared", "/c")])
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(ref id) if id == "shared"));

        assert!(store.find_application("two").unwrap().is_none());
        assert!(store.find_resource_by_identifier("fresh").unwrap().is_none());
        assert_eq!(
            store.find_resource_by_identifier("shared").unwrap().unwrap().application_id,
            "one"
        );
    }

    #[test]
    fn test_delete_cascades_to_resources() {
        let store = RedbStore::open_in_memory().unwrap();
        store
            .save_deployment(&application("app"), &[spec("r1", "/r1"), spec("r2", "/r2")])
            .unwrap();
        store
            .save_deployment(&application("other"), &[spec("r3", "/r3")])
            .unwrap();

        assert!(store.delete_deployment("app").unwrap());
        assert!(!store.delete_deployment("app").unwrap());

        assert!(store.find_application("app").unwrap().is_none());
        assert!(store.find_resources_by_application("app").unwrap().is_empty());
        assert!(store.find_resource_by_identifier("r1").unwrap().is_none());
        assert_eq!(store.find_resources_by_application("other").unwrap().len(), 1);
    }

    #[test]
    fn test_on_disk_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.redb");

        {
            let store = RedbStore::open(&path).unwrap();
            store
                .save_deployment(&application("app"), &[spec("r1", "/r1")])
                .unwrap();
        }

        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.find_all_applications().unwrap(), vec![application("app")]);
        assert_eq!(store.find_resources_by_application("app").unwrap().len(), 1);
    }
}
