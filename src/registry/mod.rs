//! Application registry.
//!
//! # Data Flow
//! ```text
//! deploy:    Deployment → token issue → Store::save_deployment → index insert
//! undeploy:  id → index check → Store::delete_deployment → index remove
//! lookups:   applications from the index, resources from the store
//! eviction:  index snapshot → liveness probes (concurrent) → undeploy failures
//! ```
//!
//! # Design Decisions
//! - The index is a cache of the store, rebuilt by `bootstrap`
//! - Resources are never cached; every resource query hits the store
//! - Mutations are serialized by one lock and touch the index only after
//!   the store write commits, so a failed write leaves the index unchanged
//! - Readers never take the mutation lock

use std::sync::{Arc, Mutex, MutexGuard};

use dashmap::DashMap;
use futures_util::future::join_all;

use crate::auth::TokenAuthority;
use crate::error::{GatewayError, GatewayResult};
use crate::health::LivenessChecker;
use crate::model::{Application, Deployment, Resource};
use crate::observability::metrics;
use crate::store::Store;

pub struct Registry {
    store: Arc<dyn Store>,
    liveness: LivenessChecker,
    tokens: TokenAuthority,
    index: DashMap<String, Arc<Application>>,
    mutation: Mutex<()>,
}

impl Registry {
    pub fn new(store: Arc<dyn Store>, liveness: LivenessChecker) -> Self {
        Self {
            store,
            liveness,
            tokens: TokenAuthority::new(),
            index: DashMap::new(),
            mutation: Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.mutation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn tokens(&self) -> &TokenAuthority {
        &self.tokens
    }

    /// Load every persisted application into the index.
    pub fn bootstrap(&self) -> GatewayResult<usize> {
        let _guard = self.lock();
        let applications = self.store.find_all_applications()?;

        self.index.clear();
        for application in applications {
            self.index
                .insert(application.id.clone(), Arc::new(application));
        }

        let count = self.index.len();
        metrics::set_deployed_applications(count);
        tracing::info!(applications = count, "Registry bootstrapped from store");
        Ok(count)
    }

    /// Drop the in-memory index. The store is left untouched.
    pub fn teardown(&self) {
        let _guard = self.lock();
        let count = self.index.len();
        self.index.clear();
        tracing::info!(applications = count, "Registry torn down");
    }

    /// Deploy or redeploy an application and return its proxy token.
    ///
    /// An existing deployment with the same id is replaced together with all
    /// of its resources.
    pub fn deploy(&self, deployment: Deployment) -> GatewayResult<String> {
        let Deployment {
            application,
            secret,
            resources,
        } = deployment;

        let token = self.tokens.issue(&application.id, &secret)?;

        let _guard = self.lock();
        let replaced = self.index.contains_key(&application.id);
        let saved = self.store.save_deployment(&application, &resources)?;

        tracing::info!(
            application = %application.id,
            name = %application.name,
            description = %application.description,
            version = %application.version,
            host = %application.host,
            resources = saved.len(),
            replaced,
            "Application deployed"
        );

        self.index
            .insert(application.id.clone(), Arc::new(application.clone()));
        metrics::record_deployment(&application.id);
        metrics::set_deployed_applications(self.index.len());

        Ok(token)
    }

    /// Remove an application and its resources.
    pub fn undeploy(&self, id: &str) -> GatewayResult<()> {
        let _guard = self.lock();
        self.remove_locked(id)
    }

    fn remove_locked(&self, id: &str) -> GatewayResult<()> {
        if !self.index.contains_key(id) {
            return Err(GatewayError::NotDeployed(id.to_string()));
        }

        self.store.delete_deployment(id)?;
        self.index.remove(id);
        metrics::set_deployed_applications(self.index.len());

        tracing::info!(application = %id, "Application undeployed");
        Ok(())
    }

    /// Every deployed application, ordered by id.
    pub fn find_all(&self) -> Vec<Application> {
        let mut applications: Vec<Application> = self
            .index
            .iter()
            .map(|entry| entry.value().as_ref().clone())
            .collect();
        applications.sort_by(|a, b| a.id.cmp(&b.id));
        applications
    }

    pub fn find_application(&self, id: &str) -> Option<Arc<Application>> {
        self.index.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn find_resources_of(&self, application_id: &str) -> GatewayResult<Vec<Resource>> {
        Ok(self.store.find_resources_by_application(application_id)?)
    }

    pub fn find_resource_by_identifier(&self, identifier: &str) -> GatewayResult<Option<Resource>> {
        Ok(self.store.find_resource_by_identifier(identifier)?)
    }

    /// Whether `path` is exposed by the application: an exact path first,
    /// then the templates of every resource it owns.
    pub fn resource_exists(&self, application_id: &str, path: &str) -> GatewayResult<bool> {
        if self
            .store
            .find_resource_by_application_and_path(application_id, path)?
            .is_some()
        {
            return Ok(true);
        }

        Ok(self
            .store
            .find_resources_by_application(application_id)?
            .iter()
            .any(|resource| resource.matches(path)))
    }

    /// Probe every deployed application and undeploy those that fail.
    /// Returns the evicted ids.
    ///
    /// An application redeployed while its probe was in flight is kept; the
    /// next sweep probes the new host.
    pub async fn evict_unreachable(&self) -> Vec<String> {
        let snapshot: Vec<Arc<Application>> = self
            .index
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let probes = snapshot.iter().map(|application| async move {
            let alive = self.liveness.probe(&application.host).await;
            (application, alive)
        });
        let results = join_all(probes).await;

        let mut evicted = Vec::new();
        for (application, alive) in results {
            if alive {
                continue;
            }

            let _guard = self.lock();
            let unchanged = self
                .index
                .get(&application.id)
                .is_some_and(|current| Arc::ptr_eq(current.value(), application));
            if !unchanged {
                continue;
            }

            match self.remove_locked(&application.id) {
                Ok(()) => {
                    tracing::warn!(
                        application = %application.id,
                        host = %application.host,
                        "Application evicted: host unreachable"
                    );
                    metrics::record_eviction(&application.id);
                    evicted.push(application.id.clone());
                }
                Err(GatewayError::NotDeployed(id)) => {
                    tracing::debug!(application = %id, "Eviction skipped: already undeployed");
                }
                Err(e) => {
                    tracing::error!(application = %application.id, error = %e, "Eviction failed");
                }
            }
        }

        evicted
    }
}
