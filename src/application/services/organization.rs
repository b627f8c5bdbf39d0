//! Organization service
//!
//! Shares one forest between callers. All mutations go through a single
//! write lock; reads take the read lock and hand back owned snapshots, so no
//! caller ever observes a half-applied mutation.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, instrument};

use crate::application::request::{Payload, Request, Response};
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::domain::{
    flatten, parent_options, Department, DepartmentFields, DepartmentPatch, DomainError,
    FlatNode, IdGenerator, MutationEngine, NodeId, OrgArena, OrgStats, ParentOption,
    SearchEngine, SearchOutcome,
};

/// Thread-safe facade over the mutation engine and search engine.
#[derive(Debug)]
pub struct OrganizationService {
    engine: RwLock<MutationEngine>,
    search: SearchEngine,
}

impl OrganizationService {
    /// Create an empty organization with the given id source and search fields.
    pub fn new(ids: Box<dyn IdGenerator>, search: SearchEngine) -> Self {
        Self {
            engine: RwLock::new(MutationEngine::new(ids)),
            search,
        }
    }

    /// Create an empty organization configured from settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.id_strategy.generator(),
            SearchEngine::new(settings.search_fields.clone()),
        )
    }

    // Every mutation validates before writing, so a poisoned lock still guards
    // a consistent forest.
    fn read(&self) -> RwLockReadGuard<'_, MutationEngine> {
        self.engine.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MutationEngine> {
        self.engine.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[instrument(level = "debug", skip(self, fields))]
    pub fn insert(
        &self,
        parent_id: Option<&NodeId>,
        fields: DepartmentFields,
    ) -> ApplicationResult<NodeId> {
        Ok(self.write().insert(parent_id, fields)?)
    }

    #[instrument(level = "debug", skip(self, patch))]
    pub fn update(&self, id: &NodeId, patch: DepartmentPatch) -> ApplicationResult<()> {
        Ok(self.write().update(id, patch)?)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn delete(&self, id: &NodeId) -> ApplicationResult<usize> {
        Ok(self.write().delete(id)?)
    }

    pub fn find(&self, id: &NodeId) -> Option<Department> {
        self.read().arena().find_by_id(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().arena().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().arena().is_empty()
    }

    /// Copy of the whole forest, for read-heavy collaborators such as renderers.
    pub fn snapshot(&self) -> OrgArena {
        self.read().arena().clone()
    }

    pub fn flatten(&self) -> Vec<FlatNode> {
        let engine = self.read();
        flatten(engine.arena())
            .iter()
            .map(|entry| entry.to_owned_entry())
            .collect()
    }

    pub fn parent_options(&self) -> Vec<ParentOption> {
        parent_options(self.read().arena())
    }

    pub fn search(&self, query: &str) -> SearchOutcome {
        self.search.search(self.read().arena(), query)
    }

    pub fn stats(&self) -> OrgStats {
        let engine = self.read();
        OrgStats::from_flat(&flatten(engine.arena()))
    }

    pub fn search_engine(&self) -> &SearchEngine {
        &self.search
    }

    /// Dispatch one request. Domain failures come back as a typed error response.
    #[instrument(level = "debug", skip(self))]
    pub fn execute(&self, request: Request) -> Response {
        let result: Result<Payload, DomainError> = match request {
            Request::Insert { parent_id, fields } => self
                .write()
                .insert(parent_id.as_ref(), fields)
                .map(|id| Payload::Inserted { id }),
            Request::Update { node_id, fields } => self
                .write()
                .update(&node_id, fields)
                .map(|()| Payload::Updated { id: node_id }),
            Request::Delete { node_id } => self
                .write()
                .delete(&node_id)
                .map(|removed| Payload::Deleted { id: node_id, removed }),
            Request::Find { node_id } => Ok(Payload::Found {
                department: self.find(&node_id),
            }),
            Request::Search { query } => Ok(Payload::Search {
                outcome: self.search(&query),
            }),
            Request::Flatten => Ok(Payload::Flatten {
                nodes: self.flatten(),
            }),
            Request::Parents => Ok(Payload::Parents {
                options: self.parent_options(),
            }),
            Request::Stats => Ok(Payload::Stats {
                stats: self.stats(),
            }),
        };
        if let Err(e) = &result {
            debug!("request rejected: {}", e);
        }
        Response::from(result)
    }

    /// Run requests in order; a failed request does not stop the batch.
    pub fn execute_all(&self, requests: impl IntoIterator<Item = Request>) -> Vec<Response> {
        let responses: Vec<Response> = requests.into_iter().map(|r| self.execute(r)).collect();
        info!(
            "executed {} requests, {} failed",
            responses.len(),
            responses.iter().filter(|r| !r.is_ok()).count()
        );
        responses
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::domain::{SearchField, SequentialIdGenerator};

    fn service() -> OrganizationService {
        OrganizationService::new(Box::new(SequentialIdGenerator::new()), SearchEngine::default())
    }

    #[test]
    fn given_shared_service_when_inserting_concurrently_then_all_ids_unique() {
        let service = Arc::new(service());
        let root = service.insert(None, DepartmentFields::new("技术部", "TECH")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let service = Arc::clone(&service);
                let root = root.clone();
                thread::spawn(move || {
                    (0..25)
                        .map(|i| {
                            service
                                .insert(Some(&root), DepartmentFields::new(format!("{t}-{i}"), "X"))
                                .unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<NodeId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort();
        ids.dedup();

        assert_eq!(ids.len(), 200);
        assert_eq!(service.len(), 201);
        assert_eq!(service.find(&root).unwrap().children.len(), 200);
    }

    #[test]
    fn given_code_only_search_when_name_matches_then_not_reported() {
        let service = OrganizationService::new(
            Box::new(SequentialIdGenerator::new()),
            SearchEngine::new(vec![SearchField::Code]),
        );
        service.insert(None, DepartmentFields::new("React团队", "FE-01")).unwrap();

        assert!(service.search("react").direct_matches.is_empty());
        assert_eq!(service.search("fe-").direct_matches.len(), 1);
    }

    #[test]
    fn given_failed_mutation_when_executing_then_error_response_and_forest_unchanged() {
        let service = service();
        let response = service.execute(Request::Delete {
            node_id: NodeId::from("1"),
        });
        assert!(!response.is_ok());
        assert!(service.is_empty());
    }
}
