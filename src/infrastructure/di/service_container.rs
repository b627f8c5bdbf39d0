//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::application::services::{ImportService, OrganizationService};
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::domain::{ExpansionPolicy, NodeId};
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// The shared organization forest
    pub org: Arc<OrganizationService>,

    /// Seed and script loading
    pub import: ImportService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let org = Arc::new(OrganizationService::from_settings(&settings));
        let import = ImportService::new(Arc::clone(&fs));
        let settings = Arc::new(settings);

        Self {
            settings,
            fs,
            org,
            import,
        }
    }

    pub fn expansion_policy(&self) -> ExpansionPolicy {
        self.settings.expansion_policy()
    }

    /// Import `seed`, or the configured seed file when `None`.
    ///
    /// Having no seed at all is not an error: the forest simply stays empty.
    pub fn load_seed(&self, seed: Option<&Path>) -> ApplicationResult<Vec<NodeId>> {
        let Some(path) = seed.or(self.settings.seed_file.as_deref()) else {
            debug!("no seed file configured");
            return Ok(Vec::new());
        };
        let doc = self.import.load_seed(path)?;
        self.import.import(&doc, &self.org)
    }
}
