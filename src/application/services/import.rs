//! Import service
//!
//! Reads seed documents and request scripts and feeds them through the
//! organization service, so imported data obeys the same invariants as
//! anything inserted interactively.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::application::request::RequestScript;
use crate::application::services::OrganizationService;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{DepartmentFields, DomainError, NodeId, MAX_DEPTH};
use crate::infrastructure::traits::FileSystem;

/// A department and its children as written in a seed file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedDepartment {
    #[serde(flatten)]
    pub fields: DepartmentFields,
    #[serde(default)]
    pub children: Vec<SeedDepartment>,
}

impl SeedDepartment {
    /// Levels spanned by this department and its deepest descendant.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(SeedDepartment::depth).max().unwrap_or(0)
    }

    pub fn count(&self) -> usize {
        1 + self.children.iter().map(SeedDepartment::count).sum::<usize>()
    }
}

/// Nested seed document:
///
/// ```toml
/// [[department]]
/// name = "技术部"
/// code = "TECH"
///
///   [[department.children]]
///   name = "前端开发组"
///   code = "FE"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedDocument {
    #[serde(default, rename = "department")]
    pub departments: Vec<SeedDepartment>,
}

impl SeedDocument {
    pub fn parse(content: &str, path: &Path) -> ApplicationResult<Self> {
        toml::from_str(content).map_err(|e| ApplicationError::Import {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn depth(&self) -> usize {
        self.departments.iter().map(SeedDepartment::depth).max().unwrap_or(0)
    }

    pub fn count(&self) -> usize {
        self.departments.iter().map(SeedDepartment::count).sum()
    }
}

/// Service for loading seed documents and request scripts.
pub struct ImportService {
    fs: Arc<dyn FileSystem>,
}

impl ImportService {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    fn read(&self, path: &Path) -> ApplicationResult<String> {
        if !self.fs.exists(path) {
            return Err(ApplicationError::Import {
                path: path.to_path_buf(),
                message: "file not found".to_string(),
            });
        }
        self.fs.read_to_string(path).with_path_context("read", path)
    }

    pub fn load_seed(&self, path: &Path) -> ApplicationResult<SeedDocument> {
        debug!("load_seed: {}", path.display());
        SeedDocument::parse(&self.read(path)?, path)
    }

    pub fn load_script(&self, path: &Path) -> ApplicationResult<RequestScript> {
        debug!("load_script: {}", path.display());
        toml::from_str(&self.read(path)?).map_err(|e| ApplicationError::Import {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Insert every seeded department, parents before children.
    ///
    /// The document is depth-checked up front, so a seed that is too deep is
    /// rejected before anything is inserted. Returns the new root ids.
    #[instrument(level = "debug", skip(self, doc, org), fields(count = doc.count()))]
    pub fn import(
        &self,
        doc: &SeedDocument,
        org: &OrganizationService,
    ) -> ApplicationResult<Vec<NodeId>> {
        if doc.depth() > usize::from(MAX_DEPTH) {
            return Err(DomainError::DepthExceeded { max: MAX_DEPTH }.into());
        }

        let mut roots = Vec::with_capacity(doc.departments.len());
        for dept in &doc.departments {
            roots.push(import_one(dept, None, org)?);
        }
        info!("imported {} departments", doc.count());
        Ok(roots)
    }
}

fn import_one(
    dept: &SeedDepartment,
    parent: Option<&NodeId>,
    org: &OrganizationService,
) -> ApplicationResult<NodeId> {
    let id = org.insert(parent, dept.fields.clone())?;
    for child in &dept.children {
        import_one(child, Some(&id), org)?;
    }
    Ok(id)
}
