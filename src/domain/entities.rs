//! Domain entities: core data structures

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique, immutable identifier of a department.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Operational status of a department.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Active,
    Disabled,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Active => f.write_str("active"),
            Status::Disabled => f.write_str("disabled"),
        }
    }
}

/// Caller-supplied fields for a new department.
///
/// Collaborators validate required-ness and lengths before submitting;
/// the engine only enforces structural invariants.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DepartmentFields {
    pub name: String,
    pub code: String,
    pub manager_name: String,
    pub member_count: u32,
    pub status: Status,
}

impl DepartmentFields {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            ..Self::default()
        }
    }

    pub fn with_manager(mut self, manager_name: impl Into<String>) -> Self {
        self.manager_name = manager_name.into();
        self
    }

    pub fn with_members(mut self, member_count: u32) -> Self {
        self.member_count = member_count;
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }
}

/// Partial update of the externally mutable fields.
///
/// `None` leaves the field as it is.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DepartmentPatch {
    pub name: Option<String>,
    pub code: Option<String>,
    pub manager_name: Option<String>,
    pub status: Option<Status>,
}

impl DepartmentPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.code.is_none()
            && self.manager_name.is_none()
            && self.status.is_none()
    }
}

/// One organizational unit stored in the arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: NodeId,
    pub name: String,
    pub code: String,
    /// None for root departments
    pub parent_id: Option<NodeId>,
    pub manager_name: String,
    pub member_count: u32,
    /// 1-based depth; roots have level 1
    pub level: u8,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    /// Child ids in insertion order
    pub children: Vec<NodeId>,
}

impl Department {
    pub(crate) fn from_fields(
        id: NodeId,
        parent_id: Option<NodeId>,
        level: u8,
        fields: DepartmentFields,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: fields.name,
            code: fields.code,
            parent_id,
            manager_name: fields.manager_name,
            member_count: fields.member_count,
            level,
            status: fields.status,
            created_at,
            children: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Merge the externally mutable fields of `patch` into this department.
    pub(crate) fn apply(&mut self, patch: DepartmentPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(code) = patch.code {
            self.code = code;
        }
        if let Some(manager_name) = patch.manager_name {
            self.manager_name = manager_name;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }

    /// The caller-visible fields, as they would have been submitted on insert.
    pub fn fields(&self) -> DepartmentFields {
        DepartmentFields {
            name: self.name.clone(),
            code: self.code.clone(),
            manager_name: self.manager_name.clone(),
            member_count: self.member_count,
            status: self.status,
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}
