//! Request/response schema for driving the engine from outside the process.
//!
//! ```toml
//! [[request]]
//! operation = "insert"
//! parent_id = "1"
//! fields = { name = "React团队", code = "REACT" }
//!
//! [[request]]
//! operation = "search"
//! query = "react"
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::{
    Department, DepartmentFields, DepartmentPatch, DomainError, FlatNode, NodeId, OrgStats,
    ParentOption, SearchOutcome,
};

/// One operation against the forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Request {
    Insert {
        #[serde(default, alias = "parentId")]
        parent_id: Option<NodeId>,
        #[serde(default)]
        fields: DepartmentFields,
    },
    Update {
        #[serde(alias = "nodeId")]
        node_id: NodeId,
        #[serde(default)]
        fields: DepartmentPatch,
    },
    Delete {
        #[serde(alias = "nodeId")]
        node_id: NodeId,
    },
    Find {
        #[serde(alias = "nodeId")]
        node_id: NodeId,
    },
    Search {
        #[serde(default)]
        query: String,
    },
    Flatten,
    Parents,
    Stats,
}

/// Successful result of a [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Payload {
    Inserted { id: NodeId },
    Updated { id: NodeId },
    Deleted { id: NodeId, removed: usize },
    Found { department: Option<Department> },
    Search { outcome: SearchOutcome },
    Flatten { nodes: Vec<FlatNode> },
    Parents { options: Vec<ParentOption> },
    Stats { stats: OrgStats },
}

/// Machine-readable error kind; callers map these to user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    DepthExceeded,
    DuplicateId,
    InvalidParent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestError {
    pub kind: ErrorKind,
    /// Offending id, if the error names one
    pub id: Option<NodeId>,
    /// Depth limit that was hit, for `depth_exceeded`
    pub max: Option<u8>,
    pub message: String,
}

impl From<&DomainError> for RequestError {
    fn from(err: &DomainError) -> Self {
        let (kind, id, max) = match err {
            DomainError::NotFound(id) => (ErrorKind::NotFound, Some(id.clone()), None),
            DomainError::DepthExceeded { max } => (ErrorKind::DepthExceeded, None, Some(*max)),
            DomainError::DuplicateId(id) => (ErrorKind::DuplicateId, Some(id.clone()), None),
            DomainError::InvalidParent(id) => (ErrorKind::InvalidParent, Some(id.clone()), None),
        };
        Self {
            kind,
            id,
            max,
            message: err.to_string(),
        }
    }
}

/// Either a payload or a typed error, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Ok(Payload),
    Error(RequestError),
}

impl Response {
    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok(_))
    }
}

impl From<Result<Payload, DomainError>> for Response {
    fn from(result: Result<Payload, DomainError>) -> Self {
        match result {
            Ok(payload) => Response::Ok(payload),
            Err(err) => Response::Error(RequestError::from(&err)),
        }
    }
}

/// An ordered batch of requests, as read from a `[[request]]` TOML document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestScript {
    #[serde(default, rename = "request")]
    pub requests: Vec<Request>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_toml_script_when_parsing_then_operations_are_tagged() {
        let script: RequestScript = toml::from_str(
            r#"
[[request]]
operation = "insert"
fields = { name = "技术部", code = "TECH", member_count = 45 }

[[request]]
operation = "insert"
parentId = "1"
fields = { name = "前端开发组", code = "FE" }

[[request]]
operation = "update"
node_id = "2"
fields = { status = "disabled" }

[[request]]
operation = "search"
query = "前端"

[[request]]
operation = "flatten"
"#,
        )
        .unwrap();

        assert_eq!(script.requests.len(), 5);
        assert_eq!(
            script.requests[1],
            Request::Insert {
                parent_id: Some(NodeId::from("1")),
                fields: DepartmentFields::new("前端开发组", "FE"),
            }
        );
        match &script.requests[2] {
            Request::Update { node_id, fields } => {
                assert_eq!(node_id.as_str(), "2");
                assert_eq!(fields.status, Some(crate::domain::Status::Disabled));
                assert!(fields.name.is_none());
            }
            other => panic!("unexpected request: {other:?}"),
        }
        assert_eq!(script.requests[4], Request::Flatten);
    }

    #[test]
    fn given_domain_error_when_converting_then_kind_and_id_preserved() {
        let response = Response::from(Err::<Payload, _>(DomainError::NotFound(NodeId::from("7"))));
        match response {
            Response::Error(err) => {
                assert_eq!(err.kind, ErrorKind::NotFound);
                assert_eq!(err.id, Some(NodeId::from("7")));
                assert_eq!(err.max, None);
            }
            Response::Ok(_) => panic!("expected error"),
        }
    }

    #[test]
    fn given_depth_exceeded_when_converting_then_limit_is_a_field() {
        let response = Response::from(Err::<Payload, _>(DomainError::DepthExceeded {
            max: crate::domain::MAX_DEPTH,
        }));
        match response {
            Response::Error(err) => {
                assert_eq!(err.kind, ErrorKind::DepthExceeded);
                assert_eq!(err.id, None);
                assert_eq!(err.max, Some(6));
            }
            Response::Ok(_) => panic!("expected error"),
        }
    }
}
