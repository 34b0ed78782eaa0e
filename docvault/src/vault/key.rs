// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use docvault_base::bad_request;
use docvault_base::error::VaultError;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Kind of element a vault file is attached to, the second segment of a file path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Documents,
    Templates,
    Parts,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Documents => "documents",
            ElementType::Templates => "templates",
            ElementType::Parts => "parts",
        }
    }

    /// Number of path segments including the workspace, the type and the file name.
    pub(crate) fn segment_count(&self) -> usize {
        match self {
            ElementType::Documents | ElementType::Parts => 6,
            ElementType::Templates => 4,
        }
    }
}

impl FromStr for ElementType {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "documents" => Ok(ElementType::Documents),
            "templates" => Ok(ElementType::Templates),
            "parts" => Ok(ElementType::Parts),
            _ => Err(bad_request!("Unknown element type '{}'", s)),
        }
    }
}

impl Display for ElementType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Iteration of a document: workspace, document master id, version and iteration number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentIterationKey {
    pub workspace_id: String,
    pub document_master_id: String,
    pub version: String,
    pub iteration: u32,
}

impl DocumentIterationKey {
    pub fn new(workspace_id: &str, document_master_id: &str, version: &str, iteration: u32) -> Self {
        Self {
            workspace_id: workspace_id.to_string(),
            document_master_id: document_master_id.to_string(),
            version: version.to_string(),
            iteration,
        }
    }
}

impl Display for DocumentIterationKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            self.workspace_id,
            ElementType::Documents,
            self.document_master_id,
            self.version,
            self.iteration
        )
    }
}

/// Iteration of a part: workspace, part number, version and iteration number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartIterationKey {
    pub workspace_id: String,
    pub part_master_number: String,
    pub version: String,
    pub iteration: u32,
}

impl PartIterationKey {
    pub fn new(workspace_id: &str, part_master_number: &str, version: &str, iteration: u32) -> Self {
        Self {
            workspace_id: workspace_id.to_string(),
            part_master_number: part_master_number.to_string(),
            version: version.to_string(),
            iteration,
        }
    }
}

impl Display for PartIterationKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            self.workspace_id,
            ElementType::Parts,
            self.part_master_number,
            self.version,
            self.iteration
        )
    }
}

/// Document template of a workspace, templates are not versioned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentMasterTemplateKey {
    pub workspace_id: String,
    pub id: String,
}

impl DocumentMasterTemplateKey {
    pub fn new(workspace_id: &str, id: &str) -> Self {
        Self {
            workspace_id: workspace_id.to_string(),
            id: id.to_string(),
        }
    }
}

impl Display for DocumentMasterTemplateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.workspace_id, ElementType::Templates, self.id)
    }
}

/// Owner of a vault file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VaultKey {
    Document(DocumentIterationKey),
    Template(DocumentMasterTemplateKey),
    Part(PartIterationKey),
}

impl VaultKey {
    /// Documents and parts are immutable once iterated, clients may cache their files.
    pub fn is_versioned(&self) -> bool {
        !matches!(self, VaultKey::Template(_))
    }
}

impl Display for VaultKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            VaultKey::Document(key) => key.fmt(f),
            VaultKey::Template(key) => key.fmt(f),
            VaultKey::Part(key) => key.fmt(f),
        }
    }
}
