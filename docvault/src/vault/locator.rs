// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::vault::key::{
    DocumentIterationKey, DocumentMasterTemplateKey, ElementType, PartIterationKey, VaultKey,
};
use docvault_base::bad_request;
use docvault_base::error::VaultError;
use percent_encoding::percent_decode_str;

/// A vault file addressed by a request path.
#[derive(Debug, Clone, PartialEq)]
pub struct VaultLocator {
    pub key: VaultKey,
    pub file_name: String,
}

impl VaultLocator {
    /// Decode `{workspace}/{documents|templates|parts}/{...ids}/{file}`.
    ///
    /// Empty entries are skipped and every segment is percent-decoded before it is checked.
    pub fn parse(path: &str) -> Result<Self, VaultError> {
        let segments = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(decode_segment)
            .collect::<Result<Vec<String>, VaultError>>()?;

        if segments.len() < 2 {
            return Err(bad_request!("Path '{}' doesn't address a vault file", path));
        }

        let element_type: ElementType = segments[1].parse()?;
        let expected = element_type.segment_count();
        if segments.len() != expected {
            return Err(bad_request!(
                "Path for {} must have {} segments, got {}",
                element_type,
                expected,
                segments.len()
            ));
        }

        let workspace_id = &segments[0];
        let file_name = segments[expected - 1].clone();
        let key = match element_type {
            ElementType::Documents => VaultKey::Document(DocumentIterationKey::new(
                workspace_id,
                &segments[2],
                &segments[3],
                parse_iteration(&segments[4])?,
            )),
            ElementType::Parts => VaultKey::Part(PartIterationKey::new(
                workspace_id,
                &segments[2],
                &segments[3],
                parse_iteration(&segments[4])?,
            )),
            ElementType::Templates => {
                VaultKey::Template(DocumentMasterTemplateKey::new(workspace_id, &segments[2]))
            }
        };

        Ok(VaultLocator { key, file_name })
    }

    /// Name of the file in the vault, e.g. `ws/documents/DOC-1/A/1/drawing.pdf`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.key, self.file_name)
    }
}

fn decode_segment(segment: &str) -> Result<String, VaultError> {
    let decoded = percent_decode_str(segment)
        .decode_utf8()
        .map_err(|_| bad_request!("Path segment '{}' isn't valid UTF-8", segment))?;

    if decoded == "." || decoded == ".." || decoded.contains('/') || decoded.contains('\\') {
        return Err(bad_request!("Invalid path segment '{}'", segment));
    }

    Ok(decoded.into_owned())
}

fn parse_iteration(segment: &str) -> Result<u32, VaultError> {
    segment
        .parse()
        .map_err(|_| bad_request!("Invalid iteration '{}'", segment))
}
