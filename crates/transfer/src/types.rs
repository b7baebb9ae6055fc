use std::collections::HashSet;

use partwise_protocol::ManifestPart;

use crate::TransferError;
use crate::plan::PartSpec;

/// Outcome of one successfully uploaded part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartResult {
    pub part_number: u32,
    /// Storage-assigned identifier (the part's ETag). Never empty.
    pub etag: String,
    /// Bytes transferred for this part.
    pub bytes: u64,
}

/// Ordered list of part identifiers submitted to finalize an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadManifest {
    parts: Vec<ManifestPart>,
}

impl UploadManifest {
    /// Builds the manifest from results collected in any completion order.
    ///
    /// Fails unless there is exactly one non-empty result per planned part.
    pub fn assemble(plan: &[PartSpec], mut results: Vec<PartResult>) -> Result<Self, TransferError> {
        let planned: HashSet<u32> = plan.iter().map(|p| p.part_number).collect();
        let mut seen = HashSet::with_capacity(results.len());

        for result in &results {
            if !planned.contains(&result.part_number) {
                return Err(TransferError::Manifest(format!(
                    "part {} was not planned",
                    result.part_number
                )));
            }
            if !seen.insert(result.part_number) {
                return Err(TransferError::Manifest(format!(
                    "duplicate result for part {}",
                    result.part_number
                )));
            }
            if result.etag.is_empty() {
                return Err(TransferError::Manifest(format!(
                    "part {} has no identifier",
                    result.part_number
                )));
            }
        }

        if seen.len() != planned.len() {
            let mut missing: Vec<u32> = planned.difference(&seen).copied().collect();
            missing.sort_unstable();
            return Err(TransferError::Manifest(format!("missing parts {missing:?}")));
        }

        results.sort_by_key(|r| r.part_number);
        let parts = results
            .into_iter()
            .map(|r| ManifestPart {
                etag: r.etag,
                part_number: r.part_number,
            })
            .collect();
        Ok(Self { parts })
    }

    pub fn parts(&self) -> &[ManifestPart] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<ManifestPart> {
        self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}
