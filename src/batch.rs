//! Sequential batch generation with per-entity failure isolation

use log::{error, info};
use serde::Serialize;

use crate::bulletin::{generate_bulletin_with, GeneratedDocument};
use crate::config::RenderOptions;
use crate::content::provider_for;
use crate::image_embed::ImageEmbedder;
use crate::model::{OrganizationRecord, StudentRecord};

/// One entity that produced no document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    /// Position in the input list.
    pub index: usize,
    pub entity_id: Option<u64>,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct BatchOutput {
    /// Input position and document, in input order.
    pub documents: Vec<(usize, GeneratedDocument)>,
    pub failures: Vec<BatchFailure>,
}

impl BatchOutput {
    /// Documents only, in the relative order of the successful inputs.
    pub fn into_documents(self) -> Vec<GeneratedDocument> {
        self.documents.into_iter().map(|(_, doc)| doc).collect()
    }
}

pub fn generate_bulletins_with(
    students: &[StudentRecord],
    org: &OrganizationRecord,
    options: &RenderOptions,
    embedder: &ImageEmbedder,
) -> BatchOutput {
    let provider = provider_for(options);
    let mut output = BatchOutput::default();
    for (index, student) in students.iter().enumerate() {
        match generate_bulletin_with(student, org, options, embedder, provider.as_ref()) {
            Ok(doc) => output.documents.push((index, doc)),
            Err(err) => {
                error!(
                    "bulletin {} (student {:?}) failed and was skipped: {}",
                    index, student.id, err
                );
                output.failures.push(BatchFailure {
                    index,
                    entity_id: student.id,
                    message: err.to_string(),
                });
            }
        }
    }
    info!(
        "batch finished: {} generated, {} failed",
        output.documents.len(),
        output.failures.len()
    );
    output
}

/// Render one bulletin per student; a failing student is logged and skipped.
pub fn generate_bulletins(
    students: &[StudentRecord],
    org: &OrganizationRecord,
    options: &RenderOptions,
) -> BatchOutput {
    generate_bulletins_with(students, org, options, &ImageEmbedder::from_options(options))
}
