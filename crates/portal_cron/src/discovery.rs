//! Job discovery: one descriptor file in the jobs directory = one job.

use crate::CronError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A job found in the jobs directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    /// Bare file stem, used to look the job up in the table.
    pub name: String,
    /// `<namespace>::<name>`, used in progress output.
    pub qualified_name: String,
    pub path: PathBuf,
}

/// Lists every `*.<extension>` file in `directory`.
///
/// The result is sorted by name, so discovering twice over an unchanged
/// directory yields the same list. Subdirectories and files with other
/// extensions are ignored.
pub async fn discover_jobs(
    directory: &Path,
    extension: &str,
    namespace: &str,
) -> Result<Vec<JobDescriptor>, CronError> {
    let mut entries = tokio::fs::read_dir(directory)
        .await
        .map_err(|e| CronError::Discovery {
            path: directory.to_path_buf(),
            source: e,
        })?;

    let mut descriptors = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(|e| CronError::Discovery {
        path: directory.to_path_buf(),
        source: e,
    })? {
        let path = entry.path();

        let is_file = entry
            .file_type()
            .await
            .map(|file_type| file_type.is_file())
            .unwrap_or(false);
        if !is_file {
            continue;
        }

        if path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
            continue;
        }

        let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
            warn!("Skipping job file with a non UTF-8 name: {}", path.display());
            continue;
        };
        if name.is_empty() {
            continue;
        }

        debug!("Discovered job {} at {}", name, path.display());
        descriptors.push(JobDescriptor {
            name: name.to_string(),
            qualified_name: qualify(namespace, name),
            path: path.clone(),
        });
    }

    descriptors.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(descriptors)
}

fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", namespace, name)
    }
}
