//! Artifact materialization.
//!
//! After a deep run completes, chart files written by the visualization
//! worker are scanned from the fixed visualization roots, deduplicated by
//! canonical path, and base64-encoded into [`ImageArtifact`]s for the
//! terminal result.

use std::collections::HashSet;
use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{debug, warn};

use reagent_core::result::ImageArtifact;

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "svg"];

/// Scans visualization directories into encoded image artifacts.
pub struct ArtifactMaterializer {
    roots: Vec<PathBuf>,
}

impl ArtifactMaterializer {
    /// Materializer over the standard roots under an output directory:
    /// `visualizations/` and the nested `output/visualizations/` some chart
    /// writers use.
    #[must_use]
    pub fn for_output_dir(output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        Self {
            roots: vec![
                output_dir.join("visualizations"),
                output_dir.join("output").join("visualizations"),
            ],
        }
    }

    fn mime_for(ext: &str) -> String {
        if ext.eq_ignore_ascii_case("svg") {
            "image/svg+xml".to_string()
        } else {
            format!("image/{}", ext.to_ascii_lowercase())
        }
    }

    /// Collect all images under the roots, sorted by file name.
    ///
    /// Unreadable files are skipped with a warning; a missing root is not
    /// an error.
    pub async fn collect(&self) -> Vec<ImageArtifact> {
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut images = Vec::new();

        for root in &self.roots {
            let mut dir = match tokio::fs::read_dir(root).await {
                Ok(dir) => dir,
                Err(_) => continue,
            };
            while let Ok(Some(entry)) = dir.next_entry().await {
                let path = entry.path();
                let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                    continue;
                };
                if !IMAGE_EXTENSIONS
                    .iter()
                    .any(|e| ext.eq_ignore_ascii_case(e))
                {
                    continue;
                }
                let canonical = tokio::fs::canonicalize(&path)
                    .await
                    .unwrap_or_else(|_| path.clone());
                if !seen.insert(canonical) {
                    continue;
                }
                match tokio::fs::read(&path).await {
                    Ok(bytes) => {
                        let filename = path
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default();
                        debug!(file = %filename, bytes = bytes.len(), "encoded image");
                        images.push(ImageArtifact {
                            filename,
                            mime_type: Self::mime_for(ext),
                            base64: BASE64.encode(&bytes),
                            size_bytes: bytes.len() as u64,
                        });
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "could not process image");
                    }
                }
            }
        }

        images.sort_by(|a, b| a.filename.cmp(&b.filename));
        images
    }
}
