//! Turns a finished job's artifacts into local files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use showreel_core::artifact::{Artifact, ArtifactSource};
use showreel_core::error::CoreError;
use showreel_core::naming::artifact_filename;
use showreel_veo::storage::ObjectStore;

/// The parts of an artifact name that are fixed for one job.
#[derive(Debug, Clone, Copy)]
pub struct ArtifactNaming<'a> {
    pub brand_prefix: &'a str,
    pub scenario_id: &'a str,
    pub source_stem: &'a str,
}

impl ArtifactNaming<'_> {
    pub fn filename(&self, index: usize, artifact: &Artifact) -> String {
        artifact_filename(
            self.brand_prefix,
            self.scenario_id,
            self.source_stem,
            index,
            artifact.extension(),
        )
    }
}

/// Turns finished-job artifacts into local files, copying remote objects
/// through an [`ObjectStore`] and decoding inline payloads.
pub struct Materializer {
    store: Arc<dyn ObjectStore>,
}

impl Materializer {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Write every artifact under `dest_dir`.
    ///
    /// Returns one result per artifact, in artifact order. A failing
    /// artifact does not stop its siblings.
    pub async fn materialize(
        &self,
        artifacts: &[Artifact],
        naming: &ArtifactNaming<'_>,
        dest_dir: &Path,
    ) -> Vec<Result<PathBuf, CoreError>> {
        if let Err(e) = tokio::fs::create_dir_all(dest_dir).await {
            let message = format!("cannot create {}: {e}", dest_dir.display());
            return (0..artifacts.len())
                .map(|index| {
                    Err(CoreError::Materialization {
                        index,
                        message: message.clone(),
                    })
                })
                .collect();
        }

        let mut results = Vec::with_capacity(artifacts.len());
        for (index, artifact) in artifacts.iter().enumerate() {
            let target = dest_dir.join(naming.filename(index, artifact));
            let result = self
                .write_one(artifact, &target)
                .await
                .map(|()| target)
                .map_err(|e| CoreError::Materialization {
                    index,
                    message: e.to_string(),
                });

            match &result {
                Ok(path) => tracing::info!(index, path = %path.display(), "Saved artifact"),
                Err(e) => tracing::warn!(index, error = %e, "Artifact not saved"),
            }
            results.push(result);
        }
        results
    }

    async fn write_one(&self, artifact: &Artifact, target: &Path) -> Result<(), CoreError> {
        match &artifact.source {
            ArtifactSource::Remote { uri } => self.store.copy(uri, target).await,
            ArtifactSource::Inline { base64 } => {
                let bytes = STANDARD
                    .decode(base64.as_bytes())
                    .map_err(|e| CoreError::Validation(format!("invalid base64 payload: {e}")))?;
                tokio::fs::write(target, bytes).await?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use async_trait::async_trait;

    use super::*;

    /// Writes the URI as file content, fails for URIs containing "missing".
    #[derive(Default)]
    struct FakeStore {
        copied: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ObjectStore for FakeStore {
        async fn copy(&self, remote_uri: &str, local_path: &Path) -> Result<(), CoreError> {
            if remote_uri.contains("missing") {
                return Err(CoreError::Transport("404".into()));
            }
            self.copied.lock().unwrap().push(remote_uri.to_string());
            tokio::fs::write(local_path, remote_uri).await?;
            Ok(())
        }
    }

    fn naming() -> ArtifactNaming<'static> {
        ArtifactNaming {
            brand_prefix: "TURAN",
            scenario_id: "brand_trust",
            source_stem: "lux_white",
        }
    }

    #[tokio::test]
    async fn writes_remote_and_inline_artifacts_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FakeStore::default());
        let materializer = Materializer::new(store.clone());

        let artifacts = vec![
            Artifact::remote("gs://b/sample_0.mp4", Some("video/mp4".into())),
            Artifact::inline(STANDARD.encode(b"inline-video"), None),
        ];
        let results = materializer
            .materialize(&artifacts, &naming(), dir.path())
            .await;

        let paths: Vec<PathBuf> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(
            paths,
            vec![
                dir.path().join("turan_brand_trust_lux_white_v0.mp4"),
                dir.path().join("turan_brand_trust_lux_white_v1.mp4"),
            ]
        );
        assert_eq!(std::fs::read(&paths[1]).unwrap(), b"inline-video");
        assert_eq!(store.copied.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failures_are_scoped_to_one_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let materializer = Materializer::new(Arc::new(FakeStore::default()));

        let artifacts = vec![
            Artifact::remote("gs://b/missing.mp4", None),
            Artifact::inline("not base64!!", None),
            Artifact::remote("gs://b/ok.mp4", None),
        ];
        let results = materializer
            .materialize(&artifacts, &naming(), dir.path())
            .await;

        assert_matches!(&results[0], Err(CoreError::Materialization { index: 0, .. }));
        assert_matches!(&results[1], Err(CoreError::Materialization { index: 1, .. }));
        assert!(results[2].is_ok());
    }

    #[tokio::test]
    async fn creates_destination_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("tiktok").join("run");
        let materializer = Materializer::new(Arc::new(FakeStore::default()));

        let results = materializer
            .materialize(
                &[Artifact::inline(STANDARD.encode(b"x"), None)],
                &naming(),
                &nested,
            )
            .await;
        assert!(results[0].is_ok());
        assert!(nested.is_dir());
    }

    #[test]
    fn sibling_names_differ_only_by_index() {
        let artifact = Artifact::remote("gs://b/o", None);
        let a = naming().filename(0, &artifact);
        let b = naming().filename(1, &artifact);
        assert_eq!(a.strip_suffix("0.mp4"), b.strip_suffix("1.mp4"));
        assert_ne!(a, b);
    }
}
