//! Model manifest: the JSON file naming every trained model the service
//! serves, loaded once before the listener is bound.
//!
//! ```json
//! { "kind": "single", "model": { "estimator": { "type": "linear", ... } } }
//!
//! { "kind": "ensemble",
//!   "batches": [
//!     { "models": [ { "name": "rf", "estimator": { ... } },
//!                   { "name": "svm", "scaler": { ... }, "estimator": { ... } } ] },
//!     { "name": "late", "models": [ { "name": "mlp", "estimator": { ... } } ] }
//!   ] }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;
use serde::Deserialize;

use super::estimator::Pipeline;
use super::Classifier;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read model manifest at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse model manifest at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("model '{model}' is invalid: {reason}")]
    InvalidModel { model: String, reason: String },
    #[error("ensemble manifest has no batches")]
    NoBatches,
    #[error("batch {index} has no models")]
    EmptyBatch { index: usize },
    #[error("batch {index} has more than one model named '{name}'")]
    DuplicateModel { index: usize, name: String },
}

// ---------------------------------------------------------------------------
// On-disk schema
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Manifest {
    Single {
        model: Pipeline,
    },
    Ensemble {
        #[serde(default)]
        expected_features: Option<usize>,
        batches: Vec<BatchSpec>,
    },
}

#[derive(Debug, Deserialize)]
struct BatchSpec {
    #[serde(default)]
    name: Option<String>,
    models: Vec<MemberSpec>,
}

#[derive(Debug, Deserialize)]
struct MemberSpec {
    name: String,
    #[serde(flatten)]
    model: Pipeline,
}

// ---------------------------------------------------------------------------
// Loaded model set
// ---------------------------------------------------------------------------

/// Whether the service runs one model or an ensemble of batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Single,
    Ensemble,
}

/// One classifier inside a batch. Single-model sets carry one unnamed member.
#[derive(Clone)]
pub struct BatchMember {
    pub name: Option<String>,
    pub classifier: Arc<dyn Classifier>,
}

/// A named group of classifiers evaluated together.
#[derive(Clone)]
pub struct Batch {
    pub name: String,
    pub members: Vec<BatchMember>,
}

/// Every classifier the service serves, plus the width uploads are aligned to.
#[derive(Clone)]
pub struct ModelSet {
    kind: ModelKind,
    expected_features: usize,
    batches: Vec<Batch>,
}

impl ModelSet {
    /// Wrap one classifier as a single batch with one unnamed member.
    pub fn single(classifier: Arc<dyn Classifier>) -> Self {
        let expected_features = classifier.expected_features();
        Self {
            kind: ModelKind::Single,
            expected_features,
            batches: vec![Batch {
                name: "Batch1".into(),
                members: vec![BatchMember {
                    name: None,
                    classifier,
                }],
            }],
        }
    }

    /// Build an ensemble. Without an explicit width the first member's
    /// `expected_features()` is used.
    pub fn ensemble(
        batches: Vec<Batch>,
        expected_features: Option<usize>,
    ) -> Result<Self, ManifestError> {
        if batches.is_empty() {
            return Err(ManifestError::NoBatches);
        }
        if let Some(index) = batches.iter().position(|b| b.members.is_empty()) {
            return Err(ManifestError::EmptyBatch { index: index + 1 });
        }
        for (i, batch) in batches.iter().enumerate() {
            let mut seen = HashSet::new();
            for name in batch.members.iter().filter_map(|m| m.name.as_deref()) {
                if !seen.insert(name) {
                    return Err(ManifestError::DuplicateModel {
                        index: i + 1,
                        name: name.to_string(),
                    });
                }
            }
        }
        let expected_features = expected_features
            .unwrap_or_else(|| batches[0].members[0].classifier.expected_features());

        Ok(Self {
            kind: ModelKind::Ensemble,
            expected_features,
            batches,
        })
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn expected_features(&self) -> usize {
        self.expected_features
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Total number of classifiers across all batches.
    pub fn model_count(&self) -> usize {
        self.batches.iter().map(|b| b.members.len()).sum()
    }
}

impl std::fmt::Debug for ModelSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSet")
            .field("kind", &self.kind)
            .field("expected_features", &self.expected_features)
            .field("models", &self.model_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Read and validate a model manifest. Any failure here is fatal: the
/// service never starts with a partially loaded model set.
pub fn load_models(path: &Path) -> Result<ModelSet, ManifestError> {
    let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let manifest: Manifest = serde_json::from_str(&text).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let models = build(manifest)?;
    info!(
        "loaded {} model(s) from {} ({:?}, {} features)",
        models.model_count(),
        path.display(),
        models.kind(),
        models.expected_features()
    );
    Ok(models)
}

fn build(manifest: Manifest) -> Result<ModelSet, ManifestError> {
    match manifest {
        Manifest::Single { model } => {
            validate("model", &model)?;
            Ok(ModelSet::single(Arc::new(model)))
        }
        Manifest::Ensemble {
            expected_features,
            batches,
        } => {
            let batches = batches
                .into_iter()
                .enumerate()
                .map(|(i, spec)| {
                    let members = spec
                        .models
                        .into_iter()
                        .map(|m| {
                            validate(&m.name, &m.model)?;
                            Ok(BatchMember {
                                name: Some(m.name),
                                classifier: Arc::new(m.model) as Arc<dyn Classifier>,
                            })
                        })
                        .collect::<Result<Vec<_>, ManifestError>>()?;
                    Ok(Batch {
                        name: spec.name.unwrap_or_else(|| format!("Batch{}", i + 1)),
                        members,
                    })
                })
                .collect::<Result<Vec<_>, ManifestError>>()?;
            ModelSet::ensemble(batches, expected_features)
        }
    }
}

fn validate(name: &str, model: &Pipeline) -> Result<(), ManifestError> {
    model.validate().map_err(|reason| ManifestError::InvalidModel {
        model: name.to_string(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_manifest(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    const LINEAR_2: &str =
        r#""estimator": {"type": "linear", "classes": [0, 1], "coefficients": [[1.0, 1.0]], "intercepts": [0.0]}"#;
    const CENTROID_3: &str =
        r#""estimator": {"type": "nearest_centroid", "classes": [0, 1], "centroids": [[0, 0, 0], [1, 1, 1]]}"#;

    #[test]
    fn single_manifest_becomes_one_unnamed_member() {
        let file = write_manifest(&format!(r#"{{"kind": "single", "model": {{{LINEAR_2}}}}}"#));
        let models = load_models(file.path()).unwrap();

        assert_eq!(models.kind(), ModelKind::Single);
        assert_eq!(models.expected_features(), 2);
        assert_eq!(models.batches().len(), 1);
        assert!(models.batches()[0].members[0].name.is_none());
    }

    #[test]
    fn ensemble_width_defaults_to_first_member() {
        let json = format!(
            r#"{{"kind": "ensemble", "batches": [
                {{"models": [{{"name": "rf", {LINEAR_2}}}, {{"name": "svm", {CENTROID_3}}}]}},
                {{"name": "late", "models": [{{"name": "mlp", {LINEAR_2}}}]}}
            ]}}"#
        );
        let models = load_models(write_manifest(&json).path()).unwrap();

        assert_eq!(models.kind(), ModelKind::Ensemble);
        assert_eq!(models.expected_features(), 2);
        assert_eq!(models.model_count(), 3);
        assert_eq!(models.batches()[0].name, "Batch1");
        assert_eq!(models.batches()[1].name, "late");
    }

    #[test]
    fn ensemble_width_can_be_declared() {
        let json = format!(
            r#"{{"kind": "ensemble", "expected_features": 3, "batches": [{{"models": [{{"name": "rf", {LINEAR_2}}}]}}]}}"#
        );
        let models = load_models(write_manifest(&json).path()).unwrap();
        assert_eq!(models.expected_features(), 3);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_models(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = load_models(write_manifest("{not json").path()).unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
    }

    #[test]
    fn invalid_member_names_the_model() {
        let json = r#"{"kind": "ensemble", "batches": [{"models": [
            {"name": "svm", "estimator": {"type": "linear", "classes": [0, 1, 2], "coefficients": [[1.0]], "intercepts": [0.0]}}
        ]}]}"#;
        match load_models(write_manifest(json).path()).unwrap_err() {
            ManifestError::InvalidModel { model, .. } => assert_eq!(model, "svm"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_batches_are_rejected() {
        let no_batches = r#"{"kind": "ensemble", "batches": []}"#;
        assert!(matches!(
            load_models(write_manifest(no_batches).path()).unwrap_err(),
            ManifestError::NoBatches
        ));

        let empty = format!(
            r#"{{"kind": "ensemble", "batches": [{{"models": [{{"name": "rf", {LINEAR_2}}}]}}, {{"models": []}}]}}"#
        );
        assert!(matches!(
            load_models(write_manifest(&empty).path()).unwrap_err(),
            ManifestError::EmptyBatch { index: 2 }
        ));
    }

    #[test]
    fn duplicate_names_in_one_batch_are_rejected() {
        let json = format!(
            r#"{{"kind": "ensemble", "batches": [
                {{"models": [{{"name": "rf", {LINEAR_2}}}]}},
                {{"models": [{{"name": "rf", {LINEAR_2}}}, {{"name": "rf", {CENTROID_3}}}]}}
            ]}}"#
        );
        match load_models(write_manifest(&json).path()).unwrap_err() {
            ManifestError::DuplicateModel { index, name } => {
                assert_eq!((index, name.as_str()), (2, "rf"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn same_name_in_different_batches_is_allowed() {
        let json = format!(
            r#"{{"kind": "ensemble", "batches": [
                {{"models": [{{"name": "rf", {LINEAR_2}}}]}},
                {{"models": [{{"name": "rf", {LINEAR_2}}}]}}
            ]}}"#
        );
        let models = load_models(write_manifest(&json).path()).unwrap();
        assert_eq!(models.model_count(), 2);
    }
}
