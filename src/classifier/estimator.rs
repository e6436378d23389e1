use serde::{Deserialize, Serialize};

use super::{check_input, Classifier, ClassifierError};
use crate::data::model::{Dataset, Label};

// ---------------------------------------------------------------------------
// StandardScaler – optional preprocessing step
// ---------------------------------------------------------------------------

/// Per-feature standardisation: `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    fn validate(&self) -> Result<(), String> {
        if self.mean.len() != self.scale.len() {
            return Err(format!(
                "scaler has {} means but {} scales",
                self.mean.len(),
                self.scale.len()
            ));
        }
        if self.scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
            return Err("scaler scales must be finite and non-zero".into());
        }
        Ok(())
    }

    fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Linear decision function
// ---------------------------------------------------------------------------

/// A linear classifier such as logistic regression or a linear SVM.
///
/// With a single coefficient row and two classes the sign of the score picks
/// the class (`> 0` → `classes[1]`); otherwise one row per class and the
/// highest score wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub classes: Vec<Label>,
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

impl LinearModel {
    fn width(&self) -> usize {
        self.coefficients.first().map_or(0, Vec::len)
    }

    fn validate(&self) -> Result<(), String> {
        let binary = self.classes.len() == 2 && self.coefficients.len() == 1;
        if !binary && self.coefficients.len() != self.classes.len() {
            return Err(format!(
                "{} coefficient rows for {} classes",
                self.coefficients.len(),
                self.classes.len()
            ));
        }
        if self.intercepts.len() != self.coefficients.len() {
            return Err(format!(
                "{} intercepts for {} coefficient rows",
                self.intercepts.len(),
                self.coefficients.len()
            ));
        }
        if self.coefficients.iter().any(|r| r.len() != self.width()) {
            return Err("coefficient rows differ in length".into());
        }
        Ok(())
    }

    fn predict_row(&self, row: &[f64]) -> Label {
        let scores = self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(w, b)| w.iter().zip(row).map(|(w, x)| w * x).sum::<f64>() + b);

        let winner = if self.coefficients.len() == 1 && self.classes.len() == 2 {
            usize::from(scores.sum::<f64>() > 0.0)
        } else {
            argmax(scores)
        };
        self.classes[winner].clone()
    }
}

// ---------------------------------------------------------------------------
// Nearest centroid
// ---------------------------------------------------------------------------

/// Assigns each row to the class whose centroid is closest (Euclidean).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestCentroid {
    pub classes: Vec<Label>,
    pub centroids: Vec<Vec<f64>>,
}

impl NearestCentroid {
    fn width(&self) -> usize {
        self.centroids.first().map_or(0, Vec::len)
    }

    fn validate(&self) -> Result<(), String> {
        if self.centroids.len() != self.classes.len() {
            return Err(format!(
                "{} centroids for {} classes",
                self.centroids.len(),
                self.classes.len()
            ));
        }
        if self.centroids.iter().any(|c| c.len() != self.width()) {
            return Err("centroids differ in length".into());
        }
        Ok(())
    }

    fn predict_row(&self, row: &[f64]) -> Label {
        let closeness = self.centroids.iter().map(|c| {
            -c.iter()
                .zip(row)
                .map(|(c, x)| (c - x).powi(2))
                .sum::<f64>()
        });
        self.classes[argmax(closeness)].clone()
    }
}

/// Index of the largest value; ties go to the earliest index.
fn argmax(values: impl Iterator<Item = f64>) -> usize {
    let mut best = (0, f64::NEG_INFINITY);
    for (i, v) in values.enumerate() {
        if v > best.1 {
            best = (i, v);
        }
    }
    best.0
}

// ---------------------------------------------------------------------------
// Pipeline – scaler + estimator, the unit a manifest entry describes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Estimator {
    Linear(LinearModel),
    NearestCentroid(NearestCentroid),
}

impl Estimator {
    fn width(&self) -> usize {
        match self {
            Estimator::Linear(m) => m.width(),
            Estimator::NearestCentroid(m) => m.width(),
        }
    }

    fn classes(&self) -> &[Label] {
        match self {
            Estimator::Linear(m) => &m.classes,
            Estimator::NearestCentroid(m) => &m.classes,
        }
    }

    fn predict_row(&self, row: &[f64]) -> Label {
        match self {
            Estimator::Linear(m) => m.predict_row(row),
            Estimator::NearestCentroid(m) => m.predict_row(row),
        }
    }
}

/// A trained model: optional standardisation followed by an estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler: Option<StandardScaler>,
    pub estimator: Estimator,
}

impl Pipeline {
    /// Check internal shape consistency.
    pub fn validate(&self) -> Result<(), String> {
        if self.estimator.classes().is_empty() {
            return Err("estimator has no classes".into());
        }
        match &self.estimator {
            Estimator::Linear(m) => m.validate()?,
            Estimator::NearestCentroid(m) => m.validate()?,
        }
        if let Some(scaler) = &self.scaler {
            scaler.validate()?;
            if scaler.mean.len() != self.estimator.width() {
                return Err(format!(
                    "scaler expects {} features but estimator expects {}",
                    scaler.mean.len(),
                    self.estimator.width()
                ));
            }
        }
        Ok(())
    }
}

impl Classifier for Pipeline {
    fn expected_features(&self) -> usize {
        self.estimator.width()
    }

    fn predict(&self, dataset: &Dataset) -> Result<Vec<Label>, ClassifierError> {
        check_input(dataset, self.expected_features())?;
        let labels = dataset
            .rows()
            .iter()
            .map(|row| match &self.scaler {
                Some(scaler) => self.estimator.predict_row(&scaler.transform(row)),
                None => self.estimator.predict_row(row),
            })
            .collect();
        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn dataset(rows: Vec<Vec<f64>>) -> Dataset {
        let width = rows.first().map_or(0, Vec::len);
        Dataset::new((0..width).map(|i| format!("f{i}")).collect(), rows).unwrap()
    }

    #[fixture]
    fn binary_linear() -> Pipeline {
        Pipeline {
            scaler: None,
            estimator: Estimator::Linear(LinearModel {
                classes: vec![Label::Integer(0), Label::Integer(1)],
                coefficients: vec![vec![1.0, -1.0]],
                intercepts: vec![0.0],
            }),
        }
    }

    #[rstest]
    fn binary_linear_uses_score_sign(binary_linear: Pipeline) {
        let ds = dataset(vec![vec![2.0, 1.0], vec![1.0, 2.0], vec![1.0, 1.0]]);
        assert_eq!(
            binary_linear.predict(&ds).unwrap(),
            vec![Label::Integer(1), Label::Integer(0), Label::Integer(0)]
        );
    }

    #[rstest]
    fn wrong_width_is_a_classifier_error(binary_linear: Pipeline) {
        let ds = dataset(vec![vec![1.0, 2.0, 3.0]]);
        assert_eq!(
            binary_linear.predict(&ds),
            Err(ClassifierError::FeatureMismatch {
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn multiclass_linear_takes_argmax() {
        let model = Pipeline {
            scaler: None,
            estimator: Estimator::Linear(LinearModel {
                classes: vec!["rest".into(), "left".into(), "right".into()],
                coefficients: vec![vec![0.0], vec![-1.0], vec![1.0]],
                intercepts: vec![0.5, 0.0, 0.0],
            }),
        };
        model.validate().unwrap();
        let ds = dataset(vec![vec![0.0], vec![-3.0], vec![3.0]]);
        assert_eq!(
            model.predict(&ds).unwrap(),
            vec![Label::from("rest"), Label::from("left"), Label::from("right")]
        );
    }

    #[test]
    fn scaler_is_applied_before_the_estimator() {
        let model = Pipeline {
            scaler: Some(StandardScaler {
                mean: vec![10.0],
                scale: vec![2.0],
            }),
            estimator: Estimator::NearestCentroid(NearestCentroid {
                classes: vec![Label::Integer(0), Label::Integer(1)],
                centroids: vec![vec![-1.0], vec![1.0]],
            }),
        };
        model.validate().unwrap();
        let ds = dataset(vec![vec![8.0], vec![12.5]]);
        assert_eq!(
            model.predict(&ds).unwrap(),
            vec![Label::Integer(0), Label::Integer(1)]
        );
    }

    #[rstest]
    #[case::class_count(r#"{"estimator": {"type": "linear", "classes": [0, 1, 2], "coefficients": [[1.0]], "intercepts": [0.0]}}"#)]
    #[case::intercepts(r#"{"estimator": {"type": "linear", "classes": [0, 1], "coefficients": [[1.0]], "intercepts": []}}"#)]
    #[case::scaler_width(r#"{"scaler": {"mean": [0.0, 0.0], "scale": [1.0, 1.0]}, "estimator": {"type": "nearest_centroid", "classes": [0], "centroids": [[1.0]]}}"#)]
    #[case::zero_scale(r#"{"scaler": {"mean": [0.0], "scale": [0.0]}, "estimator": {"type": "nearest_centroid", "classes": [0], "centroids": [[1.0]]}}"#)]
    #[case::no_classes(r#"{"estimator": {"type": "nearest_centroid", "classes": [], "centroids": []}}"#)]
    fn inconsistent_pipelines_fail_validation(#[case] json: &str) {
        let pipeline: Pipeline = serde_json::from_str(json).unwrap();
        assert!(pipeline.validate().is_err());
    }
}
