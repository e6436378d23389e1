use crate::data::model::Label;

/// How many rows were predicted as class `0` and class `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassSummary {
    pub count_0: usize,
    pub count_1: usize,
}

impl ClassSummary {
    /// Count labels `0` and `1`; any other label is ignored.
    pub fn from_labels(labels: &[Label]) -> Self {
        labels
            .iter()
            .fold(Self::default(), |mut acc, label| {
                match label.as_i64() {
                    Some(0) => acc.count_0 += 1,
                    Some(1) => acc.count_1 += 1,
                    _ => {}
                }
                acc
            })
    }
}
