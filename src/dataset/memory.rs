use crate::dataset::Dataset;
use ndarray::{s, Array1, Array2};
use std::ops::Range;

/// Dense features and targets held in memory.
#[derive(Clone, Debug)]
pub struct InMemoryDataset {
    x: Array2<f64>,
    y: Array1<f64>,
}

impl InMemoryDataset {
    pub fn new(x: Array2<f64>, y: Array1<f64>) -> Result<Self, String> {
        if x.nrows() != y.len() {
            return Err(format!(
                "x has {} rows but y has {} values",
                x.nrows(),
                y.len()
            ));
        }
        if x.nrows() == 0 {
            return Err("Dataset is empty".into());
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err("target contains missing or non-finite values".into());
        }
        Ok(Self { x, y })
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }
}

impl Dataset for InMemoryDataset {
    type Error = std::convert::Infallible;

    fn len(&self) -> Option<usize> {
        Some(self.x.nrows())
    }

    fn get_batch(&self, range: Range<usize>) -> Result<(Array2<f64>, Array1<f64>), Self::Error> {
        let end = range.end.min(self.x.nrows());
        let start = range.start.min(end);
        Ok((
            self.x.slice(s![start..end, ..]).to_owned(),
            self.y.slice(s![start..end]).to_owned(),
        ))
    }
}
