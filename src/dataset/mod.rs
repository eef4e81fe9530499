//! Dataset abstractions.
//!
//! - [`Dataset`]: uniform batch access to `(X, y)` pairs for the trainer.
//! - [`InMemoryDataset`]: a dense, already-preprocessed matrix and target.
//! - [`TabularDataset`]: a named table with a target column and a persisted
//!   train/test split.

pub mod memory;
pub mod tabular;

pub use memory::InMemoryDataset;
pub use tabular::{DatasetError, Split, TabularDataset};

use ndarray::{Array1, Array2};
use std::fmt::Debug;
use std::ops::Range;

/// A source of `(X, y)` pairs, `X` of shape `(n_samples, n_features)`.
pub trait Dataset {
    type Error: Debug + 'static;

    /// Number of samples, if known.
    fn len(&self) -> Option<usize>;

    fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Iterator over consecutive batches; the last one may be smaller.
    fn batches(&self, batch_size: usize) -> DatasetBatchIter<'_, Self>
    where
        Self: Sized,
    {
        DatasetBatchIter {
            dataset: self,
            batch_size: batch_size.max(1),
            current: 0,
        }
    }

    /// Loads samples `[start, end)`.
    fn get_batch(&self, range: Range<usize>) -> Result<(Array2<f64>, Array1<f64>), Self::Error>;
}

/// Iterator over dataset batches, created by [`Dataset::batches`].
pub struct DatasetBatchIter<'a, D: ?Sized> {
    dataset: &'a D,
    batch_size: usize,
    current: usize,
}

impl<'a, D: Dataset> Iterator for DatasetBatchIter<'a, D> {
    type Item = Result<(Array2<f64>, Array1<f64>), D::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let total = self.dataset.len()?;
        if self.current >= total {
            return None;
        }
        let end = (self.current + self.batch_size).min(total);
        let range = self.current..end;
        self.current = end;
        Some(self.dataset.get_batch(range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockDataset {
        len: usize,
    }

    impl Dataset for MockDataset {
        type Error = &'static str;

        fn len(&self) -> Option<usize> {
            Some(self.len)
        }

        fn get_batch(&self, range: Range<usize>) -> Result<(Array2<f64>, Array1<f64>), Self::Error> {
            let n = range.len();
            Ok((Array2::zeros((n, 1)), Array1::zeros(n)))
        }
    }

    fn batch_sizes(ds: &MockDataset, size: usize) -> Vec<usize> {
        ds.batches(size).map(|b| b.unwrap().1.len()).collect()
    }

    #[test]
    fn test_batches_partial_last() {
        assert_eq!(batch_sizes(&MockDataset { len: 10 }, 4), vec![4, 4, 2]);
    }

    #[test]
    fn test_batches_larger_than_dataset() {
        assert_eq!(batch_sizes(&MockDataset { len: 3 }, 32), vec![3]);
    }

    #[test]
    fn test_batches_empty_dataset() {
        let ds = MockDataset { len: 0 };
        assert!(ds.is_empty());
        assert!(batch_sizes(&ds, 4).is_empty());
    }
}
