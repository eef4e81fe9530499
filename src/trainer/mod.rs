use crate::{
    dataset::Dataset,
    loss::Loss,
    model::{ParamOps, TrainableModel},
    optimizer::Optimizer,
    regularizers::Regularizer,
};
use ndarray::{Array1, Array2};
use std::marker::PhantomData;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("dataset is empty")]
    EmptyDataset,
    #[error("dataset length unknown")]
    UnknownLength,
    #[error("data error: {0}")]
    Data(String),
    #[error("invalid hyperparameter: {0}")]
    InvalidHyperparameter(String),
    #[error("training diverged: {0}")]
    Diverged(String),
}

// --- Trainer (immutable after build) ---
pub struct Trainer<L, O, M, P, R>
where
    L: Loss,
    M: TrainableModel<Params = P, Gradients = P>,
    O: Optimizer<P>,
    R: Regularizer<M>,
{
    pub(crate) batch_size: usize,
    pub(crate) max_epochs: usize,
    pub(crate) verbose: bool,
    pub(crate) loss_fn: L,
    pub(crate) optimizer: O,
    pub(crate) regularizer: R,
    _phantom_model: PhantomData<M>,
}

// --- Builder ---
pub struct TrainerBuilder<L, O, M, P, R>
where
    L: Loss,
    M: TrainableModel<Params = P, Gradients = P>,
    O: Optimizer<P>,
    R: Regularizer<M>,
{
    batch_size: usize,
    max_epochs: usize,
    verbose: bool,
    loss_fn: L,
    optimizer: O,
    regularizer: R,
    _phantom_model: PhantomData<M>,
}

impl<L, O, M, P, R> TrainerBuilder<L, O, M, P, R>
where
    L: Loss,
    M: TrainableModel<Params = P, Gradients = P>,
    O: Optimizer<P>,
    R: Regularizer<M>,
{
    pub fn new(loss_fn: L, optimizer: O, regularizer: R) -> Self {
        Self {
            batch_size: 32,
            max_epochs: 1000,
            verbose: true,
            loss_fn,
            optimizer,
            regularizer,
            _phantom_model: PhantomData,
        }
    }

    /// Samples per gradient step; 0 means the whole dataset in one batch.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn max_epochs(mut self, epochs: usize) -> Self {
        self.max_epochs = epochs;
        self
    }

    /// Per-epoch loss at debug level.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn build(self) -> Trainer<L, O, M, P, R> {
        Trainer {
            batch_size: self.batch_size,
            max_epochs: self.max_epochs,
            verbose: self.verbose,
            loss_fn: self.loss_fn,
            optimizer: self.optimizer,
            regularizer: self.regularizer,
            _phantom_model: PhantomData,
        }
    }
}

impl<L, O, M, P, R> Trainer<L, O, M, P, R>
where
    L: Loss<Target = Array1<f64>, Prediction = Array1<f64>>,
    M: TrainableModel<Input = Array2<f64>, Prediction = L::Prediction, Params = P, Gradients = P>,
    O: Optimizer<P>,
    R: Regularizer<M>,
    P: ParamOps,
{
    /// Runs mini-batch gradient descent for `max_epochs` epochs.
    ///
    /// Each step minimizes data loss plus the regularizer penalty. Fails with
    /// [`TrainingError::Diverged`] as soon as an epoch loss is not finite.
    pub fn fit<D>(&self, mut model: M, dataset: &D) -> Result<M::Output, TrainingError>
    where
        D: Dataset,
    {
        let n_total = dataset.len().ok_or(TrainingError::UnknownLength)?;
        if n_total == 0 {
            return Err(TrainingError::EmptyDataset);
        }
        let batch_size = if self.batch_size == 0 {
            n_total
        } else {
            self.batch_size
        };

        let mut last_loss = f64::NAN;
        for epoch in 0..self.max_epochs {
            let mut total_loss = 0.0;
            for batch_result in dataset.batches(batch_size) {
                let (batch_x, batch_y) =
                    batch_result.map_err(|e| TrainingError::Data(format!("{e:?}")))?;
                let weight = batch_y.len() as f64;

                let preds = model.forward(&batch_x);
                let (reg_penalty, reg_grad) = self.regularizer.regularizer_penalty_grad(&model);
                total_loss += (self.loss_fn.loss(&preds, &batch_y) + reg_penalty) * weight;

                let grad_preds = self.loss_fn.grad_wrt_prediction(&preds, &batch_y);
                let grads = model.backward(&batch_x, &grad_preds);
                let total_grads = grads.add(&reg_grad);
                let stepped = self.optimizer.step(model.params(), &total_grads);
                let new_params = self
                    .regularizer
                    .proximal(stepped, self.optimizer.learning_rate());
                model.update_params(&new_params);
            }

            let avg_loss = total_loss / n_total as f64;
            if !avg_loss.is_finite() {
                return Err(TrainingError::Diverged(format!(
                    "loss is {avg_loss} at epoch {epoch}; lower the learning rate"
                )));
            }
            if self.verbose {
                debug!(epoch, loss = avg_loss, "epoch finished");
            }
            last_loss = avg_loss;
        }

        info!(epochs = self.max_epochs, loss = last_loss, "training finished");
        Ok(model.into_fitted())
    }
}

impl<L, O, M, P, R> Trainer<L, O, M, P, R>
where
    L: Loss,
    M: TrainableModel<Params = P, Gradients = P>,
    O: Optimizer<P>,
    R: Regularizer<M>,
{
    pub fn builder(loss_fn: L, optimizer: O, regularizer: R) -> TrainerBuilder<L, O, M, P, R> {
        TrainerBuilder::new(loss_fn, optimizer, regularizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::InMemoryDataset;
    use crate::loss::MSELoss;
    use crate::model::linear::LinearRegression;
    use crate::model::InferenceModel;
    use crate::optimizer::SGD;
    use crate::regularizers::{NoRegularizer, L1, L2};
    use ndarray::array;

    fn line_dataset() -> InMemoryDataset {
        // y = 2x + 1
        let x = array![[0.0], [1.0], [2.0], [3.0], [4.0]];
        let y = array![1.0, 3.0, 5.0, 7.0, 9.0];
        InMemoryDataset::new(x, y).unwrap()
    }

    #[test]
    fn test_fit_recovers_line() {
        let trainer = Trainer::builder(MSELoss, SGD::new(0.05), NoRegularizer)
            .batch_size(0)
            .max_epochs(5000)
            .verbose(false)
            .build();
        let fitted = trainer.fit(LinearRegression::new(1), &line_dataset()).unwrap();
        assert!((fitted.weights()[0] - 2.0).abs() < 1e-3);
        assert!((fitted.bias() - 1.0).abs() < 1e-3);
        assert!((fitted.predict(&array![10.0]) - 21.0).abs() < 1e-2);
    }

    #[test]
    fn test_minibatch_fit_converges() {
        let trainer = Trainer::builder(MSELoss, SGD::new(0.02), NoRegularizer)
            .batch_size(2)
            .max_epochs(3000)
            .verbose(false)
            .build();
        let fitted = trainer.fit(LinearRegression::new(1), &line_dataset()).unwrap();
        assert!((fitted.weights()[0] - 2.0).abs() < 1e-2);
    }

    #[test]
    fn test_l1_shrinks_weights() {
        let plain = Trainer::builder(MSELoss, SGD::new(0.05), NoRegularizer)
            .batch_size(0)
            .max_epochs(2000)
            .verbose(false)
            .build()
            .fit(LinearRegression::new(1), &line_dataset())
            .unwrap();
        let lasso = Trainer::builder(MSELoss, SGD::new(0.05), L1::new(0.5))
            .batch_size(0)
            .max_epochs(2000)
            .verbose(false)
            .build()
            .fit(LinearRegression::new(1), &line_dataset())
            .unwrap();
        assert!(lasso.weights()[0].abs() < plain.weights()[0].abs());
    }

    #[test]
    fn test_l1_zeroes_irrelevant_feature() {
        // second column is orthogonal to the centered first one and to y
        let x = array![[0.0, 1.0], [1.0, -1.0], [2.0, 1.0], [3.0, -1.0], [4.0, 1.0]];
        let y = array![1.0, 3.0, 5.0, 7.0, 9.0];
        let ds = InMemoryDataset::new(x, y).unwrap();
        let lasso = Trainer::builder(MSELoss, SGD::new(0.05), L1::new(0.5))
            .batch_size(0)
            .max_epochs(3000)
            .verbose(false)
            .build()
            .fit(LinearRegression::new(2), &ds)
            .unwrap();
        assert_eq!(lasso.weights()[1], 0.0);
        assert!(lasso.weights()[0] > 1.0);
    }

    #[test]
    fn test_l2_shrinks_weights() {
        let ridge = Trainer::builder(MSELoss, SGD::new(0.05), L2::new(1.0))
            .batch_size(0)
            .max_epochs(2000)
            .verbose(false)
            .build()
            .fit(LinearRegression::new(1), &line_dataset())
            .unwrap();
        assert!(ridge.weights()[0] < 2.0);
        assert!(ridge.weights()[0] > 0.0);
    }

    #[test]
    fn test_divergence_is_reported() {
        let x = array![[100.0], [200.0], [300.0]];
        let y = array![1.0, 2.0, 3.0];
        let ds = InMemoryDataset::new(x, y).unwrap();
        let trainer = Trainer::builder(MSELoss, SGD::new(10.0), NoRegularizer)
            .batch_size(0)
            .max_epochs(500)
            .verbose(false)
            .build();
        let err = trainer.fit(LinearRegression::new(1), &ds).unwrap_err();
        assert!(matches!(err, TrainingError::Diverged(_)));
    }
}
