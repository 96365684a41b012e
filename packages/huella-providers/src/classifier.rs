//! On-device image classification behind a lazily loaded, process-wide model.

use std::{
	future::Future,
	sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::OnceCell;

use huella_domain::labels::Prediction;

use crate::{BoxFuture, Result};

pub trait LocalClassifier: Send + Sync {
	/// Ranked class guesses for one encoded image, most probable first.
	fn classify<'a>(&'a self, image: &'a [u8]) -> BoxFuture<'a, Result<Vec<Prediction>>>;
}

/// Holds at most one loaded model.
///
/// Concurrent first callers share a single initialization. [`ModelCache::teardown`] drops the
/// model; the next caller loads a fresh one.
pub struct ModelCache<M> {
	slot: Mutex<Arc<OnceCell<Arc<M>>>>,
}
impl<M> ModelCache<M>
where
	M: Send + Sync,
{
	pub fn new() -> Self {
		Self { slot: Mutex::new(Arc::new(OnceCell::new())) }
	}

	pub async fn get_or_init<F, Fut>(&self, init: F) -> Result<Arc<M>>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<M>>,
	{
		let cell = self.current();
		let model = cell.get_or_try_init(|| async move { init().await.map(Arc::new) }).await?;

		Ok(Arc::clone(model))
	}

	pub fn is_loaded(&self) -> bool {
		self.current().initialized()
	}

	/// Releases the model. Returns whether one was loaded.
	///
	/// Callers already holding the model keep their handle until they drop it.
	pub fn teardown(&self) -> bool {
		let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
		let was_loaded = slot.initialized();

		*slot = Arc::new(OnceCell::new());

		if was_loaded {
			tracing::info!("Local classifier model released.");
		}

		was_loaded
	}

	fn current(&self) -> Arc<OnceCell<Arc<M>>> {
		Arc::clone(&self.slot.lock().unwrap_or_else(PoisonError::into_inner))
	}
}
impl<M> Default for ModelCache<M>
where
	M: Send + Sync,
{
	fn default() -> Self {
		Self::new()
	}
}

pub type ModelLoader<M> = Arc<dyn Fn() -> BoxFuture<'static, Result<M>> + Send + Sync>;

/// A classifier whose model is loaded on first use through a [`ModelCache`].
pub struct LazyClassifier<M> {
	cache: ModelCache<M>,
	loader: ModelLoader<M>,
}
impl<M> LazyClassifier<M>
where
	M: LocalClassifier,
{
	pub fn new(loader: ModelLoader<M>) -> Self {
		Self { cache: ModelCache::new(), loader }
	}

	pub fn is_loaded(&self) -> bool {
		self.cache.is_loaded()
	}

	pub fn teardown(&self) -> bool {
		self.cache.teardown()
	}
}
impl<M> LocalClassifier for LazyClassifier<M>
where
	M: LocalClassifier,
{
	fn classify<'a>(&'a self, image: &'a [u8]) -> BoxFuture<'a, Result<Vec<Prediction>>> {
		Box::pin(async move {
			let model = self
				.cache
				.get_or_init(|| {
					tracing::info!("Loading local classifier model.");

					(self.loader)()
				})
				.await?;

			model.classify(image).await
		})
	}
}
