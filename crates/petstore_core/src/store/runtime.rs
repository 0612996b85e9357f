//! Blocking bridge for the async drivers.
//!
//! The catalog API is synchronous; the sqlx and sea-orm adapters drive their
//! futures on a private current-thread runtime. Calling these adapters from
//! inside another tokio runtime panics, as with any nested `block_on`.

use super::{StoreError, StoreResult};
use std::future::Future;
use tokio::runtime::{Builder, Runtime};

pub(crate) struct BlockingRuntime {
    inner: Runtime,
}

impl BlockingRuntime {
    pub(crate) fn new() -> StoreResult<Self> {
        let inner = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(StoreError::Runtime)?;
        Ok(Self { inner })
    }

    pub(crate) fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.inner.block_on(future)
    }
}
