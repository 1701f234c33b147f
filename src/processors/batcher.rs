use crate::error::{Result, UploadError};

/// Splits an item stream into order-preserving batches of at most `batch_size`.
#[derive(Debug, Clone, Copy)]
pub struct Batcher {
    batch_size: usize,
}

impl Batcher {
    pub fn new(batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(UploadError::Config(
                "Batch size must be at least 1".to_string(),
            ));
        }
        Ok(Self { batch_size })
    }

    /// Batcher bounded by a service's per-request item cap
    pub fn with_limit(batch_size: usize, limit: usize) -> Result<Self> {
        if batch_size > limit {
            return Err(UploadError::Config(format!(
                "Batch size {} exceeds the service limit of {}",
                batch_size, limit
            )));
        }
        Self::new(batch_size)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn batches<I: IntoIterator>(&self, items: I) -> Batches<I::IntoIter> {
        Batches {
            inner: items.into_iter(),
            batch_size: self.batch_size,
        }
    }

    /// Number of batches produced for `items` inputs
    pub fn batch_count(&self, items: usize) -> usize {
        items.div_ceil(self.batch_size)
    }
}

/// Lazy batch iterator; only the batch being built is held in memory.
pub struct Batches<I> {
    inner: I,
    batch_size: usize,
}

impl<I: Iterator> Iterator for Batches<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch: Vec<I::Item> = self.inner.by_ref().take(self.batch_size).collect();
        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }
}
