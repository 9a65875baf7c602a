//! Chunked settlement against the external settlement collaborator.
//!
//! A sub-batch of `n` operations is sent in windows of
//! [`chunk_size(n)`](crate::chunk_sizer::chunk_size). A single working
//! buffer is reused across windows and never holds more than one window,
//! so peak memory is bounded by the chunk size rather than `n`.
//!
//! Calls are strictly sequential: each window is settled and its results
//! spliced into place before the next is issued. If any call fails, the
//! whole submission fails and no results are returned.

use fisher_types::{FisherError, Result, SettlementClient, SignedOperation};

use crate::chunk_sizer::chunk_size;

/// Outcome of settling one sub-batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkReport {
    /// One flag per input operation, in input order.
    pub results: Vec<bool>,
    /// Window size used.
    pub chunk_size: usize,
    /// Number of `settle` calls issued.
    pub calls: usize,
    /// Longest slice passed to a single `settle` call.
    pub max_call_len: usize,
}

impl ChunkReport {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|ok| **ok).count()
    }
}

/// Drives windowed `settle` calls with a reusable buffer.
#[derive(Debug, Default)]
pub struct ChunkedSettler {
    buffer: Vec<SignedOperation>,
    chunking: bool,
}

impl ChunkedSettler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            chunking: true,
        }
    }

    /// With `chunking == false` the whole sub-batch goes out in one call.
    #[must_use]
    pub fn with_chunking(chunking: bool) -> Self {
        Self {
            buffer: Vec::new(),
            chunking,
        }
    }

    /// Current working buffer capacity.
    #[must_use]
    pub fn buffer_capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Window size this settler would use for `n` operations.
    #[must_use]
    pub fn window_for(&self, n: usize) -> usize {
        if self.chunking { chunk_size(n) } else { n }
    }

    /// Settle `operations` window by window.
    pub fn settle(
        &mut self,
        client: &mut dyn SettlementClient,
        operations: &[&SignedOperation],
    ) -> Result<ChunkReport> {
        let n = operations.len();
        let window = self.window_for(n);
        let mut report = ChunkReport {
            results: vec![false; n],
            chunk_size: window,
            calls: 0,
            max_call_len: 0,
        };
        if n == 0 {
            return Ok(report);
        }

        self.buffer.clear();
        self.buffer.shrink_to(window);

        let mut start = 0;
        while start < n {
            let end = (start + window).min(n);

            self.buffer.clear();
            self.buffer
                .extend(operations[start..end].iter().map(|op| (*op).clone()));

            let outcome = client.settle(&self.buffer).map_err(|e| {
                tracing::warn!(start, end, error = %e, "Settlement chunk failed");
                FisherError::SettlementFailed {
                    start,
                    end,
                    reason: e.to_string(),
                }
            });
            let chunk_results = match outcome {
                Ok(r) => r,
                Err(e) => {
                    self.buffer.clear();
                    return Err(e);
                }
            };
            if chunk_results.len() != end - start {
                self.buffer.clear();
                return Err(FisherError::SettlementResultMismatch {
                    expected: end - start,
                    actual: chunk_results.len(),
                });
            }

            report.results[start..end].copy_from_slice(&chunk_results);
            report.calls += 1;
            report.max_call_len = report.max_call_len.max(end - start);

            tracing::debug!(
                start,
                end,
                ok = chunk_results.iter().filter(|ok| **ok).count(),
                "Settled chunk"
            );
            start = end;
        }

        self.buffer.clear();
        Ok(report)
    }
}
