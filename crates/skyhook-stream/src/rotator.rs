//! Ordered endpoint set with a cursor and a wrap counter.

use std::sync::Arc;

use crate::{StreamError, StreamResult};

/// Result of advancing the rotator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rotation {
    pub from: usize,
    pub to: usize,
    /// `true` when the cursor wrapped back to index 0.
    pub wrapped: bool,
}

/// Walks an immutable endpoint list front to back, counting full passes.
#[derive(Debug, Clone)]
pub struct EndpointRotator {
    endpoints: Arc<[String]>,
    index: usize,
    cycles: u32,
}

impl EndpointRotator {
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidConfig`] when `endpoints` is empty.
    pub fn new(endpoints: Vec<String>) -> StreamResult<Self> {
        if endpoints.is_empty() {
            return Err(StreamError::InvalidConfig(vec![
                "endpoints must not be empty".to_string(),
            ]));
        }
        Ok(Self {
            endpoints: endpoints.into(),
            index: 0,
            cycles: 0,
        })
    }

    #[must_use]
    pub fn current(&self) -> &str {
        &self.endpoints[self.index]
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Completed passes over the list since the last reset.
    #[must_use]
    pub const fn cycles(&self) -> u32 {
        self.cycles
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    #[must_use]
    pub fn endpoints(&self) -> Arc<[String]> {
        Arc::clone(&self.endpoints)
    }

    /// Move to the next endpoint. A single-endpoint set rotates onto itself,
    /// which counts as a wrap.
    pub fn advance(&mut self) -> Rotation {
        let from = self.index;
        let to = (self.index + 1) % self.endpoints.len();
        let wrapped = to == 0;
        if wrapped {
            self.cycles = self.cycles.saturating_add(1);
        }
        self.index = to;
        Rotation { from, to, wrapped }
    }

    /// Forget completed passes after a successful connection.
    pub const fn reset_cycles(&mut self) {
        self.cycles = 0;
    }
}
