//! Middleware composition.

use crate::error::{JobError, JobResult};
use crate::handler::{Handler, Middleware};
use std::fmt;

/// Ordered middlewares wrapped around a terminal handler.
///
/// The first registered middleware is the outermost one: it runs first on the
/// way in and last on the way out.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    middlewares: Vec<Middleware>,
    terminal: Option<Handler>,
}

impl MiddlewareChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the handler that performs the actual job work.
    pub fn set_terminal_handler(&mut self, handler: Handler) {
        self.terminal = Some(handler);
    }

    /// Appends a middleware.
    pub fn use_middleware(&mut self, middleware: Middleware) {
        self.middlewares.push(middleware);
    }

    /// Number of registered middlewares.
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    /// Returns true if no middleware is registered.
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Composes the current middlewares around the terminal handler.
    ///
    /// Composition is recomputed on every call.
    pub fn build(&self) -> JobResult<Handler> {
        let terminal = self
            .terminal
            .clone()
            .ok_or_else(|| JobError::Configuration("Middleware chain has no terminal handler".into()))?;

        Ok(self
            .middlewares
            .iter()
            .rev()
            .fold(terminal, |inner, middleware| middleware(inner)))
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("middlewares", &self.middlewares.len())
            .field("has_terminal", &self.terminal.is_some())
            .finish()
    }
}
