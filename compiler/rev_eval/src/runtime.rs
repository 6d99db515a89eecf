//! Session-wide services every evaluation step can reach.

use rev_ir::SharedInterner;

use crate::print_handler::{PrintHandlerImpl, SharedPrintHandler};
use crate::registry::Registry;
use crate::shared::SharedRegistry;
use crate::types::TypeTable;

/// Default bound on nested user-function calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Registry, interner and output sink of one session.
///
/// Cloning shares everything; deterministic nodes hold a clone so they can
/// recompute after the statement that built them has returned.
#[derive(Clone)]
pub struct Runtime {
    registry: SharedRegistry<Registry>,
    interner: SharedInterner,
    print: SharedPrintHandler,
    max_call_depth: Option<usize>,
}

impl Runtime {
    pub fn new(
        registry: SharedRegistry<Registry>,
        interner: SharedInterner,
        print: SharedPrintHandler,
    ) -> Self {
        Runtime {
            registry,
            interner,
            print,
            max_call_depth: Some(DEFAULT_MAX_CALL_DEPTH),
        }
    }

    /// Bound nested user-function calls; `None` removes the bound.
    #[must_use]
    pub fn with_max_call_depth(mut self, limit: Option<usize>) -> Self {
        self.max_call_depth = limit;
        self
    }

    #[inline]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[inline]
    pub fn types(&self) -> &TypeTable {
        self.registry.types()
    }

    #[inline]
    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    #[inline]
    pub fn print_handler(&self) -> &PrintHandlerImpl {
        &self.print
    }

    pub fn shared_print_handler(&self) -> &SharedPrintHandler {
        &self.print
    }

    pub fn max_call_depth(&self) -> Option<usize> {
        self.max_call_depth
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("types", &self.types().len())
            .field("max_call_depth", &self.max_call_depth)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
impl Runtime {
    /// Runtime with the core library installed and output captured.
    #[allow(clippy::unwrap_used, reason = "the core library always installs")]
    pub(crate) fn for_tests() -> Self {
        let mut builder = Registry::builder();
        builder.install(&crate::library::CorePlugin).unwrap();
        Runtime::new(
            SharedRegistry::new(builder.build()),
            SharedInterner::default(),
            crate::print_handler::buffer_handler(),
        )
    }
}
