//! # Introspector
//!
//! Read-only view over a [`ModelManager`] for code that should inspect the
//! schema but never register anything.

use crate::declaration::ClassDeclaration;
use crate::error::Result;
use crate::registry::ModelManager;

/// Query façade over the declarations of one business network.
#[derive(Debug, Clone, Copy)]
pub struct Introspector<'a> {
    models: &'a ModelManager,
}

impl<'a> Introspector<'a> {
    pub fn new(models: &'a ModelManager) -> Self {
        Self { models }
    }

    /// All declarations, in registration order.
    pub fn get_class_declarations(&self) -> &'a [ClassDeclaration] {
        self.models.class_declarations()
    }

    /// The declaration registered under `fqn`, or `TypeNotFound`.
    pub fn get_class_declaration(&self, fqn: &str) -> Result<&'a ClassDeclaration> {
        self.models.get_class_declaration(fqn)
    }

    pub fn model_manager(&self) -> &'a ModelManager {
        self.models
    }
}
