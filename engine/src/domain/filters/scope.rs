//! Named query scopes applied by the `scope` directive

use std::collections::HashMap;

use serde_json::Value;

use crate::data::error::{FilterError, FilterResult};
use crate::data::query::QueryBuilder;
use crate::utils::string::to_method_name;

/// Applies a pre-registered query modifier by name
pub trait ScopeInvoker: Send + Sync {
    fn invoke(&self, builder: &mut dyn QueryBuilder, scope: &str, args: &Value) -> FilterResult<()>;
}

type ScopeFn = Box<dyn Fn(&mut dyn QueryBuilder, &Value) -> FilterResult<()> + Send + Sync>;

/// In-memory [`ScopeInvoker`]
///
/// Names are looked up as given, then in method-name casing
/// (`recently_published` finds `recentlyPublished`).
#[derive(Default)]
pub struct ScopeRegistry {
    scopes: HashMap<String, ScopeFn>,
}

impl ScopeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(mut self, name: impl Into<String>, scope: F) -> Self
    where
        F: Fn(&mut dyn QueryBuilder, &Value) -> FilterResult<()> + Send + Sync + 'static,
    {
        self.scopes.insert(name.into(), Box::new(scope));
        self
    }

    fn lookup(&self, name: &str) -> Option<&ScopeFn> {
        self.scopes
            .get(name)
            .or_else(|| self.scopes.get(&to_method_name(name)))
    }
}

impl ScopeInvoker for ScopeRegistry {
    fn invoke(&self, builder: &mut dyn QueryBuilder, scope: &str, args: &Value) -> FilterResult<()> {
        let f = self
            .lookup(scope)
            .ok_or_else(|| FilterError::UnknownScope(scope.to_string()))?;
        tracing::trace!(scope, entity = ?builder.entity(), "Applying scope");
        f(builder, args)
    }
}
