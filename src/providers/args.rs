//! Arguments passed to provider operations.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::providers::capability::Capability;
use crate::providers::context::DispatchContext;
use crate::providers::error::ProviderResult;
use crate::providers::module::ProviderModule;

/// An operation of a module bound to the dispatch context it was resolved with.
#[derive(Clone)]
pub struct BoundOperation {
    capability: Capability,
    module: Arc<dyn ProviderModule>,
    ctx: DispatchContext,
}

impl BoundOperation {
    pub(crate) fn new(
        capability: Capability,
        module: Arc<dyn ProviderModule>,
        ctx: DispatchContext,
    ) -> Self {
        Self {
            capability,
            module,
            ctx,
        }
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Invoke the operation with the shared context.
    pub async fn call(&self, args: Vec<ProviderArg>) -> ProviderResult<Value> {
        self.module.invoke(self.capability, &self.ctx, args).await
    }
}

impl fmt::Debug for BoundOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundOperation")
            .field("module", &self.module.key())
            .field("capability", &self.capability)
            .finish()
    }
}

/// Positional argument of a provider operation
#[derive(Debug, Clone)]
pub enum ProviderArg {
    Value(Value),
    /// Continuation substituted for a string naming another operation
    Operation(BoundOperation),
}

impl ProviderArg {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Operation(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_value().and_then(Value::as_f64)
    }

    pub fn as_operation(&self) -> Option<&BoundOperation> {
        match self {
            Self::Operation(op) => Some(op),
            Self::Value(_) => None,
        }
    }
}

impl From<Value> for ProviderArg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}
