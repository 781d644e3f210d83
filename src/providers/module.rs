//! Capability contract of a provider module.

use async_trait::async_trait;
use serde_json::Value;

use crate::providers::args::ProviderArg;
use crate::providers::capability::Capability;
use crate::providers::context::DispatchContext;
use crate::providers::error::ProviderResult;

/// Betting logic for one game studio.
///
/// A module implements any subset of [`Capability`]; the registry only
/// dispatches to capabilities listed by [`capabilities`](Self::capabilities).
#[async_trait]
pub trait ProviderModule: Send + Sync {
    /// Key the provider descriptors refer to (e.g. `"hacksaw"`).
    fn key(&self) -> &str;

    fn capabilities(&self) -> &[Capability];

    fn implements(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Introspection text shown in capability listings.
    fn describe(&self, capability: Capability) -> String {
        format!("async fn {}(ctx, ...args)", capability)
    }

    async fn invoke(
        &self,
        capability: Capability,
        ctx: &DispatchContext,
        args: Vec<ProviderArg>,
    ) -> ProviderResult<Value>;
}
