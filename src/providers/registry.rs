//! Provider name resolution and method dispatch.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::api::ApiGateway;
use crate::providers::args::{BoundOperation, ProviderArg};
use crate::providers::capability::Capability;
use crate::providers::context::DispatchContext;
use crate::providers::error::{ProviderError, ProviderResult};
use crate::providers::module::ProviderModule;

/// Provider aliases and the module key each resolves to.
pub const DEFAULT_DESCRIPTORS: &[(&str, &str)] = &[
    ("hacksaw-gaming", "hacksaw"),
    ("backseat-gaming", "hacksaw"),
    ("bullshark-games", "hacksaw"),
    ("bullshark games", "hacksaw"),
    ("pragmatic-play", "pragma"),
    ("pragmatic play", "pragma"),
    ("playn-go", "pngo"),
    ("play'n go", "pngo"),
    ("titan gaming", "twist"),
    ("titan-gaming", "twist"),
    ("twist gaming", "twist"),
    ("twist-gaming", "twist"),
    ("truelab", "truelab"),
];

/// Lowercase, with every space and apostrophe replaced by `-`.
pub fn normalize_provider_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ' ' | '\'' => '-',
            other => other,
        })
        .collect::<String>()
        .to_lowercase()
}

/// Result of loading a provider module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedModule {
    pub provider: String,
    pub module_key: String,
    /// Implemented operations with their introspection text
    pub operations: BTreeMap<Capability, String>,
}

/// Maps provider names to registered modules.
pub struct ProviderRegistry {
    gateway: ApiGateway,
    descriptors: HashMap<String, String>,
    modules: HashMap<String, Arc<dyn ProviderModule>>,
}

impl ProviderRegistry {
    /// Registry with the default descriptor table and no modules.
    pub fn new(gateway: ApiGateway) -> Self {
        let mut registry = Self::empty(gateway);
        for (alias, key) in DEFAULT_DESCRIPTORS {
            registry.register_alias(alias, key);
        }
        registry
    }

    pub fn empty(gateway: ApiGateway) -> Self {
        Self {
            gateway,
            descriptors: HashMap::new(),
            modules: HashMap::new(),
        }
    }

    /// Map `alias` (normalized on insert) to `module_key`.
    pub fn register_alias(&mut self, alias: &str, module_key: &str) {
        self.descriptors
            .insert(normalize_provider_name(alias), module_key.to_string());
    }

    /// Register a module under its own key.
    pub fn register_module(&mut self, module: Arc<dyn ProviderModule>) {
        tracing::debug!(key = module.key(), "Registering provider module");
        self.modules.insert(module.key().to_string(), module);
    }

    /// Module key for `provider_name`, if any alias matches.
    pub fn module_key(&self, provider_name: &str) -> Option<&str> {
        self.descriptors
            .get(&normalize_provider_name(provider_name))
            .map(String::as_str)
    }

    fn resolve(&self, provider_name: &str) -> ProviderResult<(String, Arc<dyn ProviderModule>)> {
        let key = self.module_key(provider_name).ok_or_else(|| {
            tracing::warn!(provider = provider_name, "Unsupported provider");
            ProviderError::UnsupportedProvider(provider_name.to_string())
        })?;

        let module = self.modules.get(key).cloned().ok_or_else(|| {
            tracing::error!(provider = provider_name, key, "Provider module not registered");
            ProviderError::ModuleNotFound(key.to_string())
        })?;

        Ok((key.to_string(), module))
    }

    /// List the operations the provider's module implements.
    pub fn load_provider_module(&self, provider_name: &str) -> ProviderResult<LoadedModule> {
        let (module_key, module) = self.resolve(provider_name)?;

        let operations = Capability::ALL
            .into_iter()
            .filter(|c| module.implements(*c))
            .map(|c| (c, module.describe(c)))
            .collect();

        Ok(LoadedModule {
            provider: provider_name.to_string(),
            module_key,
            operations,
        })
    }

    /// Invoke `method` on the provider's module.
    ///
    /// String arguments naming an operation the module implements are replaced
    /// by that operation, bound to the same dispatch context.
    pub async fn execute_provider_method(
        &self,
        provider_name: &str,
        method: &str,
        args: Vec<Value>,
    ) -> ProviderResult<Value> {
        if provider_name.trim().is_empty() {
            return Err(ProviderError::ProviderUndefined);
        }

        let (module_key, module) = self.resolve(provider_name)?;

        let capability = Capability::from_name(method)
            .filter(|c| module.implements(*c))
            .ok_or_else(|| ProviderError::MethodNotFound {
                provider: provider_name.to_string(),
                method: method.to_string(),
            })?;

        let ctx = DispatchContext::new(self.gateway.clone());
        let args = bind_arguments(&module, &ctx, args);

        tracing::debug!(
            provider = provider_name,
            module = %module_key,
            method,
            "Dispatching provider method"
        );
        module.invoke(capability, &ctx, args).await
    }
}

fn bind_arguments(
    module: &Arc<dyn ProviderModule>,
    ctx: &DispatchContext,
    args: Vec<Value>,
) -> Vec<ProviderArg> {
    args.into_iter()
        .map(|arg| {
            let operation = arg
                .as_str()
                .and_then(Capability::from_name)
                .filter(|c| module.implements(*c));
            match operation {
                Some(capability) => ProviderArg::Operation(BoundOperation::new(
                    capability,
                    module.clone(),
                    ctx.clone(),
                )),
                None => ProviderArg::Value(arg),
            }
        })
        .collect()
}
