//! Provider dispatch module.
//!
//! Each game studio's betting protocol lives in a [`ProviderModule`]. The
//! [`ProviderRegistry`] resolves a provider name through its alias table,
//! lists the operations a module implements and invokes them with a fresh
//! [`DispatchContext`].
//!
//! ```rust,ignore
//! let mut registry = ProviderRegistry::new(gateway);
//! registry.register_module(Arc::new(HacksawModule::default()));
//!
//! let loaded = registry.load_provider_module("Hacksaw Gaming")?;
//! let result = registry
//!     .execute_provider_method("Hacksaw Gaming", "placeBet", vec![json!(0.2), json!("continueBet")])
//!     .await?;
//! ```

pub mod args;
pub mod capability;
pub mod context;
pub mod error;
pub mod module;
pub mod registry;

pub use args::{BoundOperation, ProviderArg};
pub use capability::Capability;
pub use context::DispatchContext;
pub use error::{ProviderError, ProviderResult};
pub use module::ProviderModule;
pub use registry::{normalize_provider_name, LoadedModule, ProviderRegistry, DEFAULT_DESCRIPTORS};
