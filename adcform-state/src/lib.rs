//! adcform State Management
//!
//! Persists what adcform knows about the appliance between runs: the
//! identifier of every managed object and the attributes last written or
//! observed. Attributes the appliance never returns (secrets, uploaded
//! content, submitted declarations) survive only here.
//!
//! # Example
//!
//! ```ignore
//! use adcform_state::{create_backend, BackendConfig};
//!
//! let backend = create_backend(&BackendConfig::local("adcform.state.json")).await?;
//!
//! let lock = backend.acquire_lock("apply").await?;
//! let mut state = backend.read_state().await?.unwrap_or_default();
//!
//! // ... upsert resources ...
//!
//! state.increment_serial();
//! backend.write_state(&state).await?;
//! backend.release_lock(&lock).await?;
//! ```

pub mod backend;
pub mod backends;
pub mod lock;
pub mod state;

// Re-export main types for convenience
pub use backend::{BackendConfig, BackendError, BackendResult, StateBackend};
pub use backends::{LocalBackend, create_backend};
pub use lock::LockInfo;
pub use state::{ResourceState, StateFile};
