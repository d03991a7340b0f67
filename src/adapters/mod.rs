//! # Provider Adapters
//!
//! Concrete implementations of [`ProviderAdapter`], the uniform contract
//! the router and provider manager use to talk to heterogeneous
//! information-retrieval sources.
//!
//! In hexagonal terms: the adapter trait is the port, and the `mock_*`
//! implementations are secondary adapters swapped in here because this
//! repository has no live external service to call. A production deployment
//! adds adapters for real web-search APIs, vector databases, and document
//! stores behind this same trait; callers never change.

pub mod mock_document;
pub mod mock_vector;
pub mod mock_web;
pub mod traits;

pub use mock_document::MockDocumentStoreProvider;
pub use mock_vector::MockVectorDbProvider;
pub use mock_web::MockWebSearchProvider;
pub use traits::{ProviderAdapter, ProviderError, ProviderResult};
