//! Downstream resource addressing, calling convention, and expansion.

mod expand;
mod http;
mod locator;
#[cfg(test)]
pub(crate) mod mock;
mod service;

pub use expand::{ExpansionSpec, expand};
pub use http::HttpResourceService;
pub use locator::ResourceLocator;
pub use service::{Query, ResourceService};

pub(crate) use service::record_pk;
