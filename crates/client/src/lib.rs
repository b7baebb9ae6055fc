//! HTTP clients for the partwise control plane and the object store.
//!
//! Two seams are exposed as traits so the upload logic can be driven by
//! test doubles:
//!
//! - [`SessionClient`]: the four control-plane actions.
//! - [`PartTransport`]: one `PUT` of part bytes to a signed URL.

pub mod error;
pub mod session;
pub mod transport;

#[cfg(test)]
mod mock_http;

pub use error::ClientError;
pub use session::{HttpSessionClient, SessionClient};
pub use transport::{HttpPartTransport, PartTransport, ProgressFn};

use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by the client traits.
pub type ClientFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ClientError>> + Send + 'a>>;
