pub use error::K8sError as Error;
pub mod annotations;
pub mod client;
pub mod error;
pub mod labels;
pub mod lifecycle;
#[cfg(test)]
pub(crate) mod mock_api_server;
