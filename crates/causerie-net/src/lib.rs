// Remote chat API access: the gateway trait the sync core depends on and
// its HTTP implementation.

pub mod error;
pub mod gateway;
pub mod http;

pub use error::{GatewayError, Result};
pub use gateway::ChatGateway;
pub use http::HttpGateway;
