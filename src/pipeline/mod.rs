//! The filter pipeline under test and the stub application behind it.
mod builtins;
mod registry;
mod response;
mod server;
mod stub;
mod traits;


pub use builtins::{RateLimitFilter, RequireHeaderFilter};
pub use registry::{FilterRegistry, filter_registry};
pub use response::Response;
pub use server::ReplayServer;
pub use stub::{STUB_HEADER, StubApplication};
pub use traits::{Filter, Handler};
