pub mod config;
pub mod config_loader;
pub mod error;
pub mod invocation_log;
pub mod summary;
pub mod traits;

pub use config::*;
pub use config_loader::*;
pub use error::*;
pub use invocation_log::*;
pub use summary::*;
pub use traits::*;
