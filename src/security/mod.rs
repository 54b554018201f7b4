pub mod command_executor;
pub mod credentials;

pub use command_executor::{CommandError, SafeCommandExecutor};
pub use credentials::{
    AmbientCredentials, CredentialProvider, TokenCredentials, credentials_for_registry,
};
