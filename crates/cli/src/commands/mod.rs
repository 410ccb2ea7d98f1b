//! Command implementations.
//!
//! Every command runs against a [`CliContext`]: configuration loaded from
//! the environment, a state file shared with the library layer, the
//! restored session, and one API client. Output goes through `tracing`.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod wishlist;

use cartwheel_client::{
    ApiClient, ApiError, CartError, CheckoutError, ClientConfig, ConfigError, FileStorage,
    Session, SharedStorage, StorageError,
};
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded from the environment.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The local state file could not be read or written.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// An API request failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A cart operation failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Checkout was rejected.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),
}

/// Shared handles every command needs.
pub struct CliContext {
    /// Configuration loaded from the environment.
    pub config: ClientConfig,
    /// State file backing the session, offline cart, and promo.
    pub storage: SharedStorage,
    /// The restored session.
    pub session: Session,
    /// API client bound to the session.
    pub api: ApiClient,
}

impl CliContext {
    /// Load configuration, open the state file, and restore the session.
    ///
    /// A `CARTWHEEL_API_TOKEN` from the environment signs the session in
    /// when no persisted token exists.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is missing or invalid, the state
    /// file cannot be opened, or the persisted session cannot be parsed.
    pub fn init() -> Result<Self, CliError> {
        let config = ClientConfig::from_env()?;
        let storage = FileStorage::shared(config.state_file.clone())?;
        let session = Session::restore(storage.clone())?;

        if let Some(token) = config.api_token.clone()
            && !session.is_authenticated()
        {
            session.login(token, None)?;
        }

        let api = ApiClient::new(&config, session.clone())?;

        Ok(Self {
            config,
            storage,
            session,
            api,
        })
    }
}
