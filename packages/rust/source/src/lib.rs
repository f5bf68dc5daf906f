//! Upstream adapters: the Confluence REST client and the file-backed secret store.

mod confluence;
mod secrets;

pub use confluence::ConfluenceClient;
pub use secrets::FileSecretStore;
