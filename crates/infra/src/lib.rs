//! Infrastructure layer: in-memory stores and credential crypto.
//!
//! The auth core only sees the `AccountResolver` / `RoleStore` traits; the
//! types here are the default in-process implementations behind them.

pub mod crypto;
pub mod directory;
pub mod role_store;
pub mod server_store;

pub use directory::{InMemoryAccountDirectory, NewAccount, ProvisionedAccount};
pub use role_store::InMemoryRoleStore;
pub use server_store::{InMemoryServerStore, ServerInput, ServerRecord};
