//! Marketplace collaborators for the listing monitor
//!
//! Holds the domain types shared by the refresh actor and the monitor loop,
//! the three capabilities they consume, and the HTTP implementations used by
//! the binary:
//!
//! 1. `ProxyPool` supplies egress clients (`ProxyList` reads them from a file)
//! 2. `CredentialSource` fetches a session credential (`SessionCookieSource`)
//! 3. `CatalogSource` finds the newest item id and streams items past a
//!    watermark (`HttpCatalog`)
//!
//! The traits use `Pin<Box<dyn Future>>` returns so they can be held as
//! `Arc<dyn ...>` and handed across runtimes.

pub mod catalog;
pub mod constants;
pub mod credential;
pub mod error;
pub mod item;
pub mod proxies;
pub mod session;
pub mod source;

pub use catalog::HttpCatalog;
pub use credential::Credential;
pub use error::{Error, Result};
pub use item::{Item, RawItem};
pub use proxies::ProxyList;
pub use session::SessionCookieSource;
pub use source::{BoxFuture, CatalogSource, CredentialSource, OnItem, ProxyPool};
