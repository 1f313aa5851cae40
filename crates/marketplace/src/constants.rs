//! Marketplace endpoint constants
//!
//! Paths are relative to the configured `base_url` so the same binary can
//! watch any regional storefront.

/// Newest-first catalog listing used to find the current highest item id
pub const CATALOG_ITEMS_PATH: &str = "/api/v2/catalog/items";

/// Page size for the newest-first listing
pub const CATALOG_PAGE_SIZE: u32 = 96;

/// Single item lookup, suffixed with `/{id}`
pub const ITEM_PATH: &str = "/api/v2/items";

/// Session cookie issued on the storefront landing page
pub const DEFAULT_SESSION_COOKIE: &str = "access_token_web";

/// Browser-like user agent; the storefront rejects bare library agents
pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36";
