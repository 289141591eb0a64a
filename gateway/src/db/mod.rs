pub mod catalog_store;
pub mod persistent_cache;

pub use catalog_store::CatalogStore;
pub use persistent_cache::PersistentTokenCache;
