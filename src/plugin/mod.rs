pub mod catalog;
pub mod consistency;
pub mod manifest;

pub use consistency::CatalogChecker;
