pub mod catalog;
pub mod keys;
pub mod policy;

pub use catalog::CatalogSettings;
pub use keys::ApiKeys;
pub use policy::SuitabilityPolicy;
