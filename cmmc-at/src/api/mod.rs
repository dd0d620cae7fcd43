//! HTTP API handlers for cmmc-at

pub mod buildinfo;
pub mod cache;
pub mod catalog;
pub mod health;
pub mod poam;
pub mod profile;
pub mod records;
pub mod reports;
pub mod responsibility;
pub mod subscription;

pub use buildinfo::get_build_info;
pub use cache::cache_routes;
pub use catalog::catalog_routes;
pub use health::health_routes;
pub use poam::poam_routes;
pub use profile::profile_routes;
pub use records::record_routes;
pub use reports::report_routes;
pub use responsibility::responsibility_routes;
pub use subscription::subscription_routes;
