// Library for tests to access modules

pub mod config;
pub mod fallback;
pub mod models;
pub mod normalizer;
pub mod probe;
pub mod registry;
pub mod routes;
pub mod store;
pub mod version;
