pub mod ckan_source;
pub mod context;
pub mod http_client;
pub mod in_memory_catalog;
