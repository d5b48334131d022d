//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod error_mapping;
mod http_api_client;
mod http_auth_gateway;
mod http_collection_gateway;
mod http_reference_data_gateway;
mod in_memory_collection_gateway;
mod mutation;

pub use error_mapping::map_error_response;
pub use http_api_client::HttpApiClient;
pub use http_auth_gateway::HttpAuthGateway;
pub use http_collection_gateway::HttpCollectionGateway;
pub use http_reference_data_gateway::HttpReferenceDataGateway;
pub use in_memory_collection_gateway::InMemoryCollectionGateway;
