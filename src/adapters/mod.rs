// Adapters layer: concrete implementations of the remote business-object ports.

pub mod memory;
pub mod service_layer;

pub use memory::InMemoryCompany;
pub use service_layer::ServiceLayerCompany;
