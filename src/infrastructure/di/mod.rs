//! Dependency injection: wiring of services and their I/O dependencies

mod service_container;

pub use service_container::ServiceContainer;
