pub mod device_store;
pub mod error;
pub mod interfaces;
pub mod reconciler;
pub mod service;
