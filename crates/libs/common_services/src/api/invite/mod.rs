pub mod error;
pub mod gateway;
pub mod interfaces;
pub mod management;
pub mod permissions;
pub mod status;
pub mod usage;
pub mod validator;

#[cfg(test)]
pub(crate) mod fixtures;
