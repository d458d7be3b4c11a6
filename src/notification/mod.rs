pub mod cache;
pub mod http;
pub mod model;
pub mod poller;
pub mod service;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;
