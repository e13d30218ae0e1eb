pub(crate) mod client;
pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod oauth;
pub(crate) mod state;
pub(crate) mod store;
