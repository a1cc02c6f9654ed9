//! Multi-provider URL shortening.
//!
//! [`providers`] describes each service as data, [`protocol`] turns that
//! data into requests and reads the responses back, and [`engine`] runs the
//! validate, check and create flow over an [`transport::HttpTransport`].

pub mod config;
pub mod connectivity;
pub mod engine;
pub mod models;
pub mod protocol;
pub mod providers;
pub mod qr;
pub mod service;
pub mod storage;
pub mod transport;
