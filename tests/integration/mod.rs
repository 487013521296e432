//! Integration tests with mock HTTP server

pub mod http_transport;
pub mod mock_server;
pub mod offline;
