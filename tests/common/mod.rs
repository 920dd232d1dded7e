#![allow(dead_code)]

pub mod test_server;
pub mod upstream;

pub use test_server::TestServer;
