pub mod api;
pub mod catalog;
pub mod cleanup;
pub mod conf;
pub mod core;
pub mod db;
pub mod scheduler;
pub mod service;
pub mod tracking;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;
