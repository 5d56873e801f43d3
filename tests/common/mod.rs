#![allow(dead_code)]

pub mod mocks;
pub mod table;

pub use mocks::MockSource;
pub use table::Table;
