//! Backend services

pub mod ai;
pub mod predictions;
pub mod processing;
pub mod sessions;
pub mod sourcing;
pub mod storage;
