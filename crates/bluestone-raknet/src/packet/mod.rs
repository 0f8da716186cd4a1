pub mod frame;
pub mod offline;
pub mod online;
