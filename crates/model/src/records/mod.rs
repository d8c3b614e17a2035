pub mod frame;
pub mod row;
