pub mod order;
pub mod task;
