pub mod block;
pub mod context;
pub mod task;
