pub mod filter;
pub mod list;
pub mod task;
pub mod view;
