pub mod action;
pub mod task;
pub mod user;
