pub mod actions;
pub mod dashboard;
pub mod health;
pub mod tasks;
pub mod users;
