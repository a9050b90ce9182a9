#![allow(clippy::useless_conversion)]

pub mod action;
pub mod ids;
pub mod task;
pub mod user;
