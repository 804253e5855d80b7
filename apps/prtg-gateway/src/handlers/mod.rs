//! Handlers 模块

pub mod health;
pub mod webhook;

pub use health::*;
pub use webhook::*;
