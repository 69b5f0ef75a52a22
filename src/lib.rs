pub mod catalog;
pub mod config;
pub mod controller;
pub mod error;
pub mod infrastructure;
pub mod player;
pub mod service;

pub use error::{Error, Result, UserError};
