// src/lib.rs

pub mod db;
pub mod media;
pub mod playback;
pub mod platforms;
pub mod repositories;
pub mod services;

pub use db::Database;
pub use holodeck_common::error::Error;
