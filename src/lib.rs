// src/lib.rs

//! Forum Watch Library
//!
//! Scrapes a forum listing page, stores each new dated topic once and keeps
//! a bounded history for weekly digests.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
