// src/lib.rs

//! pagewatch: watches web pages for new PDF documents.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod services;
pub mod status;
pub mod storage;
pub mod utils;
