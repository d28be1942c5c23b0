//! Gradebook - student grade calculation over HTTP
//!
//! This crate provides a small single-threaded HTTP/1.x server that computes
//! grades from five subject marks and keeps student records in a flat text
//! file. Records can be appended, listed, and deleted by roll number.

pub mod app;
pub mod config;
pub mod form;
pub mod grade;
pub mod http;
pub mod logging;
pub mod record;
pub mod render;
pub mod store;
