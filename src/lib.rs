//! Core library for the `train` replay harness.
//!
//! `train` reads request description files into named sequences of requests
//! and pauses, synthesizes a request environment for each request, and feeds
//! them from one forked process per sequence into a shared queue. Forked
//! worker processes drain the queue through a configurable filter pipeline
//! and log every request and response. The primary interface is the `train`
//! binary; the modules below are its building blocks.
pub mod args;
pub mod config;
pub mod entry;
pub mod environ;
pub mod error;
pub mod headers;
pub mod launcher;
pub mod logger;
pub mod pipeline;
pub mod runner;
pub mod script;
