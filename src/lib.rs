//! Fabled News - headlines retold by the Grand Chronicler
//!
//! This crate fetches news headlines from RSS feeds, asks a generative
//! language model to rewrite them as fantasy stories, and publishes the safe
//! subset as a JSON file for a static site to render.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod generator;
pub mod models;
pub mod pipeline;
pub mod publisher;

pub use error::{Error, Result};
