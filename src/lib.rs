pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod keyring;
pub mod platform;
pub mod view;
pub mod window;

use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, ValueEnum, Debug, Default, Serialize)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
