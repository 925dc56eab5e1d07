pub mod config;
pub mod enrollment;
pub mod window;
