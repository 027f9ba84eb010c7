pub mod config;
pub mod error;
pub mod fetch;
pub mod processing;
pub mod render;
pub mod spotify;
pub mod styling;
pub mod track;
pub mod tasks {
    pub mod display;
    pub mod viewer;
}
