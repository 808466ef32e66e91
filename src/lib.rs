pub mod commands;
pub mod document;
pub mod manifest;
pub mod package;
pub mod pipeline;
pub mod runtime;
pub mod store;
pub mod strategy;
pub mod version;
