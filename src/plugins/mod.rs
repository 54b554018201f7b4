pub mod npm_plugin;

pub use npm_plugin::{NpmPlugin, parse_versions};
