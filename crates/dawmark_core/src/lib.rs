//! DAWMark Core - timeline resolution for DAW marker interchange
//!
//! This crate resolves absolute start times and effective roles of elements
//! in FCPXML timelines and converts markers to a format-independent model.
//! It performs no file or network I/O of its own apart from the config file.

pub mod config;
pub mod fcpxml;
pub mod logging;
pub mod markers;
pub mod timecode;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
