//! Reading and writing the settings file.
//!
//! The file is a TOML document with one table per `ConfigSection`. Whole-file
//! saves render every section; `update_section` replaces a single table in
//! the file on disk and leaves the others as they are. Every write goes
//! through a temp file in the same directory that is persisted over the
//! target.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use toml_edit::{DocumentMut, Item, Table};

use super::settings::{ConfigSection, Settings};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Failed to parse config for editing: {0}")]
    EditParseError(#[from] toml_edit::TomlError),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings bound to a file path.
pub struct ConfigManager {
    path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// Nothing is read until `load` or `load_or_create`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            settings: Settings::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// In-memory only until `save` or `update_section`.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Load an existing file. Missing fields take their defaults.
    pub fn load(&mut self) -> ConfigResult<()> {
        let text = self
            .read()?
            .ok_or_else(|| ConfigError::NotFound(self.path.clone()))?;
        self.settings = parse_settings(&text)?;
        tracing::debug!("Loaded config from {}", self.path.display());
        Ok(())
    }

    /// Load the file, or write defaults when there is none.
    ///
    /// A file with unknown tables or missing sections is rewritten in full.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        let Some(text) = self.read()? else {
            tracing::info!("Creating default config at {}", self.path.display());
            self.settings = Settings::default();
            return self.save();
        };

        self.settings = parse_settings(&text)?;
        let doc: DocumentMut = text.parse()?;
        if needs_rewrite(&doc) {
            tracing::info!("Normalising sections in {}", self.path.display());
            self.save()?;
        }
        Ok(())
    }

    /// Write every section, each preceded by a short description.
    pub fn save(&self) -> ConfigResult<()> {
        let mut doc = DocumentMut::new();
        for (index, section) in ConfigSection::ALL.into_iter().enumerate() {
            let header = if index == 0 { "# dawmark configuration\n" } else { "" };
            let mut table = self.section_table(section)?;
            table
                .decor_mut()
                .set_prefix(format!("{}\n# {}\n", header, section_description(section)));
            doc.insert(section.table_name(), Item::Table(table));
        }
        self.write(&doc.to_string())
    }

    /// Replace one section of the file on disk with the in-memory values.
    ///
    /// Other sections keep whatever the file currently holds, including
    /// values changed in memory but not yet saved.
    pub fn update_section(&mut self, section: ConfigSection) -> ConfigResult<()> {
        let mut doc: DocumentMut = match self.read()? {
            Some(text) => text.parse()?,
            None => DocumentMut::new(),
        };

        let mut table = self.section_table(section)?;
        if let Some(existing) = doc.get(section.table_name()).and_then(Item::as_table) {
            *table.decor_mut() = existing.decor().clone();
        }
        doc.insert(section.table_name(), Item::Table(table));

        self.write(&doc.to_string())?;
        tracing::debug!("Updated [{}] in {}", section.table_name(), self.path.display());
        Ok(())
    }

    fn section_table(&self, section: ConfigSection) -> ConfigResult<Table> {
        let text = match section {
            ConfigSection::Timeline => toml::to_string_pretty(&self.settings.timeline)?,
            ConfigSection::Extraction => toml::to_string_pretty(&self.settings.extraction)?,
            ConfigSection::Export => toml::to_string_pretty(&self.settings.export)?,
            ConfigSection::Logging => toml::to_string_pretty(&self.settings.logging)?,
        };
        let doc: DocumentMut = text.parse()?;
        Ok(doc.as_table().clone())
    }

    /// File contents, or `None` when the file does not exist.
    fn read(&self) -> ConfigResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn write(&self, contents: &str) -> ConfigResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;

        let mut temp = NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        temp.write_all(contents.as_bytes())
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| self.io_error(e))?;
        temp.persist(&self.path).map_err(|e| self.io_error(e.error))?;
        Ok(())
    }

    fn io_error(&self, source: io::Error) -> ConfigError {
        ConfigError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

fn parse_settings(text: &str) -> ConfigResult<Settings> {
    let settings: Settings = toml::from_str(text)?;
    check_values(&settings)?;
    Ok(settings)
}

/// True when the document has tables outside `ConfigSection` or lacks one.
fn needs_rewrite(doc: &DocumentMut) -> bool {
    let known = |key: &str| ConfigSection::ALL.iter().any(|s| s.table_name() == key);

    let unknown: Vec<_> = doc.iter().map(|(key, _)| key).filter(|key| !known(key)).collect();
    for key in &unknown {
        tracing::warn!("Dropping unknown config section '{}'", key);
    }
    let missing = ConfigSection::ALL
        .iter()
        .any(|s| !doc.contains_key(s.table_name()));

    !unknown.is_empty() || missing
}

/// Reject values that deserialize but cannot be used.
fn check_values(settings: &Settings) -> ConfigResult<()> {
    if settings.export.marker_duration_ms == 0 {
        return Err(ConfigError::InvalidValue {
            field: "export.marker_duration_ms",
            reason: "cue length must be at least 1 ms".to_string(),
        });
    }
    Ok(())
}

fn section_description(section: ConfigSection) -> &'static str {
    match section {
        ConfigSection::Timeline => "Timecode range, subframes, and fallback frame rate",
        ConfigSection::Extraction => "Whole-document extraction",
        ConfigSection::Export => "Marker export",
        ConfigSection::Logging => "Logging",
    }
}
