//! Config file formats, picked from the file extension.

use std::path::Path;

use serde::de::DeserializeOwned;

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub enum Format {
    #[default]
    Toml,
    Yaml,
    Json,
}

impl Format {
    const EXTENSIONS: [(&'static str, Self); 4] = [
        ("toml", Self::Toml),
        ("yaml", Self::Yaml),
        ("yml", Self::Yaml),
        ("json", Self::Json),
    ];

    /// Matches the last extension of `path`, ignoring ASCII case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        Self::EXTENSIONS
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(extension))
            .map(|(_, format)| *format)
    }

    pub fn deserialize<T: DeserializeOwned>(self, content: &str) -> Result<T, String> {
        match self {
            Self::Toml => toml::from_str(content).map_err(|error| error.to_string()),
            Self::Yaml => serde_yaml::from_str(content).map_err(|error| error.to_string()),
            Self::Json => serde_json::from_str(content).map_err(|error| error.to_string()),
        }
    }
}
