//! Built-in assets seeded into the local cache.
//!
//! Some built-in assets carry user-visible text (sprite names in the default
//! project, for example). Those are stored as templates with `{{message-id}}`
//! placeholders and rendered through the current [`Translator`] every time
//! the cache is seeded.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use cairn_types::{Asset, AssetKey, AssetType, DataFormat};
use tracing::debug;

use crate::error::{SdkError, SdkResult};

/// Maps a message id to localized text.
pub type Translator = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Supplies the built-in assets for a given translator.
pub trait DefaultAssetSource: Send + Sync {
    /// Produce the full set of built-in assets. Called at construction and
    /// after every translator change; the result replaces any cached entries
    /// with the same keys.
    fn default_assets(&self, translator: Option<&Translator>) -> Vec<Asset>;
}

/// No built-in assets.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDefaults;

impl DefaultAssetSource for NoDefaults {
    fn default_assets(&self, _translator: Option<&Translator>) -> Vec<Asset> {
        Vec::new()
    }
}

#[derive(Clone, Debug)]
struct Entry {
    key: AssetKey,
    data: Bytes,
    translatable: bool,
}

/// A fixed list of built-in assets.
#[derive(Clone, Debug, Default)]
pub struct StaticDefaults {
    entries: Vec<Entry>,
}

impl StaticDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an asset that is seeded verbatim.
    pub fn with_asset(mut self, key: AssetKey, data: impl Into<Bytes>) -> Self {
        self.entries.push(Entry {
            key,
            data: data.into(),
            translatable: false,
        });
        self
    }

    /// Add a UTF-8 asset whose `{{message-id}}` placeholders are translated
    /// at seed time.
    pub fn with_template(mut self, key: AssetKey, text: impl Into<String>) -> Self {
        self.entries.push(Entry {
            key,
            data: Bytes::from(text.into()),
            translatable: true,
        });
        self
    }

    /// Load built-ins from a directory laid out as `<asset-type>/<id>.<format>`,
    /// e.g. `sound/83a9787d4cb6f3b7632b4ddfebf74367.wav`.
    ///
    /// Project files are treated as templates. Files with an unknown type
    /// directory or extension are skipped.
    pub fn from_dir(root: impl AsRef<Path>) -> SdkResult<Self> {
        let root = root.as_ref();
        let mut defaults = Self::new();

        for type_dir in fs::read_dir(root)? {
            let type_dir = type_dir?;
            if !type_dir.file_type()?.is_dir() {
                continue;
            }
            let Ok(asset_type) = type_dir.file_name().to_string_lossy().parse::<AssetType>() else {
                debug!(path = %type_dir.path().display(), "skipping unknown asset type directory");
                continue;
            };

            for file in fs::read_dir(type_dir.path())? {
                let path = file?.path();
                if !path.is_file() {
                    continue;
                }
                let (Some(stem), Some(ext)) = (
                    path.file_stem().and_then(|s| s.to_str()),
                    path.extension().and_then(|s| s.to_str()),
                ) else {
                    continue;
                };
                let Ok(format) = ext.parse::<DataFormat>() else {
                    debug!(path = %path.display(), "skipping file with unknown format");
                    continue;
                };
                let key = AssetKey::new(asset_type, stem, format)?;
                let data = fs::read(&path)?;

                defaults = if asset_type == AssetType::Project {
                    let text = String::from_utf8(data).map_err(|e| {
                        SdkError::Config(format!("{} is not UTF-8: {e}", path.display()))
                    })?;
                    defaults.with_template(key, text)
                } else {
                    defaults.with_asset(key, data)
                };
            }
        }

        // Directory iteration order is platform dependent.
        defaults.entries.sort_by(|a, b| a.key.cmp(&b.key));
        debug!(root = %root.display(), count = defaults.len(), "loaded built-in assets");
        Ok(defaults)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DefaultAssetSource for StaticDefaults {
    fn default_assets(&self, translator: Option<&Translator>) -> Vec<Asset> {
        self.entries
            .iter()
            .map(|entry| {
                let data = match (entry.translatable, std::str::from_utf8(&entry.data)) {
                    (true, Ok(text)) => Bytes::from(render_template(text, translator)),
                    _ => entry.data.clone(),
                };
                Asset::with_data(entry.key.clone(), data)
            })
            .collect()
    }
}

/// Replace every `{{id}}` in `text`. Without a translator the id itself is
/// used. An unterminated `{{` is copied through.
pub fn render_template(text: &str, translator: Option<&Translator>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        let Some(len) = rest[start + 2..].find("}}") else {
            break;
        };
        out.push_str(&rest[..start]);
        let id = rest[start + 2..start + 2 + len].trim();
        match translator {
            Some(t) => out.push_str(&t(id)),
            None => out.push_str(id),
        }
        rest = &rest[start + 2 + len + 2..];
    }
    out.push_str(rest);
    out
}
