//! XMLTV document mapping, serialization, and loading.

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::Error;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::EpgError;
use crate::store::{EpgStore, Programme, StoreOptions};
use crate::time::EpgTime;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Deserializes empty strings as `None`.
fn deserialize_empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let result = Option::deserialize(deserializer);
    let s: Option<String> = result.map_err(D::Error::custom)?;
    Ok(s.filter(|s| !s.is_empty()))
}

/// `<tv>` root element. Channels are written before programmes.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "tv")]
struct TvDocument {
    #[serde(rename = "channel", default)]
    channels: Vec<ChannelElement>,
    #[serde(rename = "programme", default)]
    programmes: Vec<ProgrammeElement>,
}

/// `<channel>` element.
#[derive(Debug, Serialize, Deserialize)]
struct ChannelElement {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "display-name")]
    display_name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    icon: Option<IconElement>,
}

/// `<icon src="..."/>` element.
#[derive(Debug, Serialize, Deserialize)]
struct IconElement {
    #[serde(rename = "@src")]
    src: String,
}

/// `<programme>` element.
#[derive(Debug, Serialize, Deserialize)]
struct ProgrammeElement {
    #[serde(rename = "@start")]
    start: String,
    #[serde(rename = "@stop")]
    stop: String,
    #[serde(rename = "@channel")]
    channel: String,
    title: String,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_empty_string_as_none",
        default
    )]
    desc: Option<String>,
    #[serde(default)]
    category: String,
}

impl From<&EpgStore> for TvDocument {
    fn from(store: &EpgStore) -> Self {
        Self {
            channels: store
                .channels()
                .iter()
                .map(|c| ChannelElement {
                    id: c.id.clone(),
                    display_name: c.display_name.clone(),
                    icon: c.icon_url.clone().map(|src| IconElement { src }),
                })
                .collect(),
            programmes: store
                .programmes()
                .iter()
                .map(|p| ProgrammeElement {
                    start: p.start.to_string(),
                    stop: p.stop.to_string(),
                    channel: p.channel_id.clone(),
                    title: p.title.clone(),
                    desc: p.description.clone(),
                    category: p.category.clone(),
                })
                .collect(),
        }
    }
}

fn parse_stored_time(value: String) -> Result<EpgTime, EpgError> {
    EpgTime::parse_canonical(&value)
        .map_err(|source| EpgError::InvalidStoredTime { value, source })
}

impl EpgStore {
    /// Renders the guide as a pretty-printed XMLTV document.
    ///
    /// # Errors
    ///
    /// Returns an error if XML serialization fails.
    pub fn to_text(&self) -> Result<String> {
        let document = TvDocument::from(self);

        let mut body = String::new();
        let mut serializer = quick_xml::se::Serializer::new(&mut body);
        serializer.indent(' ', 2);
        document
            .serialize(serializer)
            .context("failed to serialize guide to XMLTV")?;

        Ok(format!("{XML_DECLARATION}\n{body}\n"))
    }

    /// Writes [`EpgStore::to_text`] to `path` as UTF-8, replacing any
    /// existing content.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the file write fails.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let text = self.to_text()?;
        std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            channels = self.channels().len(),
            programmes = self.programmes().len(),
            "guide saved"
        );
        Ok(())
    }

    /// Builds a store from an XMLTV document.
    ///
    /// Channels go through the same checks as [`EpgStore::add_channel`].
    /// Programmes must reference a known channel and have `start < stop`;
    /// overlaps left behind by updates are kept and logged. Programmes
    /// without a category get the default one.
    ///
    /// # Errors
    ///
    /// Returns an error if the XML does not parse, a timestamp is not in
    /// canonical form (`EpgError::InvalidStoredTime`), or an entry breaks
    /// a store rule.
    pub fn from_xml(text: &str, options: StoreOptions) -> Result<Self> {
        let document: TvDocument =
            quick_xml::de::from_str(text).context("failed to parse XMLTV document")?;
        let mut store = Self::with_options(options);

        for channel in document.channels {
            store.add_channel(
                &channel.id,
                &channel.display_name,
                channel.icon.as_ref().map(|icon| icon.src.as_str()),
            )?;
        }

        for element in document.programmes {
            let context = format!("invalid programme on channel {}", element.channel);
            let category = if element.category.is_empty() {
                store.options().default_category.clone()
            } else {
                element.category
            };
            let programme = Programme {
                start: parse_stored_time(element.start).context(context.clone())?,
                stop: parse_stored_time(element.stop).context(context.clone())?,
                channel_id: element.channel,
                title: element.title,
                description: element.desc,
                category,
            };
            store.restore_programme(programme).context(context)?;
        }

        Ok(store)
    }

    /// Loads a store from an XMLTV file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or
    /// [`EpgStore::from_xml`] fails.
    pub fn load_from_file(path: &Path, options: StoreOptions) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_xml(&text, options).with_context(|| format!("failed to load {}", path.display()))
    }
}
