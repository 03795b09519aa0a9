use std::{collections::BTreeMap, path::Path};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{StickerDocument, StickerPack, StickerSet},
    Result,
};

pub const METADATA_FILE_NAME: &str = "metadata.json";

/// RFC 3339 UTC with second precision and a `Z` suffix.
pub fn format_date(unix_seconds: i64) -> String {
    DateTime::<Utc>::from_timestamp(unix_seconds, 0)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickerMetadata {
    pub emoticons: String,
    pub date: String,
}

/// The `metadata.json` sidecar written next to a set's sticker files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickerSetMetadata {
    pub id: i64,
    pub title: String,
    pub short_name: String,
    pub count: i32,
    pub archived: bool,
    pub masks: bool,
    pub official: bool,
    pub emojis: bool,
    pub installed_date: String,
    pub exported_date: String,
    /// Keyed by the decimal document id.
    pub stickers: BTreeMap<String, StickerMetadata>,
}

impl StickerSetMetadata {
    pub fn new(set: &StickerSet, exported_at: DateTime<Utc>) -> Self {
        Self {
            id: set.id,
            title: set.title.clone(),
            short_name: set.short_name.clone(),
            count: set.count,
            archived: set.archived,
            masks: set.masks,
            official: set.official,
            emojis: set.emojis,
            installed_date: format_date(i64::from(set.installed_date.unwrap_or(0))),
            exported_date: exported_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            stickers: BTreeMap::new(),
        }
    }

    pub fn add_document(&mut self, document: &StickerDocument) {
        self.stickers.insert(
            document.id.to_string(),
            StickerMetadata {
                emoticons: String::new(),
                date: format_date(i64::from(document.date)),
            },
        );
    }

    /// Append the pack's emoticon to every listed document.
    ///
    /// Returns the ids the pack lists that are not part of the set.
    pub fn add_pack(&mut self, pack: &StickerPack) -> Vec<i64> {
        let mut unknown = Vec::new();
        for id in &pack.documents {
            match self.stickers.get_mut(&id.to_string()) {
                Some(sticker) => sticker.emoticons.push_str(&pack.emoticon),
                None => unknown.push(*id),
            }
        }
        unknown
    }

    /// Tab-indented JSON.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        Ok(buf)
    }

    /// Write `metadata.json` into `dir`, replacing any previous version.
    pub async fn write_to(&self, dir: &Path) -> Result<()> {
        let bytes = self.to_json()?;
        tokio::fs::write(dir.join(METADATA_FILE_NAME), bytes).await?;
        Ok(())
    }
}
