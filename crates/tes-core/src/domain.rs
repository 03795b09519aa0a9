/// A sticker set as described by the remote service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StickerSet {
    pub id: i64,
    pub access_hash: i64,
    pub short_name: String,
    pub title: String,
    pub count: i32,
    pub archived: bool,
    pub masks: bool,
    pub official: bool,
    pub emojis: bool,
    /// Unix seconds. Absent for sets that were never installed.
    pub installed_date: Option<i32>,
}

impl StickerSet {
    pub fn by_id(&self) -> StickerSetRef {
        StickerSetRef::Id {
            id: self.id,
            access_hash: self.access_hash,
        }
    }
}

/// How a sticker set is identified when fetching its contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StickerSetRef {
    Id { id: i64, access_hash: i64 },
    ShortName(String),
}

/// One sticker file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StickerDocument {
    pub id: i64,
    pub access_hash: i64,
    pub file_reference: Vec<u8>,
    pub dc_id: i32,
    pub size: i64,
    /// Unix seconds.
    pub date: i32,
    /// Name carried by the last filename attribute, if any.
    pub file_name: Option<String>,
}

impl StickerDocument {
    /// Last `.`-delimited segment of the attached file name.
    ///
    /// A name without dots yields the whole name; no attribute yields `""`.
    pub fn extension(&self) -> &str {
        self.file_name
            .as_deref()
            .and_then(|name| name.rsplit('.').next())
            .unwrap_or("")
    }

    /// `<id>.<extension>`, the on-disk name of the sticker.
    pub fn target_file_name(&self) -> String {
        format!("{}.{}", self.id, self.extension())
    }
}

/// A document slot in a sticker set response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoteDocument {
    Document(StickerDocument),
    Empty { id: i64 },
}

/// Emoticon grouping returned alongside a sticker set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StickerPack {
    pub emoticon: String,
    pub documents: Vec<i64>,
}

/// Full contents of one sticker set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StickerSetDetail {
    pub set: StickerSet,
    pub packs: Vec<StickerPack>,
    pub documents: Vec<RemoteDocument>,
}
