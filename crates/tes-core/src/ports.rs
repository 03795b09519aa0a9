use std::path::Path;

use async_trait::async_trait;

use crate::{
    domain::{StickerDocument, StickerSet, StickerSetDetail, StickerSetRef},
    Result,
};

/// Response to `messages.getAllStickers`.
#[derive(Clone, Debug)]
pub enum AllStickersResponse {
    Sets(Vec<StickerSet>),
    NotModified,
}

/// One page of `messages.getArchivedStickers`.
///
/// `count` is the server's view of how many archived sets remain from the
/// page's offset onwards, at the time the page was produced.
#[derive(Clone, Debug)]
pub struct ArchivedPage {
    pub count: i32,
    pub sets: Vec<StickerSet>,
}

/// Response to `messages.getStickerSet`.
#[derive(Clone, Debug)]
pub enum StickerSetResponse {
    Set(StickerSetDetail),
    NotModified,
}

/// Port to the Telegram client library.
///
/// Implementations own authentication, transport and flood-wait retries; every
/// call resolves once the library has either succeeded or given up.
#[async_trait]
pub trait StickerClient: Send + Sync {
    async fn all_sticker_sets(&self) -> Result<AllStickersResponse>;

    async fn archived_sticker_sets(&self, offset_id: i64, limit: i32) -> Result<ArchivedPage>;

    async fn sticker_set(&self, set: &StickerSetRef) -> Result<StickerSetResponse>;

    /// Download `document` to `dest`, replacing any existing file.
    async fn download_document(&self, dest: &Path, document: &StickerDocument) -> Result<()>;
}
