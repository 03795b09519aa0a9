//! Telegram adapter (grammers).
//!
//! This crate implements the `tes-core` StickerClient port over MTProto.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use grammers_client::{Client, InvocationError};
use grammers_tl_types as tl;
use tokio::io::AsyncWriteExt;
use tracing::debug;

pub mod auth;
pub mod convert;

use tes_core::{
    config::Config,
    domain::{StickerDocument, StickerSetRef},
    errors::Error,
    ports::{AllStickersResponse, ArchivedPage, StickerClient, StickerSetResponse},
    Result,
};

#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    session_file: Option<PathBuf>,
    chunk_size: i32,
}

impl TelegramClient {
    /// Sign in, persisting the session to `cfg.session_file` when `save_session` is set.
    /// Fails with a config error when the session should be saved but has no location.
    pub async fn sign_in(
        cfg: &Config,
        app_id: i32,
        app_hash: &str,
        save_session: bool,
    ) -> Result<Self> {
        let session_file = if save_session {
            Some(cfg.require_session_file()?.to_path_buf())
        } else {
            None
        };
        let client =
            auth::connect_and_sign_in(cfg, app_id, app_hash, session_file.as_deref()).await?;
        Ok(Self {
            client,
            session_file,
            chunk_size: cfg.download_chunk_size,
        })
    }

    /// Write the session back (it may have picked up keys for other DCs).
    pub fn save_session(&self) -> Result<()> {
        if let Some(path) = &self.session_file {
            self.client.session().save_to_file(path)?;
        }
        Ok(())
    }

    fn map_err(e: InvocationError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    /// `upload.getFile`, following `FILE_MIGRATE_X` to the DC holding the file.
    async fn get_file(
        &self,
        req: &tl::functions::upload::GetFile,
        dc: &mut Option<i32>,
        fallback_dc: i32,
    ) -> Result<Vec<u8>> {
        let resp = match *dc {
            Some(dc_id) => self.client.invoke_in_dc(req, dc_id).await,
            None => match self.client.invoke(req).await {
                Err(InvocationError::Rpc(rpc)) if rpc.name == "FILE_MIGRATE" => {
                    let dc_id = rpc.value.map(|v| v as i32).unwrap_or(fallback_dc);
                    debug!(dc_id, "file lives in another dc");
                    *dc = Some(dc_id);
                    self.client.invoke_in_dc(req, dc_id).await
                }
                other => other,
            },
        }
        .map_err(Self::map_err)?;

        match resp {
            tl::enums::upload::File::File(f) => Ok(f.bytes),
            tl::enums::upload::File::CdnRedirect(_) => Err(Error::UnexpectedResponse {
                request: "upload.getFile",
                got: "upload.fileCdnRedirect".to_string(),
            }),
        }
    }
}

#[async_trait]
impl StickerClient for TelegramClient {
    async fn all_sticker_sets(&self) -> Result<AllStickersResponse> {
        let resp = self
            .client
            .invoke(&tl::functions::messages::GetAllStickers { hash: 0 })
            .await
            .map_err(Self::map_err)?;

        Ok(match resp {
            tl::enums::messages::AllStickers::Stickers(all) => AllStickersResponse::Sets(
                all.sets.into_iter().map(convert::sticker_set).collect(),
            ),
            tl::enums::messages::AllStickers::NotModified => AllStickersResponse::NotModified,
        })
    }

    async fn archived_sticker_sets(&self, offset_id: i64, limit: i32) -> Result<ArchivedPage> {
        let resp = self
            .client
            .invoke(&tl::functions::messages::GetArchivedStickers {
                masks: false,
                emojis: false,
                offset_id,
                limit,
            })
            .await
            .map_err(Self::map_err)?;

        let tl::enums::messages::ArchivedStickers::Stickers(page) = resp;
        Ok(ArchivedPage {
            count: page.count,
            sets: page
                .sets
                .into_iter()
                .map(convert::covered_sticker_set)
                .collect(),
        })
    }

    async fn sticker_set(&self, set: &StickerSetRef) -> Result<StickerSetResponse> {
        let resp = self
            .client
            .invoke(&tl::functions::messages::GetStickerSet {
                stickerset: convert::input_sticker_set(set),
                hash: 0,
            })
            .await
            .map_err(Self::map_err)?;

        Ok(match resp {
            tl::enums::messages::StickerSet::Set(detail) => {
                StickerSetResponse::Set(convert::sticker_set_detail(detail))
            }
            tl::enums::messages::StickerSet::NotModified => StickerSetResponse::NotModified,
        })
    }

    async fn download_document(&self, dest: &Path, document: &StickerDocument) -> Result<()> {
        let location = convert::document_location(document);
        let mut file = tokio::fs::File::create(dest).await?;
        let mut dc = None;
        let mut offset: i64 = 0;

        loop {
            let req = tl::functions::upload::GetFile {
                precise: false,
                cdn_supported: false,
                location: location.clone(),
                offset,
                limit: self.chunk_size,
            };
            let chunk = self.get_file(&req, &mut dc, document.dc_id).await?;
            file.write_all(&chunk).await?;
            offset += chunk.len() as i64;

            if chunk.len() < self.chunk_size as usize || offset >= document.size {
                break;
            }
        }

        file.flush().await?;
        if offset != document.size {
            return Err(Error::External(format!(
                "downloaded {offset} bytes, expected {}",
                document.size
            )));
        }
        Ok(())
    }
}
