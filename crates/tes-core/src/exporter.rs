use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::{
    domain::{RemoteDocument, StickerDocument, StickerSetDetail, StickerSetRef},
    errors::Error,
    metadata::StickerSetMetadata,
    ports::{StickerClient, StickerSetResponse},
    progress::Progress,
    Result,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Export one sticker set into `<parent>/<short_name>/`.
///
/// Sticker files whose size already matches are kept; everything else is
/// (re)downloaded. A failed download is reported and skipped. `metadata.json`
/// is rewritten from scratch on every call.
pub async fn export_sticker_set(
    client: &dyn StickerClient,
    set_ref: &StickerSetRef,
    parent: &Path,
    exported_at: DateTime<Utc>,
    progress: &mut Progress,
) -> Result<ExportSummary> {
    let detail = match client.sticker_set(set_ref).await? {
        StickerSetResponse::Set(detail) => detail,
        StickerSetResponse::NotModified => {
            return Err(Error::UnexpectedResponse {
                request: "messages.getStickerSet",
                got: "messages.stickerSetNotModified".to_string(),
            })
        }
    };
    let StickerSetDetail {
        set,
        packs,
        documents,
    } = detail;
    let documents = documents
        .into_iter()
        .map(|d| match d {
            RemoteDocument::Document(doc) => Ok(doc),
            RemoteDocument::Empty { id } => Err(Error::UnexpectedResponse {
                request: "messages.getStickerSet",
                got: format!("documentEmpty#{id}"),
            }),
        })
        .collect::<Result<Vec<_>>>()?;

    let dir = set_directory(parent, &set.short_name)?;
    match tokio::fs::create_dir(&dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
        Err(e) => return Err(e.into()),
    }

    let mut metadata = StickerSetMetadata::new(&set, exported_at);
    let mut summary = ExportSummary::default();
    let mut skips = SkipRun::default();
    let total = documents.len();

    for (idx, document) in documents.iter().enumerate() {
        let n = idx + 1;
        metadata.add_document(document);

        let file_name = document.target_file_name();
        let path = dir.join(&file_name);

        if already_exported(&path, document).await {
            summary.skipped += 1;
            skips.push(n, &file_name);
            continue;
        }
        skips.flush(total, progress);

        progress.line(format!("({n}/{total}) Exporting sticker {file_name}"));
        match client.download_document(&path, document).await {
            Ok(()) => summary.downloaded += 1,
            Err(e) => {
                summary.failed += 1;
                warn!(set = %set.short_name, file = %file_name, error = %e, "sticker download failed");
                progress.line(format!("Failed to export sticker {file_name}: {e}"));
            }
        }
    }

    if total > 0 && summary.skipped == total {
        progress.line("All stickers already exported");
    } else {
        skips.flush(total, progress);
    }

    for pack in &packs {
        let unknown = metadata.add_pack(pack);
        if !unknown.is_empty() {
            warn!(
                set = %set.short_name,
                emoticon = %pack.emoticon,
                ?unknown,
                "emoticon pack references documents outside the set"
            );
        }
    }

    metadata.write_to(&dir).await?;

    info!(
        set = %set.short_name,
        downloaded = summary.downloaded,
        skipped = summary.skipped,
        failed = summary.failed,
        "sticker set exported"
    );
    Ok(summary)
}

/// `<parent>/<short_name>`, refusing names that are not a single plain component.
pub fn set_directory(parent: &Path, short_name: &str) -> Result<PathBuf> {
    let candidate = Path::new(short_name);
    let mut components = candidate.components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if short_name.is_empty() || !single_normal || short_name.contains(['/', '\\', '\0']) {
        return Err(Error::InvalidPath {
            path: parent.join(short_name),
            reason: "sticker set short name is not a plain folder name".to_string(),
        });
    }
    Ok(parent.join(short_name))
}

/// A file counts as exported when it exists with exactly the declared size.
async fn already_exported(path: &Path, document: &StickerDocument) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(md) => md.is_file() && i64::try_from(md.len()).ok() == Some(document.size),
        Err(_) => false,
    }
}

/// Consecutive skipped stickers, reported as one line.
#[derive(Default)]
struct SkipRun {
    first: usize,
    last: usize,
    first_file: String,
}

impl SkipRun {
    fn push(&mut self, n: usize, file_name: &str) {
        if self.first == 0 {
            self.first = n;
            self.first_file = file_name.to_string();
        }
        self.last = n;
    }

    fn flush(&mut self, total: usize, progress: &mut Progress) {
        if self.first == 0 {
            return;
        }
        if self.first == self.last {
            progress.line(format!(
                "({}/{total}) Sticker {} already exported",
                self.first, self.first_file
            ));
        } else {
            progress.line(format!(
                "({}-{}/{total}) Stickers already exported",
                self.first, self.last
            ));
        }
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{StickerPack, StickerSet},
        metadata::METADATA_FILE_NAME,
        ports::{AllStickersResponse, ArchivedPage},
        progress::testing::SharedBuffer,
    };
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::{collections::HashSet, fs, sync::Mutex, time::Duration};

    fn tmp(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_nanos();
        let pid = std::process::id();
        let dir = PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}"));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn set(short_name: &str) -> StickerSet {
        StickerSet {
            id: 77,
            access_hash: 770,
            short_name: short_name.to_string(),
            title: "Test set".to_string(),
            count: 3,
            archived: false,
            masks: false,
            official: false,
            emojis: false,
            installed_date: Some(1_600_000_000),
        }
    }

    fn doc(id: i64, size: i64, file_name: Option<&str>) -> StickerDocument {
        StickerDocument {
            id,
            access_hash: id + 1,
            file_reference: vec![1, 2, 3],
            dc_id: 4,
            size,
            date: 1_700_000_000,
            file_name: file_name.map(str::to_string),
        }
    }

    struct FakeSet {
        detail: Option<StickerSetDetail>,
        failing: HashSet<i64>,
        downloads: Mutex<Vec<i64>>,
    }

    impl FakeSet {
        fn new(detail: StickerSetDetail) -> Self {
            Self {
                detail: Some(detail),
                failing: HashSet::new(),
                downloads: Mutex::new(Vec::new()),
            }
        }

        fn downloads(&self) -> Vec<i64> {
            self.downloads.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StickerClient for FakeSet {
        async fn all_sticker_sets(&self) -> Result<AllStickersResponse> {
            Err(Error::External("not used".to_string()))
        }

        async fn archived_sticker_sets(&self, _offset_id: i64, _limit: i32) -> Result<ArchivedPage> {
            Err(Error::External("not used".to_string()))
        }

        async fn sticker_set(&self, _set: &StickerSetRef) -> Result<StickerSetResponse> {
            Ok(match &self.detail {
                Some(d) => StickerSetResponse::Set(d.clone()),
                None => StickerSetResponse::NotModified,
            })
        }

        async fn download_document(&self, dest: &Path, doc: &StickerDocument) -> Result<()> {
            self.downloads.lock().unwrap().push(doc.id);
            if self.failing.contains(&doc.id) {
                return Err(Error::External("FILE_REFERENCE_EXPIRED".to_string()));
            }
            fs::write(dest, vec![0u8; doc.size as usize])?;
            Ok(())
        }
    }

    fn three_docs(short_name: &str) -> StickerSetDetail {
        StickerSetDetail {
            set: set(short_name),
            packs: vec![
                StickerPack {
                    emoticon: "😀".to_string(),
                    documents: vec![1, 3],
                },
                StickerPack {
                    emoticon: "😅".to_string(),
                    documents: vec![1],
                },
            ],
            documents: vec![
                RemoteDocument::Document(doc(1, 5, Some("sticker.webp"))),
                RemoteDocument::Document(doc(2, 7, Some("AnimatedSticker.tgs"))),
                RemoteDocument::Document(doc(3, 9, Some("video.sticker.webm"))),
            ],
        }
    }

    fn read_metadata(dir: &Path) -> StickerSetMetadata {
        let text = fs::read_to_string(dir.join(METADATA_FILE_NAME)).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn extension_is_last_dot_segment() {
        assert_eq!(doc(1, 0, Some("a.b.webm")).extension(), "webm");
        assert_eq!(doc(1, 0, Some("noext")).extension(), "noext");
        assert_eq!(doc(1, 0, None).extension(), "");
        assert_eq!(doc(1, 0, None).target_file_name(), "1.");
        assert_eq!(doc(9, 0, Some("s.tgs")).target_file_name(), "9.tgs");
    }

    #[test]
    fn set_directory_rejects_non_plain_names() {
        let parent = Path::new("/tmp/out");
        assert_eq!(
            set_directory(parent, "Animals").unwrap(),
            PathBuf::from("/tmp/out/Animals")
        );
        for bad in ["", ".", "..", "a/b", "/abs", "a\\b"] {
            assert!(
                matches!(set_directory(parent, bad), Err(Error::InvalidPath { .. })),
                "name: {bad:?}"
            );
        }
    }

    #[tokio::test]
    async fn downloads_everything_into_set_folder() {
        let root = tmp("tes-export-all");
        let client = FakeSet::new(three_docs("fresh_set"));
        let out = SharedBuffer::default();
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        let summary = export_sticker_set(
            &client,
            &StickerSetRef::ShortName("fresh_set".to_string()),
            &root,
            at,
            &mut out.progress(),
        )
        .await
        .unwrap();

        assert_eq!(
            summary,
            ExportSummary {
                downloaded: 3,
                skipped: 0,
                failed: 0
            }
        );
        assert_eq!(client.downloads(), vec![1, 2, 3]);
        let dir = root.join("fresh_set");
        assert_eq!(fs::metadata(dir.join("1.webp")).unwrap().len(), 5);
        assert_eq!(fs::metadata(dir.join("2.tgs")).unwrap().len(), 7);
        assert_eq!(fs::metadata(dir.join("3.webm")).unwrap().len(), 9);
        assert_eq!(
            out.lines(),
            vec![
                "(1/3) Exporting sticker 1.webp",
                "(2/3) Exporting sticker 2.tgs",
                "(3/3) Exporting sticker 3.webm",
            ]
        );

        let md = read_metadata(&dir);
        assert_eq!(md.short_name, "fresh_set");
        assert_eq!(md.exported_date, "2024-01-02T03:04:05Z");
        assert_eq!(md.installed_date, "2020-09-13T12:26:40Z");
        assert_eq!(md.stickers["1"].emoticons, "😀😅");
        assert_eq!(md.stickers["2"].emoticons, "");
        assert_eq!(md.stickers["3"].emoticons, "😀");
        assert_eq!(md.stickers["3"].date, "2023-11-14T22:13:20Z");

        let _ = fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn skips_matching_file_and_downloads_the_rest() {
        let root = tmp("tes-export-partial");
        let dir = root.join("partial_set");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("1.webp"), vec![0u8; 5]).unwrap();
        // Wrong size: must be replaced.
        fs::write(dir.join("2.tgs"), vec![0u8; 3]).unwrap();

        let client = FakeSet::new(three_docs("partial_set"));
        let out = SharedBuffer::default();
        let summary = export_sticker_set(
            &client,
            &StickerSetRef::Id { id: 77, access_hash: 770 },
            &root,
            Utc::now(),
            &mut out.progress(),
        )
        .await
        .unwrap();

        assert_eq!(summary.downloaded, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(client.downloads(), vec![2, 3]);
        assert_eq!(fs::metadata(dir.join("2.tgs")).unwrap().len(), 7);
        assert_eq!(
            out.lines(),
            vec![
                "(1/3) Sticker 1.webp already exported",
                "(2/3) Exporting sticker 2.tgs",
                "(3/3) Exporting sticker 3.webm",
            ]
        );

        let _ = fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn collapses_consecutive_skips() {
        let root = tmp("tes-export-runs");
        let dir = root.join("runs_set");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("1.webp"), vec![0u8; 5]).unwrap();
        fs::write(dir.join("2.tgs"), vec![0u8; 7]).unwrap();

        let client = FakeSet::new(three_docs("runs_set"));
        let out = SharedBuffer::default();
        export_sticker_set(
            &client,
            &StickerSetRef::ShortName("runs_set".to_string()),
            &root,
            Utc::now(),
            &mut out.progress(),
        )
        .await
        .unwrap();

        assert_eq!(client.downloads(), vec![3]);
        assert_eq!(
            out.lines(),
            vec![
                "(1-2/3) Stickers already exported",
                "(3/3) Exporting sticker 3.webm",
            ]
        );

        let _ = fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn trailing_skips_are_flushed() {
        let root = tmp("tes-export-tail");
        let dir = root.join("tail_set");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("2.tgs"), vec![0u8; 7]).unwrap();
        fs::write(dir.join("3.webm"), vec![0u8; 9]).unwrap();

        let client = FakeSet::new(three_docs("tail_set"));
        let out = SharedBuffer::default();
        export_sticker_set(
            &client,
            &StickerSetRef::ShortName("tail_set".to_string()),
            &root,
            Utc::now(),
            &mut out.progress(),
        )
        .await
        .unwrap();

        assert_eq!(
            out.lines(),
            vec![
                "(1/3) Exporting sticker 1.webp",
                "(2-3/3) Stickers already exported",
            ]
        );

        let _ = fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn rerun_reports_everything_exported_and_rewrites_metadata() {
        let root = tmp("tes-export-rerun");
        let client = FakeSet::new(three_docs("rerun_set"));
        let first_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let second_at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let set_ref = StickerSetRef::ShortName("rerun_set".to_string());

        let first = SharedBuffer::default();
        export_sticker_set(&client, &set_ref, &root, first_at, &mut first.progress())
            .await
            .unwrap();
        let before = read_metadata(&root.join("rerun_set"));

        let second = SharedBuffer::default();
        let summary =
            export_sticker_set(&client, &set_ref, &root, second_at, &mut second.progress())
                .await
                .unwrap();
        let after = read_metadata(&root.join("rerun_set"));

        assert_eq!(summary.skipped, 3);
        assert_eq!(summary.downloaded, 0);
        assert_eq!(client.downloads().len(), 3);
        assert_eq!(second.lines(), vec!["All stickers already exported"]);

        assert_eq!(before.exported_date, "2024-01-01T00:00:00Z");
        assert_eq!(after.exported_date, "2024-06-01T12:00:00Z");
        assert_eq!(before.installed_date, after.installed_date);
        assert_eq!(before.stickers, after.stickers);

        let _ = fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn failed_download_does_not_abort_the_set() {
        let root = tmp("tes-export-fail");
        let mut client = FakeSet::new(three_docs("fail_set"));
        client.failing.insert(2);
        let out = SharedBuffer::default();

        let summary = export_sticker_set(
            &client,
            &StickerSetRef::ShortName("fail_set".to_string()),
            &root,
            Utc::now(),
            &mut out.progress(),
        )
        .await
        .unwrap();

        assert_eq!(
            summary,
            ExportSummary {
                downloaded: 2,
                skipped: 0,
                failed: 1
            }
        );
        assert_eq!(client.downloads(), vec![1, 2, 3]);
        let lines = out.lines();
        assert_eq!(
            lines[2],
            "Failed to export sticker 2.tgs: external error: FILE_REFERENCE_EXPIRED"
        );
        assert!(root.join("fail_set").join(METADATA_FILE_NAME).is_file());

        let _ = fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn not_modified_response_is_fatal() {
        let root = tmp("tes-export-notmod");
        let mut client = FakeSet::new(three_docs("nm_set"));
        client.detail = None;
        let out = SharedBuffer::default();

        let err = export_sticker_set(
            &client,
            &StickerSetRef::ShortName("nm_set".to_string()),
            &root,
            Utc::now(),
            &mut out.progress(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::UnexpectedResponse { .. }));
        assert!(!root.join("nm_set").exists());

        let _ = fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn empty_document_is_fatal() {
        let root = tmp("tes-export-empty");
        let mut detail = three_docs("empty_doc_set");
        detail.documents.push(RemoteDocument::Empty { id: 4 });
        let client = FakeSet::new(detail);
        let out = SharedBuffer::default();

        let err = export_sticker_set(
            &client,
            &StickerSetRef::ShortName("empty_doc_set".to_string()),
            &root,
            Utc::now(),
            &mut out.progress(),
        )
        .await
        .unwrap_err();

        match err {
            Error::UnexpectedResponse { got, .. } => assert_eq!(got, "documentEmpty#4"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(client.downloads().is_empty());

        let _ = fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn missing_parent_directory_is_fatal() {
        let root = tmp("tes-export-noparent").join("does-not-exist");
        let client = FakeSet::new(three_docs("orphan_set"));
        let out = SharedBuffer::default();

        let err = export_sticker_set(
            &client,
            &StickerSetRef::ShortName("orphan_set".to_string()),
            &root,
            Utc::now(),
            &mut out.progress(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Io(_)));
        assert!(client.downloads().is_empty());
    }
}
