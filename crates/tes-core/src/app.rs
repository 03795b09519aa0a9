use chrono::Utc;
use tracing::info;

use crate::{
    cli::ExportOptions,
    config::Config,
    domain::StickerSetRef,
    errors::Error,
    exporter::{export_sticker_set, ExportSummary},
    lister::list_sticker_sets,
    ports::StickerClient,
    progress::Progress,
    Result,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub sets: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    fn add(&mut self, s: ExportSummary) {
        self.sets += 1;
        self.downloaded += s.downloaded;
        self.skipped += s.skipped;
        self.failed += s.failed;
    }
}

/// Export the requested sets (or every set of the account) into the output
/// directory. The first set-level error aborts the run.
pub async fn run(
    client: &dyn StickerClient,
    cfg: &Config,
    opts: &ExportOptions,
    progress: &mut Progress,
) -> Result<RunSummary> {
    let out_dir = &opts.directory;
    tokio::fs::create_dir_all(out_dir)
        .await
        .map_err(|e| Error::InvalidPath {
            path: out_dir.clone(),
            reason: format!("cannot create output directory: {e}"),
        })?;

    progress.line(format!("Exporting sticker sets to {}", out_dir.display()));
    let mut summary = RunSummary::default();

    if opts.sticker_set_names.is_empty() {
        let listing = list_sticker_sets(client, cfg.archived_page_size, progress).await?;
        info!(
            installed = listing.installed,
            archived = listing.archived,
            "listed sticker sets"
        );

        let total = listing.sets.len();
        for (idx, set) in listing.sets.iter().enumerate() {
            progress.line(format!(
                "({}/{total}) Exporting sticker set {} ({})",
                idx + 1,
                set.title,
                set.short_name
            ));
            let s = export_sticker_set(client, &set.by_id(), out_dir, Utc::now(), progress).await?;
            summary.add(s);
        }
    } else {
        let total = opts.sticker_set_names.len();
        for (idx, name) in opts.sticker_set_names.iter().enumerate() {
            progress.line(format!("({}/{total}) Exporting sticker set {name}", idx + 1));
            let set_ref = StickerSetRef::ShortName(name.clone());
            let s = export_sticker_set(client, &set_ref, out_dir, Utc::now(), progress).await?;
            summary.add(s);
        }
    }

    Ok(summary)
}
