use tracing::{debug, info, warn};

use crate::{
    domain::StickerSet,
    errors::Error,
    ports::{AllStickersResponse, StickerClient},
    progress::Progress,
    Result,
};

#[derive(Clone, Debug)]
pub struct ListOutcome {
    /// Installed sets first, then archived sets in server order.
    pub sets: Vec<StickerSet>,
    pub installed: usize,
    pub archived: usize,
    /// Sets the server counted at some point but never delivered.
    pub deleted_while_archived: i64,
}

/// Collect every sticker set of the account: installed, then archived.
///
/// Archived sets are paged with the last seen set id as cursor. Each page
/// declares how many archived sets remain from its offset; the page that
/// declares no more than `page_size` is the last one. The total (declared
/// plus already received) may shrink between pages; whatever the largest
/// total promised beyond what actually arrived was deleted while archived.
pub async fn list_sticker_sets(
    client: &dyn StickerClient,
    page_size: i32,
    progress: &mut Progress,
) -> Result<ListOutcome> {
    let installed = match client.all_sticker_sets().await? {
        AllStickersResponse::Sets(sets) => sets,
        AllStickersResponse::NotModified => {
            return Err(Error::UnexpectedResponse {
                request: "messages.getAllStickers",
                got: "messages.allStickersNotModified".to_string(),
            })
        }
    };
    let installed_count = installed.len() as i64;
    let page = i64::from(page_size);

    let mut sets = installed;
    let mut archived_seen: i64 = 0;
    let mut offset_id: i64 = 0;
    let mut declared_total: i64 = 0;
    let mut peak_total: i64 = 0;
    let mut pages = 0usize;

    loop {
        let resp = client.archived_sticker_sets(offset_id, page_size).await?;
        pages += 1;

        let declared = i64::from(resp.count);
        let received = resp.sets.len() as i64;
        let page_total = declared + archived_seen;
        if pages > 1 && page_total < declared_total {
            info!(
                from = declared_total,
                to = page_total,
                "archived sticker set total shrank during listing"
            );
        }
        declared_total = page_total;
        peak_total = peak_total.max(page_total);

        if let Some(last) = resp.sets.last() {
            offset_id = last.id;
        }
        archived_seen += received;
        sets.extend(resp.sets);

        let expected_total = installed_count + declared - page + archived_seen;
        debug!(
            page = pages,
            declared,
            received,
            archived_seen,
            expected_total,
            "archived sticker sets page"
        );

        if installed_count + archived_seen >= expected_total {
            break;
        }
        if received == 0 {
            warn!(
                declared,
                archived_seen, "archived sticker sets page was empty; stopping"
            );
            break;
        }
    }

    let deleted = (peak_total - archived_seen).max(0);
    match deleted {
        0 => {}
        1 => progress.line("1 sticker set was deleted while archived"),
        n => progress.line(format!("{n} sticker sets were deleted while archived")),
    }

    Ok(ListOutcome {
        installed: installed_count as usize,
        archived: archived_seen as usize,
        sets,
        deleted_while_archived: deleted,
    })
}
