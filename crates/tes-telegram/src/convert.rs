//! Raw TL objects → core domain types.

use grammers_tl_types as tl;

use tes_core::domain::{
    RemoteDocument, StickerDocument, StickerPack, StickerSet, StickerSetDetail, StickerSetRef,
};

pub fn sticker_set(set: tl::enums::StickerSet) -> StickerSet {
    let tl::enums::StickerSet::Set(s) = set;
    StickerSet {
        id: s.id,
        access_hash: s.access_hash,
        short_name: s.short_name,
        title: s.title,
        count: s.count,
        archived: s.archived,
        masks: s.masks,
        official: s.official,
        emojis: s.emojis,
        installed_date: s.installed_date,
    }
}

/// Every covered flavour carries the plain set; covers are not needed.
pub fn covered_sticker_set(covered: tl::enums::StickerSetCovered) -> StickerSet {
    use tl::enums::StickerSetCovered as Covered;

    let set = match covered {
        Covered::Covered(c) => c.set,
        Covered::StickerSetMultiCovered(c) => c.set,
        Covered::StickerSetFullCovered(c) => c.set,
        Covered::StickerSetNoCovered(c) => c.set,
    };
    sticker_set(set)
}

pub fn document(doc: tl::enums::Document) -> RemoteDocument {
    match doc {
        tl::enums::Document::Document(d) => {
            let file_name = d
                .attributes
                .iter()
                .filter_map(|a| match a {
                    tl::enums::DocumentAttribute::Filename(f) => Some(f.file_name.clone()),
                    _ => None,
                })
                .last();

            RemoteDocument::Document(StickerDocument {
                id: d.id,
                access_hash: d.access_hash,
                file_reference: d.file_reference,
                dc_id: d.dc_id,
                size: d.size,
                date: d.date,
                file_name,
            })
        }
        tl::enums::Document::Empty(e) => RemoteDocument::Empty { id: e.id },
    }
}

pub fn sticker_pack(pack: tl::enums::StickerPack) -> StickerPack {
    let tl::enums::StickerPack::Pack(p) = pack;
    StickerPack {
        emoticon: p.emoticon,
        documents: p.documents,
    }
}

pub fn sticker_set_detail(detail: tl::types::messages::StickerSet) -> StickerSetDetail {
    StickerSetDetail {
        set: sticker_set(detail.set),
        packs: detail.packs.into_iter().map(sticker_pack).collect(),
        documents: detail.documents.into_iter().map(document).collect(),
    }
}

pub fn input_sticker_set(set: &StickerSetRef) -> tl::enums::InputStickerSet {
    match set {
        StickerSetRef::Id { id, access_hash } => {
            tl::enums::InputStickerSet::Id(tl::types::InputStickerSetId {
                id: *id,
                access_hash: *access_hash,
            })
        }
        StickerSetRef::ShortName(name) => {
            tl::enums::InputStickerSet::ShortName(tl::types::InputStickerSetShortName {
                short_name: name.clone(),
            })
        }
    }
}

pub fn document_location(doc: &StickerDocument) -> tl::enums::InputFileLocation {
    tl::enums::InputFileLocation::InputDocumentFileLocation(tl::types::InputDocumentFileLocation {
        id: doc.id,
        access_hash: doc.access_hash,
        file_reference: doc.file_reference.clone(),
        thumb_size: String::new(),
    })
}
