//! Reading and rewriting IPTC tags in whole JPEG files.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::Result;
use crate::iim::{parse_datasets, write_datasets};
use crate::irb::{self, ResourceBlock, IPTC_RESOURCE_ID, PHOTOSHOP_HEADER};
use crate::jpeg::{JpegFile, Segment, APP13};
use crate::tags::{IptcTags, TagUpdate};

/// Photoshop resources of a JPEG, merged across all of its APP13 segments.
fn photoshop_blocks(jpeg: &JpegFile, indexes: &[usize]) -> Result<Vec<ResourceBlock>> {
    irb::parse_segments(
        indexes
            .iter()
            .map(|&index| jpeg.segments[index].data.as_slice()),
    )
}

fn iptc_tags(blocks: &[ResourceBlock]) -> Result<IptcTags> {
    match blocks.iter().find(|b| b.is_iptc()) {
        Some(block) => Ok(IptcTags::from_datasets(parse_datasets(&block.data)?)),
        None => Ok(IptcTags::default()),
    }
}

/// Extract the IPTC tags from JPEG bytes.
///
/// A JPEG without an IPTC block yields empty tags.
pub fn extract(data: &[u8]) -> Result<IptcTags> {
    let jpeg = JpegFile::parse(data)?;
    let blocks = photoshop_blocks(&jpeg, &jpeg.find_all(APP13, PHOTOSHOP_HEADER))?;
    iptc_tags(&blocks)
}

/// Apply `update` to JPEG bytes and return the rewritten file.
///
/// Other Photoshop resources and all non-APP13 segments are preserved. The
/// resources are written back where the first Photoshop APP13 segment was,
/// split over as many segments as they need. When the update leaves no tags
/// behind, the IPTC resource is dropped, along with the APP13 segments if
/// nothing else lives in them.
pub fn embed(data: &[u8], update: &TagUpdate) -> Result<Vec<u8>> {
    if update.is_empty() {
        return Ok(data.to_vec());
    }

    let mut jpeg = JpegFile::parse(data)?;
    let existing = jpeg.find_all(APP13, PHOTOSHOP_HEADER);
    let mut blocks = photoshop_blocks(&jpeg, &existing)?;

    let mut tags = iptc_tags(&blocks)?;
    tags.apply(update);

    let datasets = tags.to_datasets();
    let iim = if datasets.is_empty() {
        None
    } else {
        Some(write_datasets(&datasets)?)
    };

    match (blocks.iter().position(ResourceBlock::is_iptc), iim) {
        (Some(pos), Some(iim)) => blocks[pos].data = iim,
        (Some(pos), None) => {
            blocks.remove(pos);
        }
        (None, Some(iim)) => blocks.push(ResourceBlock::new(IPTC_RESOURCE_ID, iim)),
        (None, None) => {}
    }

    let at = match existing.first() {
        Some(&first) => first,
        None => jpeg.metadata_insert_index(),
    };
    // Later indexes first so earlier ones stay valid; `at` is never shifted
    for &index in existing.iter().rev() {
        jpeg.segments.remove(index);
    }
    let payloads = irb::write_segments(&blocks)?;
    jpeg.segments.splice(
        at..at,
        payloads
            .into_iter()
            .map(|payload| Segment::new(APP13, payload)),
    );

    jpeg.to_bytes()
}

/// Read the IPTC tags of a JPEG file.
pub fn read_tags(path: impl AsRef<Path>) -> Result<IptcTags> {
    let data = fs::read(path.as_ref())?;
    extract(&data)
}

/// Rewrite the IPTC tags of a JPEG file in place.
///
/// The new content is written to a temporary file next to the original and
/// renamed over it, so readers see either the old or the new file. Returns
/// `false` when nothing had to change.
pub fn write_tags(path: impl AsRef<Path>, update: &TagUpdate) -> Result<bool> {
    let path = path.as_ref();
    if update.is_empty() {
        return Ok(false);
    }

    let original = fs::read(path)?;
    let rewritten = embed(&original, update)?;
    if rewritten == original {
        return Ok(false);
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let permissions = fs::metadata(path)?.permissions();

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&rewritten)?;
    tmp.as_file().sync_all()?;
    fs::set_permissions(tmp.path(), permissions)?;
    tmp.persist(path)?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::jpeg::tests::sample_jpeg;
    use crate::jpeg::{APP0, APP1, MAX_SEGMENT_DATA};
    use crate::tags::Tag;

    #[test]
    fn test_extract_without_iptc() {
        let tags = extract(&sample_jpeg()).unwrap();
        assert!(tags.is_empty());
    }

    #[test]
    fn test_embed_inserts_after_app0() {
        let data = sample_jpeg();
        let out = embed(&data, &TagUpdate::default().title("Reunion")).unwrap();

        let jpeg = JpegFile::parse(&out).unwrap();
        let markers: Vec<u8> = jpeg.segments.iter().map(|s| s.marker).collect();
        assert_eq!(markers, vec![APP0, APP13]);

        let original = JpegFile::parse(&data).unwrap();
        assert_eq!(jpeg.tail, original.tail);
    }

    #[test]
    fn test_embed_after_exif() {
        let mut data = vec![0xFF, 0xD8, 0xFF, APP1, 0x00, 0x08];
        data.extend_from_slice(b"Exif\0\0");
        data.extend_from_slice(&[0xFF, 0xD9]);

        let out = embed(&data, &TagUpdate::default().source("Jane")).unwrap();
        let jpeg = JpegFile::parse(&out).unwrap();
        assert_eq!(jpeg.segments[0].marker, APP1);
        assert_eq!(jpeg.segments[1].marker, APP13);
    }

    #[test]
    fn test_embed_then_extract() {
        let update = TagUpdate::default()
            .title("Grandma's 80th")
            .description("Everyone in the garden, summer 1994")
            .source("Jane Doe");
        let out = embed(&sample_jpeg(), &update).unwrap();

        let tags = extract(&out).unwrap();
        assert_eq!(tags.get(Tag::ObjectName).as_deref(), Some("Grandma's 80th"));
        assert_eq!(
            tags.get(Tag::CaptionAbstract).as_deref(),
            Some("Everyone in the garden, summer 1994")
        );
        assert_eq!(tags.get(Tag::Source).as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_second_embed_replaces_segment() {
        let first = embed(&sample_jpeg(), &TagUpdate::default().title("One")).unwrap();
        let second = embed(&first, &TagUpdate::default().title("Two")).unwrap();

        let jpeg = JpegFile::parse(&second).unwrap();
        let app13_count = jpeg.segments.iter().filter(|s| s.marker == APP13).count();
        assert_eq!(app13_count, 1);
        assert_eq!(
            extract(&second).unwrap().get(Tag::ObjectName).as_deref(),
            Some("Two")
        );
    }

    #[test]
    fn test_clearing_all_tags_removes_segment() {
        let data = sample_jpeg();
        let tagged = embed(&data, &TagUpdate::default().title("Temp")).unwrap();
        let cleared = embed(&tagged, &TagUpdate::default().title("")).unwrap();

        assert_eq!(cleared, data);
    }

    #[test]
    fn test_other_resources_survive() {
        let mut data = vec![0xFF, 0xD8];
        let payload = irb::write_segments(&[ResourceBlock::new(0x03ED, vec![1, 2, 3, 4])])
            .unwrap()
            .remove(0);
        data.extend_from_slice(&[0xFF, APP13]);
        data.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
        data.extend_from_slice(&payload);
        data.extend_from_slice(&[0xFF, 0xD9]);

        let out = embed(&data, &TagUpdate::default().title("x")).unwrap();
        let jpeg = JpegFile::parse(&out).unwrap();
        let blocks = irb::parse_segments([jpeg.segments[0].data.as_slice()]).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].id, 0x03ED);
        assert!(blocks[1].is_iptc());

        // Clearing again keeps the unrelated resource
        let cleared = embed(&out, &TagUpdate::default().title("")).unwrap();
        assert_eq!(cleared, data);
    }

    #[test]
    fn test_empty_update_is_identity() {
        let data = b"not even a jpeg".to_vec();
        assert_eq!(embed(&data, &TagUpdate::default()).unwrap(), data);
    }

    #[test]
    fn test_embed_rejects_non_jpeg() {
        let result = embed(b"GIF89a", &TagUpdate::default().title("x"));
        assert!(matches!(result, Err(Error::NotJpeg)));
    }

    #[test]
    fn test_large_description_spans_segments() {
        let description = "x".repeat(MAX_SEGMENT_DATA);
        let out = embed(
            &sample_jpeg(),
            &TagUpdate::default().description(description.as_str()),
        )
        .unwrap();

        let jpeg = JpegFile::parse(&out).unwrap();
        let app13: Vec<usize> = jpeg.find_all(APP13, PHOTOSHOP_HEADER);
        assert_eq!(app13, vec![1, 2]);
        assert_eq!(
            extract(&out).unwrap().get(Tag::CaptionAbstract).as_deref(),
            Some(description.as_str())
        );

        // Shrinking the tags folds the stream back into one segment
        let shrunk = embed(&out, &TagUpdate::default().description("short")).unwrap();
        let jpeg = JpegFile::parse(&shrunk).unwrap();
        assert_eq!(jpeg.find_all(APP13, PHOTOSHOP_HEADER), vec![1]);
        assert_eq!(
            extract(&shrunk).unwrap().get(Tag::CaptionAbstract).as_deref(),
            Some("short")
        );
    }

    #[test]
    fn test_reads_iptc_from_later_segment() {
        // Thumbnail nearly fills the first segment, so the IPTC block straddles into the second
        let blocks = [
            ResourceBlock::new(0x040C, vec![0x22; MAX_SEGMENT_DATA - 30]),
            ResourceBlock::new(IPTC_RESOURCE_ID, vec![0x1C, 0x02, 0x05, 0x00, 0x03, b'O', b'l', b'd']),
        ];
        let payloads = irb::write_segments(&blocks).unwrap();
        assert_eq!(payloads.len(), 2);
        let mut jpeg = JpegFile::parse(&sample_jpeg()).unwrap();
        for payload in payloads {
            jpeg.segments.push(Segment::new(APP13, payload));
        }
        let data = jpeg.to_bytes().unwrap();

        let tags = extract(&data).unwrap();
        assert_eq!(tags.get(Tag::ObjectName).as_deref(), Some("Old"));

        let out = embed(&data, &TagUpdate::default().source("Jane")).unwrap();
        let tags = extract(&out).unwrap();
        assert_eq!(tags.get(Tag::ObjectName).as_deref(), Some("Old"));
        assert_eq!(tags.get(Tag::Source).as_deref(), Some("Jane"));

        let parsed = JpegFile::parse(&out).unwrap();
        let kept = photoshop_blocks(&parsed, &parsed.find_all(APP13, PHOTOSHOP_HEADER)).unwrap();
        assert_eq!(kept[0], blocks[0]);
    }
}
