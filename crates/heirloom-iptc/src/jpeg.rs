//! JPEG marker segment parsing and serialization.
//!
//! Only the header portion of the file (everything before the first SOS
//! marker) is split into segments. The scan and everything after it is kept
//! as an opaque tail and written back unchanged.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Error, Result};

/// Start of image.
pub const SOI: u8 = 0xD8;
/// End of image.
pub const EOI: u8 = 0xD9;
/// Start of scan.
pub const SOS: u8 = 0xDA;
/// JFIF application segment.
pub const APP0: u8 = 0xE0;
/// EXIF / XMP application segment.
pub const APP1: u8 = 0xE1;
/// ICC profile application segment.
pub const APP2: u8 = 0xE2;
/// Photoshop application segment carrying IPTC.
pub const APP13: u8 = 0xED;

/// Largest payload a length-prefixed segment can carry.
pub const MAX_SEGMENT_DATA: usize = u16::MAX as usize - 2;

/// Markers that stand alone without a length field.
fn is_standalone(marker: u8) -> bool {
    matches!(marker, 0x01 | 0xD0..=0xD7)
}

/// One marker segment from the JPEG header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Marker code (the byte after 0xFF).
    pub marker: u8,
    /// Payload without the marker and length bytes.
    pub data: Vec<u8>,
}

impl Segment {
    pub fn new(marker: u8, data: Vec<u8>) -> Self {
        Self { marker, data }
    }

    /// Whether this segment's payload starts with `prefix`.
    pub fn starts_with(&self, marker: u8, prefix: &[u8]) -> bool {
        self.marker == marker && self.data.starts_with(prefix)
    }
}

/// A JPEG split into header segments and the untouched scan tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegFile {
    /// Segments between SOI and the first SOS, in file order.
    pub segments: Vec<Segment>,
    /// Bytes from the SOS (or EOI) marker to the end of the file.
    pub tail: Vec<u8>,
}

impl JpegFile {
    /// Quick signature check without parsing.
    pub fn is_jpeg(data: &[u8]) -> bool {
        data.len() >= 3 && data[0] == 0xFF && data[1] == SOI && data[2] == 0xFF
    }

    /// Parse the header segments of a JPEG file.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if !Self::is_jpeg(data) {
            return Err(Error::NotJpeg);
        }

        let mut buf = &data[2..];
        let mut segments = Vec::new();

        loop {
            let marker_offset = data.len() - buf.len();

            if !buf.has_remaining() {
                // Header with no scan. Unusual, but nothing to copy through.
                return Ok(Self {
                    segments,
                    tail: Vec::new(),
                });
            }
            if buf.get_u8() != 0xFF {
                return Err(Error::invalid_jpeg(format!(
                    "expected marker at offset {}",
                    marker_offset
                )));
            }

            // Any number of 0xFF fill bytes may precede the marker code
            let mut marker = 0xFF;
            while buf.has_remaining() {
                marker = buf.get_u8();
                if marker != 0xFF {
                    break;
                }
            }
            if marker == 0xFF {
                return Err(Error::invalid_jpeg("truncated marker"));
            }

            if marker == SOS || marker == EOI {
                return Ok(Self {
                    segments,
                    tail: data[marker_offset..].to_vec(),
                });
            }

            if is_standalone(marker) {
                segments.push(Segment::new(marker, Vec::new()));
                continue;
            }

            if buf.remaining() < 2 {
                return Err(Error::BufferUnderflow {
                    need: 2,
                    have: buf.remaining(),
                });
            }
            let length = buf.get_u16() as usize;
            if length < 2 {
                return Err(Error::invalid_jpeg(format!(
                    "segment 0x{:02X} has invalid length {}",
                    marker, length
                )));
            }
            let payload_len = length - 2;
            if buf.remaining() < payload_len {
                return Err(Error::BufferUnderflow {
                    need: payload_len,
                    have: buf.remaining(),
                });
            }

            segments.push(Segment::new(marker, buf[..payload_len].to_vec()));
            buf.advance(payload_len);
        }
    }

    /// Serialize back to a complete JPEG byte stream.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let header_len: usize = self.segments.iter().map(|s| s.data.len() + 4).sum();
        let mut buf = BytesMut::with_capacity(2 + header_len + self.tail.len());

        buf.put_u8(0xFF);
        buf.put_u8(SOI);

        for segment in &self.segments {
            buf.put_u8(0xFF);
            buf.put_u8(segment.marker);
            if is_standalone(segment.marker) {
                continue;
            }
            if segment.data.len() > MAX_SEGMENT_DATA {
                return Err(Error::SegmentTooLarge {
                    size: segment.data.len(),
                    max: MAX_SEGMENT_DATA,
                });
            }
            buf.put_u16((segment.data.len() + 2) as u16);
            buf.put_slice(&segment.data);
        }

        buf.put_slice(&self.tail);
        Ok(buf.to_vec())
    }

    /// Indexes of every segment matching `marker` whose payload starts with `prefix`.
    pub fn find_all(&self, marker: u8, prefix: &[u8]) -> Vec<usize> {
        self.segments
            .iter()
            .enumerate()
            .filter(|(_, segment)| segment.starts_with(marker, prefix))
            .map(|(index, _)| index)
            .collect()
    }

    /// Where a new metadata segment should go: after the leading
    /// APP0/APP1/APP2 run, so JFIF and EXIF stay first.
    pub fn metadata_insert_index(&self) -> usize {
        self.segments
            .iter()
            .take_while(|segment| matches!(segment.marker, APP0 | APP1 | APP2))
            .count()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Smallest structurally valid JPEG: SOI, APP0 (JFIF), SOS with a few
    /// bytes of entropy data, EOI.
    pub(crate) fn sample_jpeg() -> Vec<u8> {
        let mut data = vec![0xFF, SOI];
        data.extend_from_slice(&[0xFF, APP0, 0x00, 0x10]);
        data.extend_from_slice(b"JFIF\0");
        data.extend_from_slice(&[0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00]);
        data.extend_from_slice(&[0xFF, SOS, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x3F, 0x00]);
        data.extend_from_slice(&[0x12, 0x34, 0xFF, 0x00, 0x56]);
        data.extend_from_slice(&[0xFF, EOI]);
        data
    }

    #[test]
    fn test_parse_sample() {
        let data = sample_jpeg();
        let jpeg = JpegFile::parse(&data).unwrap();

        assert_eq!(jpeg.segments.len(), 1);
        assert_eq!(jpeg.segments[0].marker, APP0);
        assert!(jpeg.segments[0].data.starts_with(b"JFIF\0"));
        assert_eq!(&jpeg.tail[..2], &[0xFF, SOS]);
        assert_eq!(&jpeg.tail[jpeg.tail.len() - 2..], &[0xFF, EOI]);
    }

    #[test]
    fn test_roundtrip_is_byte_identical() {
        let data = sample_jpeg();
        let jpeg = JpegFile::parse(&data).unwrap();
        assert_eq!(jpeg.to_bytes().unwrap(), data);
    }

    #[test]
    fn test_rejects_non_jpeg() {
        assert!(matches!(
            JpegFile::parse(b"\x89PNG\r\n\x1a\n"),
            Err(Error::NotJpeg)
        ));
        assert!(matches!(JpegFile::parse(b""), Err(Error::NotJpeg)));
    }

    #[test]
    fn test_truncated_segment() {
        let mut data = sample_jpeg();
        data.truncate(10);
        assert!(matches!(
            JpegFile::parse(&data),
            Err(Error::BufferUnderflow { .. })
        ));
    }

    #[test]
    fn test_fill_bytes_before_marker() {
        let mut data = vec![0xFF, SOI, 0xFF, 0xFF, 0xFF, APP1, 0x00, 0x04, 0xAA, 0xBB];
        data.extend_from_slice(&[0xFF, EOI]);

        let jpeg = JpegFile::parse(&data).unwrap();
        assert_eq!(jpeg.segments, vec![Segment::new(APP1, vec![0xAA, 0xBB])]);
        assert_eq!(jpeg.tail, vec![0xFF, EOI]);
    }

    #[test]
    fn test_metadata_insert_index() {
        let mut jpeg = JpegFile::parse(&sample_jpeg()).unwrap();
        assert_eq!(jpeg.metadata_insert_index(), 1);

        jpeg.segments.insert(1, Segment::new(APP1, b"Exif\0\0".to_vec()));
        jpeg.segments.push(Segment::new(0xDB, vec![0; 65]));
        assert_eq!(jpeg.metadata_insert_index(), 2);
    }

    #[test]
    fn test_oversized_segment_rejected() {
        let mut jpeg = JpegFile::parse(&sample_jpeg()).unwrap();
        jpeg.segments
            .push(Segment::new(APP13, vec![0; MAX_SEGMENT_DATA + 1]));
        assert!(matches!(
            jpeg.to_bytes(),
            Err(Error::SegmentTooLarge { .. })
        ));
    }
}
