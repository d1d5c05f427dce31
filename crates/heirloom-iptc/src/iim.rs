//! IPTC Information Interchange Model datasets.
//!
//! Each dataset is a tag marker, a record number, a dataset number, a length,
//! and the value bytes:
//!
//! ```text
//! 0x1C | record: u8 | dataset: u8 | length: u16 | value
//! ```
//!
//! When the high bit of the length is set, the low 15 bits give the number of
//! bytes that follow holding the actual length (extended dataset).

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Error, Result};

/// Tag marker that starts every dataset.
pub const TAG_MARKER: u8 = 0x1C;

/// Largest value that fits a standard (non-extended) length field.
pub const MAX_STANDARD_LENGTH: usize = 0x7FFF;

/// Envelope record.
pub const ENVELOPE_RECORD: u8 = 1;
/// Application record holding the descriptive tags.
pub const APPLICATION_RECORD: u8 = 2;

/// Envelope dataset 1:00, record version.
pub const ENVELOPE_VERSION: u8 = 0;
/// Envelope dataset 1:90, coded character set.
pub const CODED_CHARACTER_SET: u8 = 90;
/// Application dataset 2:00, record version.
pub const APPLICATION_VERSION: u8 = 0;

/// ISO 2022 escape sequence declaring UTF-8.
pub const UTF8_CHARSET: &[u8] = &[0x1B, 0x25, 0x47];

/// Record version value written for both records.
pub const RECORD_VERSION: &[u8] = &[0x00, 0x04];

/// One IIM dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSet {
    pub record: u8,
    pub number: u8,
    pub value: Vec<u8>,
}

impl DataSet {
    pub fn new(record: u8, number: u8, value: impl Into<Vec<u8>>) -> Self {
        Self {
            record,
            number,
            value: value.into(),
        }
    }

    /// Ordering key; records and datasets are written in ascending order.
    pub fn key(&self) -> (u8, u8) {
        (self.record, self.number)
    }
}

/// Parse a block of IIM datasets.
pub fn parse_datasets(data: &[u8]) -> Result<Vec<DataSet>> {
    let mut buf = data;
    let mut datasets = Vec::new();

    while buf.has_remaining() {
        let offset = data.len() - buf.len();
        let marker = buf.get_u8();
        if marker != TAG_MARKER {
            // Trailing padding after the last dataset
            if marker == 0 && buf.iter().all(|&b| b == 0) {
                break;
            }
            return Err(Error::invalid_iptc(format!(
                "expected tag marker at offset {}, found 0x{:02X}",
                offset, marker
            )));
        }

        if buf.remaining() < 4 {
            return Err(Error::BufferUnderflow {
                need: 4,
                have: buf.remaining(),
            });
        }
        let record = buf.get_u8();
        let number = buf.get_u8();
        let raw_len = buf.get_u16();

        let len = if raw_len & 0x8000 != 0 {
            let count = (raw_len & 0x7FFF) as usize;
            if count == 0 || count > 8 {
                return Err(Error::invalid_iptc(format!(
                    "unsupported extended length size {}",
                    count
                )));
            }
            if buf.remaining() < count {
                return Err(Error::BufferUnderflow {
                    need: count,
                    have: buf.remaining(),
                });
            }
            buf.get_uint(count) as usize
        } else {
            raw_len as usize
        };

        if buf.remaining() < len {
            return Err(Error::BufferUnderflow {
                need: len,
                have: buf.remaining(),
            });
        }
        datasets.push(DataSet::new(record, number, &buf[..len]));
        buf.advance(len);
    }

    Ok(datasets)
}

/// Serialize datasets in the order given.
pub fn write_datasets(datasets: &[DataSet]) -> Result<Vec<u8>> {
    let mut buf = BytesMut::new();

    for dataset in datasets {
        buf.put_u8(TAG_MARKER);
        buf.put_u8(dataset.record);
        buf.put_u8(dataset.number);

        let len = dataset.value.len();
        if len <= MAX_STANDARD_LENGTH {
            buf.put_u16(len as u16);
        } else {
            let len = u32::try_from(len)
                .map_err(|_| Error::invalid_iptc("dataset value exceeds 4 GiB"))?;
            buf.put_u16(0x8004);
            buf.put_u32(len);
        }
        buf.put_slice(&dataset.value);
    }

    Ok(buf.to_vec())
}

/// Whether the envelope declares UTF-8 text.
pub fn declares_utf8(datasets: &[DataSet]) -> bool {
    datasets
        .iter()
        .any(|d| d.key() == (ENVELOPE_RECORD, CODED_CHARACTER_SET) && d.value == UTF8_CHARSET)
}
