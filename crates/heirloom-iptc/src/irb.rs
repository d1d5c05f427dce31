//! Photoshop image resource blocks.
//!
//! An APP13 segment starts with the `Photoshop 3.0\0` header followed by a
//! sequence of resource blocks:
//!
//! ```text
//! "8BIM" | id: u16 | pascal name (padded to even) | size: u32 | data (padded to even)
//! ```
//!
//! A resource stream larger than one segment continues in further APP13
//! segments, each repeating the header. Blocks may straddle the boundary.
//!
//! Resources other than IPTC (thumbnails, print settings, ...) are preserved
//! as opaque blocks.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Error, Result};
use crate::jpeg::MAX_SEGMENT_DATA;

/// APP13 payload header identifying Photoshop resources.
pub const PHOTOSHOP_HEADER: &[u8] = b"Photoshop 3.0\0";

/// Signature of a regular image resource block.
pub const RESOURCE_SIGNATURE: [u8; 4] = *b"8BIM";

/// Resource id of the IPTC-NAA record.
pub const IPTC_RESOURCE_ID: u16 = 0x0404;

/// One Photoshop image resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBlock {
    pub signature: [u8; 4],
    pub id: u16,
    /// Pascal-string name, usually empty.
    pub name: Vec<u8>,
    pub data: Vec<u8>,
}

impl ResourceBlock {
    /// Create an unnamed `8BIM` resource.
    pub fn new(id: u16, data: Vec<u8>) -> Self {
        Self {
            signature: RESOURCE_SIGNATURE,
            id,
            name: Vec::new(),
            data,
        }
    }

    pub fn is_iptc(&self) -> bool {
        self.id == IPTC_RESOURCE_ID
    }

    fn write_to(&self, buf: &mut BytesMut) -> Result<()> {
        if self.name.len() > u8::MAX as usize {
            return Err(Error::invalid_iptc("resource name longer than 255 bytes"));
        }
        let data_len = u32::try_from(self.data.len())
            .map_err(|_| Error::invalid_iptc("resource data exceeds 4 GiB"))?;

        buf.put_slice(&self.signature);
        buf.put_u16(self.id);

        // Length byte plus name, padded to an even total
        buf.put_u8(self.name.len() as u8);
        buf.put_slice(&self.name);
        if (self.name.len() + 1) % 2 != 0 {
            buf.put_u8(0);
        }

        buf.put_u32(data_len);
        buf.put_slice(&self.data);
        if self.data.len() % 2 != 0 {
            buf.put_u8(0);
        }
        Ok(())
    }
}

fn need(buf: &[u8], n: usize) -> Result<()> {
    if buf.remaining() < n {
        return Err(Error::BufferUnderflow {
            need: n,
            have: buf.remaining(),
        });
    }
    Ok(())
}

/// Parse the resource stream carried by a run of APP13 payloads.
///
/// Payloads without the Photoshop header are ignored.
pub fn parse_segments<'a>(payloads: impl IntoIterator<Item = &'a [u8]>) -> Result<Vec<ResourceBlock>> {
    let stream: Vec<u8> = payloads
        .into_iter()
        .filter_map(|payload| payload.strip_prefix(PHOTOSHOP_HEADER))
        .flatten()
        .copied()
        .collect();
    parse_blocks(&stream)
}

/// Parse a sequence of resource blocks.
pub fn parse_blocks(data: &[u8]) -> Result<Vec<ResourceBlock>> {
    let mut buf = data;
    let mut blocks = Vec::new();

    while buf.has_remaining() {
        // Some writers pad the segment with trailing zeros
        if buf.iter().all(|&b| b == 0) {
            break;
        }

        need(buf, 6)?;
        let mut signature = [0u8; 4];
        buf.copy_to_slice(&mut signature);
        if !signature.iter().all(u8::is_ascii_alphanumeric) {
            return Err(Error::invalid_iptc(format!(
                "bad resource signature {:02X?}",
                signature
            )));
        }
        let id = buf.get_u16();

        need(buf, 1)?;
        let name_len = buf.get_u8() as usize;
        let padded_name = if (name_len + 1) % 2 == 0 {
            name_len
        } else {
            name_len + 1
        };
        need(buf, padded_name)?;
        let name = buf[..name_len].to_vec();
        buf.advance(padded_name);

        need(buf, 4)?;
        let size = buf.get_u32() as usize;
        need(buf, size)?;
        let block_data = buf[..size].to_vec();
        buf.advance(size);
        // Final pad byte is occasionally omitted
        if size % 2 != 0 && buf.has_remaining() {
            buf.advance(1);
        }

        blocks.push(ResourceBlock {
            signature,
            id,
            name,
            data: block_data,
        });
    }

    Ok(blocks)
}

/// Serialize resource blocks into as many APP13 payloads as they need.
///
/// No blocks yields no payloads.
pub fn write_segments(blocks: &[ResourceBlock]) -> Result<Vec<Vec<u8>>> {
    let body_len: usize = blocks
        .iter()
        .map(|b| 12 + b.name.len() + b.data.len())
        .sum();
    let mut body = BytesMut::with_capacity(body_len);
    for block in blocks {
        block.write_to(&mut body)?;
    }

    let chunk_len = MAX_SEGMENT_DATA - PHOTOSHOP_HEADER.len();
    Ok(body
        .chunks(chunk_len)
        .map(|chunk| {
            let mut payload = Vec::with_capacity(PHOTOSHOP_HEADER.len() + chunk.len());
            payload.extend_from_slice(PHOTOSHOP_HEADER);
            payload.extend_from_slice(chunk);
            payload
        })
        .collect())
}
