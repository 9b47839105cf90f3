//! Fixed-width encoding of tag index keys.
//!
//! ```text
//! +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//! | 0 | 1 |    ...    | 6 | 7 | 8 | 9 |10 |11 |12 |13 |14 |15 |16 |17 |18 |19 |20 |21 |22 |23 |
//! +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//! |     Conversation (i64)        |   Tags (u32)  | Timestamp(i32)| Namespace(i32)| Local Id(i32) |
//! +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//! ```
//!
//! Fields are big-endian. Signed fields have their sign bit flipped so that the byte order of an
//! encoded key matches the numeric order of its fields.

use crate::sort::{ConversationId, SortKey, Tags};
use bytes::{Buf, BufMut};
use commonware_codec::{Error as CodecError, FixedSize, Read, Write};

const SIGN_64: u64 = 1 << 63;
const SIGN_32: u32 = 1 << 31;

/// Length of the (conversation, tags) prefix shared by every key of a group.
pub const PREFIX_SIZE: usize = 8 + 4;

/// A key of the tag index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Key {
    pub tags: Tags,
    pub sort: SortKey,
}

impl Key {
    pub const fn new(tags: Tags, sort: SortKey) -> Self {
        Self { tags, sort }
    }

    /// Encode the (conversation, tags) prefix of a group.
    pub fn prefix(tags: Tags, conversation: ConversationId) -> [u8; PREFIX_SIZE] {
        let mut buf = [0u8; PREFIX_SIZE];
        let mut cursor = &mut buf[..];
        cursor.put_u64(conversation as u64 ^ SIGN_64);
        cursor.put_u32(tags.bits());
        buf
    }

    /// Encode the key into its byte representation.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        self.write(&mut &mut buf[..]);
        buf
    }
}

impl Write for Key {
    fn write(&self, buf: &mut impl BufMut) {
        buf.put_u64(self.sort.conversation as u64 ^ SIGN_64);
        buf.put_u32(self.tags.bits());
        buf.put_u32(self.sort.timestamp as u32 ^ SIGN_32);
        buf.put_u32(self.sort.namespace as u32 ^ SIGN_32);
        buf.put_u32(self.sort.local_id as u32 ^ SIGN_32);
    }
}

impl Read for Key {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        if buf.remaining() < Self::SIZE {
            return Err(CodecError::EndOfBuffer);
        }
        let conversation = (buf.get_u64() ^ SIGN_64) as i64;
        let tags = Tags::new(buf.get_u32());
        let timestamp = (buf.get_u32() ^ SIGN_32) as i32;
        let namespace = (buf.get_u32() ^ SIGN_32) as i32;
        let local_id = (buf.get_u32() ^ SIGN_32) as i32;
        Ok(Self {
            tags,
            sort: SortKey::new(conversation, namespace, local_id, timestamp),
        })
    }
}

impl FixedSize for Key {
    const SIZE: usize = PREFIX_SIZE + 4 + 4 + 4;
}
