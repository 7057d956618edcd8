//! Binary framing of a cache record.
//!
//! ```text
//! magic    "kitschcache"           11 bytes
//! version  u32 LE                  currently 1
//! entry*   type u32 LE | len u64 LE | bytes
//! ```
//!
//! A record holds one key entry and one value entry. Unknown entry types are
//! skipped so later versions can add metadata without breaking readers.

const MAGIC: &[u8] = b"kitschcache";
const VERSION: u32 = 1;

const ENTRY_VALUE: u32 = 0;
const ENTRY_KEY: u32 = 1;

#[derive(Debug, PartialEq, Eq)]
pub enum FrameError {
    BadMagic,
    UnsupportedVersion(u32),
    Truncated,
    MissingEntry(&'static str),
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameError::BadMagic => write!(f, "not a cache record"),
            FrameError::UnsupportedVersion(v) => write!(f, "unsupported cache version {}", v),
            FrameError::Truncated => write!(f, "cache record is truncated"),
            FrameError::MissingEntry(which) => write!(f, "cache record has no {} entry", which),
        }
    }
}

impl std::error::Error for FrameError {}

/// A decoded record.
#[derive(Debug, PartialEq, Eq)]
pub struct Record {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

fn push_entry(out: &mut Vec<u8>, entry_type: u32, bytes: &[u8]) {
    out.extend_from_slice(&entry_type.to_le_bytes());
    out.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
    out.extend_from_slice(bytes);
}

pub fn encode(key: &[u8], value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAGIC.len() + 4 + 24 + key.len() + value.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&VERSION.to_le_bytes());
    push_entry(&mut out, ENTRY_KEY, key);
    push_entry(&mut out, ENTRY_VALUE, value);
    out
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], FrameError> {
        let end = self.pos.checked_add(n).ok_or(FrameError::Truncated)?;
        if end > self.data.len() {
            return Err(FrameError::Truncated);
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32, FrameError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn u64(&mut self) -> Result<u64, FrameError> {
        let bytes = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(buf))
    }

    fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }
}

pub fn decode(data: &[u8]) -> Result<Record, FrameError> {
    let mut reader = Reader { data, pos: 0 };

    if reader.take(MAGIC.len()).map_err(|_| FrameError::BadMagic)? != MAGIC {
        return Err(FrameError::BadMagic);
    }
    let version = reader.u32()?;
    if version != VERSION {
        return Err(FrameError::UnsupportedVersion(version));
    }

    let mut key = None;
    let mut value = None;
    while !reader.at_end() {
        let entry_type = reader.u32()?;
        let len = usize::try_from(reader.u64()?).map_err(|_| FrameError::Truncated)?;
        let bytes = reader.take(len)?;
        match entry_type {
            ENTRY_KEY => key = Some(bytes.to_vec()),
            ENTRY_VALUE => value = Some(bytes.to_vec()),
            _ => {}
        }
    }

    Ok(Record {
        key: key.ok_or(FrameError::MissingEntry("key"))?,
        value: value.ok_or(FrameError::MissingEntry("value"))?,
    })
}
