// src/pids/codec.rs

//! Binary encoding of the persisted pid map.
//!
//! ```text
//! b"GMNP" | version: u8 | count: u32 LE | count × (len: u16 LE | name | pid: u32 LE)
//! ```
//!
//! An empty byte slice decodes to an empty map so that a freshly created
//! file means "nothing to reap".

use std::collections::BTreeMap;

use crate::types::AppName;

const MAGIC: &[u8; 4] = b"GMNP";
const VERSION: u8 = 1;

pub fn encode(map: &BTreeMap<AppName, u32>) -> Vec<u8> {
    let mut out = Vec::with_capacity(9 + map.len() * 16);
    out.extend_from_slice(MAGIC);
    out.push(VERSION);
    out.extend_from_slice(&(map.len() as u32).to_le_bytes());
    for (name, pid) in map {
        let name = name.as_bytes();
        let len = name.len().min(u16::MAX as usize);
        out.extend_from_slice(&(len as u16).to_le_bytes());
        out.extend_from_slice(&name[..len]);
        out.extend_from_slice(&pid.to_le_bytes());
    }
    out
}

pub fn decode(bytes: &[u8]) -> Result<BTreeMap<AppName, u32>, String> {
    if bytes.is_empty() {
        return Ok(BTreeMap::new());
    }

    let mut reader = Reader { bytes, pos: 0 };
    if reader.take(4)? != MAGIC {
        return Err("bad magic".to_string());
    }
    let version = reader.take(1)?[0];
    if version != VERSION {
        return Err(format!("unsupported version {version}"));
    }

    let count = reader.u32()?;
    let mut map = BTreeMap::new();
    for _ in 0..count {
        let len = reader.u16()? as usize;
        let name = std::str::from_utf8(reader.take(len)?)
            .map_err(|e| format!("name is not UTF-8: {e}"))?
            .to_string();
        let pid = reader.u32()?;
        map.insert(name, pid);
    }

    if reader.pos != bytes.len() {
        return Err(format!("{} trailing bytes", bytes.len() - reader.pos));
    }
    Ok(map)
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], String> {
        let end = self.pos.checked_add(n).filter(|end| *end <= self.bytes.len());
        let Some(end) = end else {
            return Err(format!("truncated at byte {}", self.pos));
        };
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u16(&mut self) -> Result<u16, String> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, String> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}
