use crate::formats::png::chunk::{Chunk, PngChunk};
use crate::formats::png::compression;
use crate::utils::error::{ChromaError, ChromaResult};
use crate::utils::traits::SafeAccess;

/// A textual key/value pair carried in tEXt, zTXt or iTXt.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Property {
    pub key: String,
    pub value: String,
}

impl Property {
    /// Creates a property. A key containing NUL is cut at the first one.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Property {
        let mut key = key.into();
        if let Some(pos) = key.find('\0') {
            key.truncate(pos);
        }

        Property {
            key,
            value: value.into(),
        }
    }

    pub fn to_chunk(&self) -> Chunk {
        let mut data = Vec::with_capacity(self.key.len() + 1 + self.value.len());
        data.extend_from_slice(self.key.as_bytes());
        data.push(0);
        data.extend_from_slice(self.value.as_bytes());

        Chunk::new(PngChunk::TEXT.tag(), data)
    }
}

// Splits at the first NUL; the separator itself is dropped.
fn split_nul(data: &[u8]) -> (&[u8], Option<&[u8]>) {
    match data.iter().position(|&b| b == 0) {
        Some(pos) => (&data[..pos], Some(&data[pos + 1..])),
        None => (data, None),
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).to_string()
}

fn parse_text(data: &[u8]) -> Property {
    let (key, value) = split_nul(data);

    Property {
        key: lossy(key),
        value: value.map(lossy).unwrap_or_default(),
    }
}

fn parse_ztxt(data: &[u8]) -> ChromaResult<Property> {
    let (key, rest) = split_nul(data);
    let rest = rest.ok_or(ChromaError::Custom("zTXt chunk has no keyword separator".to_string()))?;

    let method = *rest.get_safe(0)?;
    if method != 0 {
        return Err(ChromaError::UnsupportedFormat(format!(
            "zTXt compression method {}",
            method
        )));
    }

    let text = compression::decompress(&rest[1..])?;

    Ok(Property {
        key: lossy(key),
        value: lossy(&text),
    })
}

fn parse_itxt(data: &[u8]) -> ChromaResult<Property> {
    let (key, rest) = split_nul(data);
    let rest = rest.ok_or(ChromaError::Custom("iTXt chunk has no keyword separator".to_string()))?;

    let flags = rest.get_range_safe(0..2)?;
    let (compressed, method) = (flags[0] == 1, flags[1]);

    // Language tag, then translated keyword
    let (_, rest) = split_nul(&rest[2..]);
    let (_, text) = split_nul(rest.unwrap_or_default());
    let text = text.unwrap_or_default();

    let value = if compressed {
        if method != 0 {
            log::warn!("Invalid compression method in iTXt chunk: {}", method);
        }
        lossy(&compression::decompress(text)?)
    } else {
        lossy(text)
    };

    Ok(Property { key: lossy(key), value })
}

impl TryFrom<&Chunk> for Property {
    type Error = ChromaError;

    fn try_from(chunk: &Chunk) -> ChromaResult<Self> {
        match chunk.kind() {
            Some(PngChunk::TEXT) => Ok(parse_text(chunk.data())),
            Some(PngChunk::ZTXT) => parse_ztxt(chunk.data()),
            Some(PngChunk::ITXT) => parse_itxt(chunk.data()),
            _ => Err(ChromaError::Custom(format!(
                "Chunk {} does not hold text",
                chunk.type_name()
            ))),
        }
    }
}
