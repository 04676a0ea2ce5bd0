use std::sync::Arc;

/// A finalized recording.
///
/// Opaque to the station: an immutable byte blob that the playback
/// primitive knows how to play. Cloning shares the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    bytes: Arc<[u8]>,
}

impl Asset {
    /// Concatenate captured chunks in arrival order.
    pub fn from_chunks<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        let mut bytes = Vec::new();
        for chunk in chunks {
            bytes.extend_from_slice(chunk.as_ref());
        }
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Interpret the blob as little-endian `f32` PCM (the terminal host's
    /// capture format). A trailing partial sample is ignored.
    pub fn to_pcm(&self) -> Vec<f32> {
        decode_pcm(&self.bytes)
    }
}

/// Little-endian `f32` PCM, the format the terminal host captures in
pub fn encode_pcm(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 4);
    for s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }
    out
}

pub fn decode_pcm(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
