use serde::{Deserialize, Serialize};

/// Finalized output of a recording session: the encoded audio bytes plus the
/// metadata a consumer needs to label them (e.g. a multipart upload to a
/// speech-to-text endpoint, or a history entry).
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingBlob {
    pub bytes: Vec<u8>,
    pub metadata: BlobMetadata,
}

impl RecordingBlob {
    pub fn new(bytes: Vec<u8>, content_type: String, duration_secs: f64) -> Self {
        let size_bytes = bytes.len() as u64;
        Self {
            bytes,
            metadata: BlobMetadata {
                id: uuid::Uuid::new_v4().to_string(),
                content_type,
                size_bytes,
                duration_secs,
                captured_at: chrono::Utc::now().to_rfc3339(),
            },
        }
    }

    /// The negotiated container/codec label for the encoded bytes.
    pub fn content_type(&self) -> &str {
        &self.metadata.content_type
    }
}

/// Serializable sidecar describing a recording blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobMetadata {
    pub id: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub duration_secs: f64,
    pub captured_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_reflects_bytes() {
        let blob = RecordingBlob::new(vec![1, 2, 3, 4], "audio/webm".into(), 1.5);
        assert_eq!(blob.metadata.size_bytes, 4);
        assert_eq!(blob.content_type(), "audio/webm");
        assert!(!blob.metadata.id.is_empty());
    }

    #[test]
    fn metadata_round_trips_as_json() {
        let blob = RecordingBlob::new(vec![0; 10], "audio/wav".into(), 0.25);
        let json = serde_json::to_string(&blob.metadata).unwrap();
        let back: BlobMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, blob.metadata);
    }
}
