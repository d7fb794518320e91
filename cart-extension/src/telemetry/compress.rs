use crate::errors::TelemetryError;
use bytes::Bytes;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;

/// Gzip-compresses `payload` in full. There is no partial output on failure.
pub fn gzip(payload: &[u8]) -> Result<Bytes, TelemetryError> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(payload.len() / 2), Compression::default());
    encoder
        .write_all(payload)
        .map_err(TelemetryError::Compression)?;
    let compressed = encoder.finish().map_err(TelemetryError::Compression)?;
    Ok(Bytes::from(compressed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{TelemetryEvent, build_events};
    use crate::testutils::{cart_json, gunzip};

    #[test]
    fn test_gzip_header() {
        let compressed = gzip(b"[]").unwrap();
        assert_eq!(&compressed[..2], &[0x1f, 0x8b]);
        assert_eq!(gunzip(&compressed), b"[]");
    }

    #[test]
    fn test_event_payload_survives_compression() {
        let cart = serde_json::from_value(cart_json(&[3, 1, 2])).unwrap();
        let events = build_events(&cart);
        let json = serde_json::to_vec(&events).unwrap();

        let compressed = gzip(&json).unwrap();
        let restored: Vec<TelemetryEvent> = serde_json::from_slice(&gunzip(&compressed)).unwrap();

        assert_eq!(restored, events);
    }

    #[test]
    fn test_empty_payload() {
        let compressed = gzip(&[]).unwrap();
        assert!(gunzip(&compressed).is_empty());
    }
}
