//! File encoding: raw bytes → base64 data-URI for the vision request body.
//!
//! The MIME type is always `image/png`, whatever the source format. The
//! model endpoint sniffs the payload itself and has accepted JPEG, BMP and
//! TIFF bytes under this label.

use crate::error::RecognizeError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use tracing::debug;

const DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Read `path` and wrap its bytes in a `data:image/png;base64,` URI.
pub async fn encode_file(path: &Path) -> Result<String, RecognizeError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| RecognizeError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

    let uri = to_data_uri(&bytes);
    debug!(
        "Encoded {} → {} bytes base64",
        path.display(),
        uri.len() - DATA_URI_PREFIX.len()
    );
    Ok(uri)
}

/// Wrap raw bytes in a PNG data-URI.
pub fn to_data_uri(bytes: &[u8]) -> String {
    let mut uri = String::with_capacity(DATA_URI_PREFIX.len() + bytes.len().div_ceil(3) * 4);
    uri.push_str(DATA_URI_PREFIX);
    STANDARD.encode_string(bytes, &mut uri);
    uri
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn empty_file_yields_bare_prefix() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let uri = encode_file(file.path()).await.unwrap();
        assert_eq!(uri, "data:image/png;base64,");
    }

    #[tokio::test]
    async fn payload_decodes_to_file_bytes() {
        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        file.write_all(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]).unwrap();

        let uri = encode_file(file.path()).await.unwrap();
        let payload = uri.strip_prefix("data:image/png;base64,").expect("png label");
        assert_eq!(STANDARD.decode(payload).unwrap(), vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00]);
    }

    #[tokio::test]
    async fn missing_file_is_file_read_error() {
        let err = encode_file(Path::new("/definitely/not/here.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, RecognizeError::FileRead { .. }), "got: {err:?}");
    }
}
