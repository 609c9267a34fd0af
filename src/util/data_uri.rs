//! `data:` URL decoding

use base64::{engine::general_purpose::STANDARD, Engine as _};

use super::{UtilError, UtilResult};

const UNKNOWN_NAME: &str = "unknown";

/// Decoded content of a `data:` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataBlob {
    pub mime_type: String,
    /// Value of the `name=` parameter, or `unknown`
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Decodes `data:<type>;name=<name>;base64,<payload>`
pub fn data_uri_to_blob(uri: &str) -> UtilResult<DataBlob> {
    let (header, payload) = uri
        .split_once(',')
        .ok_or_else(|| UtilError::MalformedDataUri("missing ',' separator".into()))?;
    let header = header
        .strip_prefix("data:")
        .ok_or_else(|| UtilError::MalformedDataUri("missing 'data:' scheme".into()))?;

    let mut params = header.split(';');
    let mime_type = params.next().unwrap_or_default().to_string();
    let names: Vec<&str> = params
        .filter_map(|param| param.split_once('='))
        .filter(|(key, _)| *key == "name")
        .map(|(_, value)| value)
        .collect();
    let name = match names.as_slice() {
        [single] => single.to_string(),
        _ => UNKNOWN_NAME.to_string(),
    };

    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| UtilError::MalformedDataUri(e.to_string()))?;

    Ok(DataBlob { mime_type, name, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_named_payload() {
        let blob = data_uri_to_blob("data:text/plain;name=hello.txt;base64,aGVsbG8=").unwrap();
        assert_eq!(blob.mime_type, "text/plain");
        assert_eq!(blob.name, "hello.txt");
        assert_eq!(blob.bytes, b"hello");
    }

    #[test]
    fn test_missing_name_is_unknown() {
        let blob = data_uri_to_blob("data:image/png;base64,AAEC").unwrap();
        assert_eq!(blob.name, "unknown");
        assert_eq!(blob.bytes, vec![0, 1, 2]);
    }

    #[test]
    fn test_malformed() {
        assert!(data_uri_to_blob("text/plain;base64,aGk=").is_err());
        assert!(data_uri_to_blob("data:text/plain;base64").is_err());
        assert!(data_uri_to_blob("data:text/plain;base64,@@@").is_err());
    }
}
