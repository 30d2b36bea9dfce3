use std::{
    fs::File,
    io::{self, Read},
    path::Path,
};

use tracing::debug;

use crate::loader::record::Record;

#[derive(thiserror::Error, Debug)]
pub enum InputError {
    #[error("Could not read input: {0}")]
    Io(#[from] io::Error),

    #[error("Input is not a JSON array of objects: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decodes a payload into records. `Ok(None)` means there was nothing to load.
pub fn parse_batch(payload: &str) -> Result<Option<Vec<Record>>, InputError> {
    if payload.trim().is_empty() {
        debug!("Input is empty, nothing to load");
        return Ok(None);
    }

    let records: Vec<Record> = serde_json::from_str(payload)?;
    Ok(Some(records))
}

/// Reads the whole of `reader` and decodes it with [`parse_batch`].
pub fn read_batch_from_input<R: Read>(mut reader: R) -> Result<Option<Vec<Record>>, InputError> {
    let mut payload = String::new();
    reader.read_to_string(&mut payload)?;
    parse_batch(&payload)
}

pub fn read_batch_from_path(path: &Path) -> Result<Option<Vec<Record>>, InputError> {
    read_batch_from_input(File::open(path)?)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_empty_and_whitespace_input() {
        assert!(read_batch_from_input("".as_bytes()).unwrap().is_none());
        assert!(read_batch_from_input(" \n\t \r\n".as_bytes()).unwrap().is_none());
    }

    #[test]
    fn test_array_of_objects() {
        let records =
            read_batch_from_input(r#"[{"x": "1"}, {"y": 2}]"#.as_bytes()).unwrap().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("x"), Some(Some("1")));
        assert_eq!(records[1].get("y"), Some(Some("2")));
    }

    #[test]
    fn test_empty_array_is_a_batch() {
        let records = read_batch_from_input("[]".as_bytes()).unwrap();
        assert_eq!(records, Some(vec![]));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            read_batch_from_input(r#"[{"x": "1"},"#.as_bytes()),
            Err(InputError::Malformed(_))
        ));
    }

    #[test]
    fn test_single_object_is_rejected() {
        assert!(matches!(
            read_batch_from_input(r#"{"x": "1"}"#.as_bytes()),
            Err(InputError::Malformed(_))
        ));
    }

    #[test]
    fn test_array_of_scalars_is_rejected() {
        assert!(matches!(
            read_batch_from_input("[1, 2]".as_bytes()),
            Err(InputError::Malformed(_))
        ));
    }

    #[test]
    fn test_invalid_utf8_is_an_io_error() {
        assert!(matches!(read_batch_from_input(&[0xff, 0xfe][..]), Err(InputError::Io(_))));
    }

    #[test]
    fn test_read_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"Account Number": "12345"}}]"#).unwrap();

        let records = read_batch_from_path(file.path()).unwrap().unwrap();
        assert_eq!(records[0].get("Account Number"), Some(Some("12345")));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            read_batch_from_path(Path::new("/definitely/not/here.json")),
            Err(InputError::Io(_))
        ));
    }
}
