//! Listings and Country Lookup Loader
//! Reads the two input tables into Polars DataFrames.

use crate::data::column::{int_values, require};
use crate::data::schema::{COUNTRY, COUNTRY_CODE};
use crate::error::SchemaError;
use encoding_rs::Encoding;
use polars::prelude::*;
use std::collections::HashSet;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Unknown encoding label '{0}'")]
    UnknownEncoding(String),
    #[error("{} is not valid {encoding}", path.display())]
    Encoding {
        path: PathBuf,
        encoding: &'static str,
    },
    #[error("{} is empty", path.display())]
    Empty { path: PathBuf },
    #[error("Failed to parse {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        source: PolarsError,
    },
    #[error("{} line {line}: expected {expected} fields, found {found}", path.display())]
    FieldCount {
        path: PathBuf,
        line: u64,
        expected: u64,
        found: u64,
    },
    #[error("Failed to read records of {}: {source}", path.display())]
    Record {
        path: PathBuf,
        source: csv::Error,
    },
    #[error("{} is a spreadsheet; export the sheet to CSV first", path.display())]
    UnsupportedFormat { path: PathBuf },
    #[error("Invalid lookup table {}: {source}", path.display())]
    Lookup {
        path: PathBuf,
        source: SchemaError,
    },
}

// Labels encoding_rs folds into windows-1252 that name ISO-8859-1 itself.
const LATIN1_LABELS: [&str; 10] = [
    "iso-8859-1",
    "iso8859-1",
    "iso88591",
    "iso_8859-1",
    "iso_8859-1:1987",
    "latin1",
    "l1",
    "iso-ir-100",
    "csisolatin1",
    "cp819",
];

/// Reads CSV tables, decoding them from a declared character encoding.
///
/// encoding_rs resolves `ISO-8859-1` and its aliases to windows-1252, which
/// turns bytes 0x80-0x9F into characters such as '€'. Those labels are
/// decoded byte for byte instead, so 0x80-0x9F stay C1 control characters.
pub struct DataLoader {
    encoding: &'static Encoding,
    latin1: bool,
    infer_schema_length: Option<usize>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self {
            encoding: encoding_rs::WINDOWS_1252,
            latin1: true,
            infer_schema_length: Some(10000),
        }
    }
}

impl DataLoader {
    /// Build a loader for files in the given encoding (e.g. `ISO-8859-1`).
    pub fn new(encoding_label: &str, infer_schema_length: Option<usize>) -> Result<Self, LoaderError> {
        let encoding = Encoding::for_label(encoding_label.as_bytes())
            .ok_or_else(|| LoaderError::UnknownEncoding(encoding_label.to_string()))?;

        let label = encoding_label.trim().to_ascii_lowercase();

        Ok(Self {
            encoding,
            latin1: LATIN1_LABELS.contains(&label.as_str()),
            infer_schema_length,
        })
    }

    pub fn encoding_name(&self) -> &'static str {
        if self.latin1 {
            "ISO-8859-1"
        } else {
            self.encoding.name()
        }
    }

    /// Load the restaurant listings.
    pub fn load_listings(&self, path: &Path) -> Result<DataFrame, LoaderError> {
        let bytes = Self::read_bytes(path)?;
        let text = if self.latin1 {
            bytes.iter().map(|&b| char::from(b)).collect::<String>()
        } else {
            Self::decode(path, &bytes, self.encoding)?
        };
        let df = self.parse_csv(path, text)?;

        info!(
            "Loaded {} listings ({} columns) from {}",
            df.height(),
            df.width(),
            path.display()
        );
        Ok(df)
    }

    /// Load the country code lookup (a CSV export of the country sheet).
    ///
    /// Codes must be unique, otherwise the join would multiply listing rows.
    pub fn load_country_codes(&self, path: &Path) -> Result<DataFrame, LoaderError> {
        let is_spreadsheet = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "xlsx" | "xls" | "xlsm"))
            .unwrap_or(false);
        if is_spreadsheet {
            return Err(LoaderError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }

        let bytes = Self::read_bytes(path)?;
        let text = Self::decode(path, &bytes, encoding_rs::UTF_8)?;
        let df = self.parse_csv(path, text)?;

        Self::validate_lookup(&df).map_err(|source| LoaderError::Lookup {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Loaded {} country codes from {}", df.height(), path.display());
        Ok(df)
    }

    fn validate_lookup(df: &DataFrame) -> Result<(), SchemaError> {
        require(df, COUNTRY)?;

        let mut seen = HashSet::new();
        for code in int_values(df, COUNTRY_CODE)?.into_iter().flatten() {
            if !seen.insert(code) {
                return Err(SchemaError::DuplicateKey {
                    column: COUNTRY_CODE.to_string(),
                    key: code.to_string(),
                });
            }
        }
        Ok(())
    }

    fn read_bytes(path: &Path) -> Result<Vec<u8>, LoaderError> {
        if !path.exists() {
            return Err(LoaderError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let bytes = std::fs::read(path).map_err(|source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(LoaderError::Empty {
                path: path.to_path_buf(),
            });
        }
        Ok(bytes)
    }

    /// Decode file contents to UTF-8 text.
    fn decode(path: &Path, bytes: &[u8], encoding: &'static Encoding) -> Result<String, LoaderError> {
        let (text, used, had_errors) = encoding.decode(bytes);
        if had_errors {
            return Err(LoaderError::Encoding {
                path: path.to_path_buf(),
                encoding: used.name(),
            });
        }
        debug!("Decoded {} bytes of {} as {}", bytes.len(), path.display(), used.name());

        Ok(text.into_owned())
    }

    /// Every record must have exactly as many fields as the header.
    ///
    /// polars pads short rows with nulls, which the cleaner would then impute.
    fn check_field_counts(path: &Path, text: &str) -> Result<(), LoaderError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(text.as_bytes());

        let mut record = csv::ByteRecord::new();
        loop {
            match reader.read_byte_record(&mut record) {
                Ok(true) => {}
                Ok(false) => return Ok(()),
                Err(err) => {
                    if let csv::ErrorKind::UnequalLengths {
                        pos,
                        expected_len,
                        len,
                    } = err.kind()
                    {
                        return Err(LoaderError::FieldCount {
                            path: path.to_path_buf(),
                            line: pos.as_ref().map(|p| p.line()).unwrap_or(0),
                            expected: *expected_len,
                            found: *len,
                        });
                    }
                    return Err(LoaderError::Record {
                        path: path.to_path_buf(),
                        source: err,
                    });
                }
            }
        }
    }

    fn parse_csv(&self, path: &Path, text: String) -> Result<DataFrame, LoaderError> {
        Self::check_field_counts(path, &text)?;

        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .into_reader_with_file_handle(Cursor::new(text.into_bytes()))
            .finish()
            .map_err(|source| LoaderError::Malformed {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_bytes(bytes: &[u8], suffix: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_latin1_listings_decode() {
        // 0xE9 is 'é' in ISO-8859-1 and invalid as a lone UTF-8 byte
        let file = write_bytes(b"Restaurant Name,Votes\nCaf\xe9 Bleu,12\n", ".csv");
        let loader = DataLoader::new("ISO-8859-1", Some(100)).unwrap();

        let df = loader.load_listings(file.path()).unwrap();
        let name = df.column("Restaurant Name").unwrap().str().unwrap().get(0);
        assert_eq!(name, Some("Café Bleu"));
    }

    #[test]
    fn test_latin1_keeps_c1_bytes() {
        // 0x93 is a C1 control in ISO-8859-1 but a curly quote in windows-1252
        let file = write_bytes(b"Restaurant Name,Votes\nA\x93B,1\n", ".csv");

        let latin1 = DataLoader::new("ISO-8859-1", None).unwrap();
        let df = latin1.load_listings(file.path()).unwrap();
        let name = df.column("Restaurant Name").unwrap().str().unwrap().get(0);
        assert_eq!(name, Some("A\u{93}B"));
        assert_eq!(latin1.encoding_name(), "ISO-8859-1");

        let cp1252 = DataLoader::new("windows-1252", None).unwrap();
        let df = cp1252.load_listings(file.path()).unwrap();
        let name = df.column("Restaurant Name").unwrap().str().unwrap().get(0);
        assert_eq!(name, Some("A\u{201c}B"));
    }

    #[test]
    fn test_short_row_rejected() {
        let file = write_bytes(
            b"Restaurant ID,Cuisines,Aggregate rating,Votes\n1,Cafe,3.5,10\n2,Bar\n",
            ".csv",
        );
        let err = DataLoader::default().load_listings(file.path()).unwrap_err();
        match err {
            LoaderError::FieldCount {
                line,
                expected,
                found,
                ..
            } => {
                assert_eq!(line, 3);
                assert_eq!(expected, 4);
                assert_eq!(found, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_long_row_rejected() {
        let file = write_bytes(b"Restaurant ID,Votes\n1,10\n2,20,extra\n", ".csv");
        let err = DataLoader::default().load_listings(file.path()).unwrap_err();
        assert!(matches!(
            err,
            LoaderError::FieldCount {
                expected: 2,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_quoted_delimiter_is_one_field() {
        let file = write_bytes(b"Restaurant ID,Cuisines\n1,\"Cafe, Bakery\"\n", ".csv");
        let df = DataLoader::default().load_listings(file.path()).unwrap();
        assert_eq!(df.shape(), (1, 2));
    }

    #[test]
    fn test_missing_file() {
        let loader = DataLoader::default();
        let err = loader
            .load_listings(Path::new("/definitely/not/here.csv"))
            .unwrap_err();
        assert!(matches!(err, LoaderError::FileNotFound { .. }));
    }

    #[test]
    fn test_empty_file() {
        let file = write_bytes(b"", ".csv");
        let err = DataLoader::default().load_listings(file.path()).unwrap_err();
        assert!(matches!(err, LoaderError::Empty { .. }));
    }

    #[test]
    fn test_utf8_lookup_rejects_invalid_bytes() {
        let file = write_bytes(b"Country Code,Country\n1,Ind\xffia\n", ".csv");
        let err = DataLoader::default().load_country_codes(file.path()).unwrap_err();
        assert!(matches!(err, LoaderError::Encoding { .. }));
    }

    #[test]
    fn test_lookup_duplicate_codes() {
        let file = write_bytes(b"Country Code,Country\n1,India\n1,Indonesia\n", ".csv");
        let err = DataLoader::default().load_country_codes(file.path()).unwrap_err();
        assert!(matches!(
            err,
            LoaderError::Lookup {
                source: SchemaError::DuplicateKey { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_lookup_requires_country_column() {
        let file = write_bytes(b"Country Code,Name\n1,India\n", ".csv");
        let err = DataLoader::default().load_country_codes(file.path()).unwrap_err();
        assert!(matches!(
            err,
            LoaderError::Lookup {
                source: SchemaError::MissingColumn { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_spreadsheet_rejected() {
        let file = write_bytes(b"PK\x03\x04", ".xlsx");
        let err = DataLoader::default().load_country_codes(file.path()).unwrap_err();
        assert!(matches!(err, LoaderError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_unknown_encoding_label() {
        assert!(matches!(
            DataLoader::new("ebcdic-klingon", None),
            Err(LoaderError::UnknownEncoding(_))
        ));
    }
}
