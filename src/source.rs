//! Reads a transaction CSV into the canonical schema.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use polars::prelude::*;
use tracing::{debug, info};

use crate::config::ColumnsConfig;
use crate::error::{Result, SalesError};
use crate::schema::Field;
use crate::{CompressionFormat, OpenOptions};

/// Load `path` and map its headers onto the canonical column names.
///
/// Numeric fields are cast to `Float64`, every other field to `String`. Columns not
/// named in `columns` are dropped.
pub fn load_transactions(
    path: &Path,
    options: &OpenOptions,
    columns: &ColumnsConfig,
) -> Result<DataFrame> {
    if !path.exists() {
        return Err(SalesError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }

    let compression = options
        .compression
        .or_else(|| CompressionFormat::from_extension(path));
    if !is_delimited(path, compression.is_some()) {
        return Err(SalesError::UnsupportedFile(path.display().to_string()));
    }

    let mut df = read_csv(path, options, compression)?;
    trim_headers(&mut df)?;
    info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "read transactions file"
    );

    select_fields(df, columns)
}

fn read_options(options: &OpenOptions) -> CsvReadOptions {
    let mut read_options = CsvReadOptions::default();
    if let Some(skip_rows) = options.skip_rows {
        read_options.skip_rows = skip_rows;
    }
    if let Some(has_header) = options.has_header {
        read_options.has_header = has_header;
    }
    if let Some(delimiter) = options.delimiter {
        read_options = read_options.map_parse_options(|opts| opts.with_separator(delimiter));
    }
    read_options
}

fn read_csv(
    path: &Path,
    options: &OpenOptions,
    compression: Option<CompressionFormat>,
) -> Result<DataFrame> {
    let read_options = read_options(options);
    let df = match compression {
        Some(CompressionFormat::Bzip2) => {
            let file = File::open(path)?;
            let decoder = bzip2::read::BzDecoder::new(BufReader::new(file));
            read_decompressed(decoder, read_options)?
        }
        Some(CompressionFormat::Xz) => {
            let file = File::open(path)?;
            let decoder = xz2::read::XzDecoder::new(BufReader::new(file));
            read_decompressed(decoder, read_options)?
        }
        // polars handles plain, gzip and zstd input itself
        _ => read_options
            .try_into_reader_with_file_path(Some(path.into()))?
            .finish()?,
    };
    Ok(df)
}

fn read_decompressed<R: Read>(mut decoder: R, read_options: CsvReadOptions) -> Result<DataFrame> {
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;
    debug!(bytes = decompressed.len(), "decompressed in memory");
    let df = CsvReader::new(std::io::Cursor::new(decompressed))
        .with_options(read_options)
        .finish()?;
    Ok(df)
}

/// `.csv`, `.tsv`, `.txt` and, when compressed, their variants (`sales.csv.gz`).
fn is_delimited(path: &Path, compressed: bool) -> bool {
    fn known(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                ["csv", "tsv", "txt"]
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
            .unwrap_or(false)
    }
    known(path)
        || (compressed
            && path
                .file_stem()
                .map(|stem| known(Path::new(stem)))
                .unwrap_or(false))
}

fn trim_headers(df: &mut DataFrame) -> Result<()> {
    let trimmed: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.trim().to_string())
        .collect();
    df.set_column_names(trimmed)?;
    Ok(())
}

fn select_fields(df: DataFrame, columns: &ColumnsConfig) -> Result<DataFrame> {
    let mut exprs = Vec::with_capacity(Field::ALL.len());
    for field in Field::ALL {
        let header = columns.header(field).trim();
        if df.get_column_index(header).is_none() {
            return Err(SalesError::MissingColumn(header.to_string()));
        }
        let dtype = if field.is_numeric() {
            DataType::Float64
        } else {
            DataType::String
        };
        exprs.push(col(header).cast(dtype).alias(field.name()));
    }
    Ok(df.lazy().select(exprs).collect()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn delimited_extensions() {
        assert!(is_delimited(&PathBuf::from("sales.csv"), false));
        assert!(is_delimited(&PathBuf::from("sales.TSV"), false));
        assert!(is_delimited(&PathBuf::from("sales.csv.gz"), true));
        assert!(!is_delimited(&PathBuf::from("sales.parquet"), false));
        assert!(!is_delimited(&PathBuf::from("sales.gz"), true));
        assert!(!is_delimited(&PathBuf::from("sales"), false));
    }

    #[test]
    fn headers_are_trimmed() {
        let mut df = df!(" sale " => &[1.0_f64], "profit\t" => &[2.0_f64]).unwrap();
        trim_headers(&mut df).unwrap();
        assert!(df.column("sale").is_ok());
        assert!(df.column("profit").is_ok());
    }
}
