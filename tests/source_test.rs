mod common;

use common::{
    f64_column, localized_columns, str_column, write_bzip2, write_file, write_xz, LOCALIZED_CSV,
    SAMPLE_CSV,
};
use polars::prelude::DataType;
use salesdash::config::ColumnsConfig;
use salesdash::schema::{Field, DISCOUNT, REGION, SALE, STATE_CODE};
use salesdash::source::load_transactions;
use salesdash::{CompressionFormat, OpenOptions, SalesError};
use tempfile::TempDir;

#[test]
fn loads_canonical_schema() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "sales.csv", SAMPLE_CSV);
    let df = load_transactions(&path, &OpenOptions::new(), &ColumnsConfig::default()).unwrap();

    assert_eq!(df.height(), 6);
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    let expected: Vec<String> = Field::ALL.iter().map(|f| f.name().to_string()).collect();
    assert_eq!(names, expected);
    assert_eq!(df.column(SALE).unwrap().dtype(), &DataType::Float64);
    assert_eq!(df.column(REGION).unwrap().dtype(), &DataType::String);
}

#[test]
fn maps_localized_headers_and_drops_extra_columns() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "vendas.csv", LOCALIZED_CSV);
    let options = OpenOptions::new().with_delimiter(b';');
    let df = load_transactions(&path, &options, &localized_columns()).unwrap();

    assert_eq!(df.width(), Field::ALL.len());
    assert_eq!(f64_column(&df, SALE)[..2], [100.0, 200.0]);
    assert_eq!(f64_column(&df, DISCOUNT)[2], 0.2);
    assert_eq!(str_column(&df, STATE_CODE)[3], "UT");
}

#[test]
fn missing_mapped_column_is_startup_error() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "sales.csv", SAMPLE_CSV);
    let columns = ColumnsConfig {
        region: "Regiao".to_string(),
        ..ColumnsConfig::default()
    };
    let err = load_transactions(&path, &OpenOptions::new(), &columns).unwrap_err();
    assert!(matches!(err, SalesError::MissingColumn(ref c) if c == "Regiao"));
    assert!(err.is_startup());
}

#[test]
fn missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = load_transactions(
        &dir.path().join("absent.csv"),
        &OpenOptions::new(),
        &ColumnsConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, SalesError::Io(_)));
    assert!(err.is_startup());
}

#[test]
fn unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "sales.json", "{}");
    let err = load_transactions(&path, &OpenOptions::new(), &ColumnsConfig::default())
        .unwrap_err();
    assert!(matches!(err, SalesError::UnsupportedFile(_)));
}

#[test]
fn skip_rows_before_header() {
    let dir = TempDir::new().unwrap();
    let content = format!("exported 2024-01-31\n{}", SAMPLE_CSV);
    let path = write_file(dir.path(), "sales.csv", &content);
    let df = load_transactions(
        &path,
        &OpenOptions::new().with_skip_rows(1),
        &ColumnsConfig::default(),
    )
    .unwrap();
    assert_eq!(df.height(), 6);
}

#[test]
fn reads_bzip2_by_extension() {
    let dir = TempDir::new().unwrap();
    let path = write_bzip2(dir.path(), "sales.csv.bz2", SAMPLE_CSV);
    let df = load_transactions(&path, &OpenOptions::new(), &ColumnsConfig::default()).unwrap();
    assert_eq!(df.height(), 6);
    assert_eq!(f64_column(&df, SALE).iter().sum::<f64>(), 730.0);
}

#[test]
fn reads_xz_with_explicit_compression() {
    let dir = TempDir::new().unwrap();
    // no .xz suffix: detection must come from the option
    let path = write_xz(dir.path(), "sales.csv", SAMPLE_CSV);
    let options = OpenOptions::new().with_compression(CompressionFormat::Xz);
    let df = load_transactions(&path, &options, &ColumnsConfig::default()).unwrap();
    assert_eq!(df.height(), 6);
}
