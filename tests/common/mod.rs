#![allow(dead_code)]

use polars::prelude::*;
use salesdash::config::ColumnsConfig;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Six transactions over four states. Ohio and Utah tie on total sale (300), Maine has a
/// single zero-sale row.
pub const SAMPLE_CSV: &str = "\
sale,profit,discount,quantity,delivery_type,segment,category,sub_category,state,state_code,region
100,20,0,1,Standard,Consumer,Office,Paper,Ohio,OH,East
200,40,0,2,Express,Corporate,Office,Binders,Ohio,OH,East
50,-10,0.2,3,Standard,Consumer,Technology,Phones,Texas,TX,Central
300,30,0.1,1,Same Day,Home Office,Furniture,Chairs,Utah,UT,West
80,-8,0.2,4,Express,Consumer,Technology,Phones,Texas,TX,Central
0,-2,0.5,1,Standard,Corporate,Office,Paper,Maine,ME,East
";

/// Same rows with localized, padded headers and `;` separators.
pub const LOCALIZED_CSV: &str = "\
 Venda ;Lucro;Desconto;Quantidade;Tipo Entrega;Segmento;Categoria;Sub-Categoria;Estado;Codigo_Estado;Regiao;Cliente
100;20;0;1;Standard;Consumer;Office;Paper;Ohio;OH;East;c1
200;40;0;2;Express;Corporate;Office;Binders;Ohio;OH;East;c2
50;-10;0.2;3;Standard;Consumer;Technology;Phones;Texas;TX;Central;c3
300;30;0.1;1;Same Day;Home Office;Furniture;Chairs;Utah;UT;West;c4
80;-8;0.2;4;Express;Consumer;Technology;Phones;Texas;TX;Central;c5
0;-2;0.5;1;Standard;Corporate;Office;Paper;Maine;ME;East;c6
";

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

pub fn write_bzip2(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    let file = fs::File::create(&path).unwrap();
    let mut encoder = bzip2::write::BzEncoder::new(file, bzip2::Compression::default());
    encoder.write_all(content.as_bytes()).unwrap();
    encoder.finish().unwrap();
    path
}

pub fn write_xz(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    let file = fs::File::create(&path).unwrap();
    let mut encoder = xz2::write::XzEncoder::new(file, 6);
    encoder.write_all(content.as_bytes()).unwrap();
    encoder.finish().unwrap();
    path
}

pub fn localized_columns() -> ColumnsConfig {
    ColumnsConfig {
        sale: "Venda".to_string(),
        profit: "Lucro".to_string(),
        discount: "Desconto".to_string(),
        quantity: "Quantidade".to_string(),
        delivery_type: "Tipo Entrega".to_string(),
        segment: "Segmento".to_string(),
        category: "Categoria".to_string(),
        sub_category: "Sub-Categoria".to_string(),
        state: "Estado".to_string(),
        state_code: "Codigo_Estado".to_string(),
        region: "Regiao".to_string(),
    }
}

pub fn f64_column(df: &DataFrame, name: &str) -> Vec<f64> {
    df.column(name)
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect()
}

pub fn str_column(df: &DataFrame, name: &str) -> Vec<String> {
    df.column(name)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect()
}
