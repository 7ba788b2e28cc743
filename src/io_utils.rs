//! File plumbing for a comparison run: opening the two input CSVs (the source
//! may be `-` for stdin), decoding their bytes, and creating the report,
//! error-record and summary outputs (stdout when no path is given).

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

pub const COMMA: u8 = b',';
pub const TAB: u8 = b'\t';

pub fn is_stdio(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label {
        Some(value) => Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'")),
        None => Ok(UTF_8),
    }
}

/// An explicit delimiter wins; otherwise `.tsv` files are tab separated and
/// everything else is comma separated.
pub fn resolve_input_delimiter(path: &Path, explicit: Option<u8>) -> u8 {
    explicit.unwrap_or_else(|| {
        let is_tsv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("tsv"));
        if is_tsv { TAB } else { COMMA }
    })
}

/// Headed, strictly rectangular reader; ragged rows surface as read errors.
pub fn csv_reader<R: Read>(reader: R, delimiter: u8) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(false)
        .from_reader(reader)
}

pub fn open_input(path: &Path, delimiter: u8) -> Result<csv::Reader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if is_stdio(path) {
        Box::new(std::io::stdin().lock())
    } else {
        let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
        Box::new(BufReader::new(file))
    };
    Ok(csv_reader(reader, delimiter))
}

pub fn create_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(p) if !is_stdio(p) => {
            let file = File::create(p).with_context(|| format!("Creating output file {p:?}"))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        _ => Ok(Box::new(std::io::stdout())),
    }
}

/// Comma-separated UTF-8 writer quoting only fields that need it.
pub fn csv_writer(path: Option<&Path>) -> Result<csv::Writer<Box<dyn Write>>> {
    Ok(csv::WriterBuilder::new()
        .delimiter(COMMA)
        .quote_style(QuoteStyle::Necessary)
        .from_writer(create_output(path)?))
}

/// Decodes every field of `record`; a leading byte order mark is dropped.
pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            let (text, _, had_errors) = encoding.decode(field);
            if had_errors {
                Err(anyhow!(
                    "Field {} is not valid {} text",
                    idx + 1,
                    encoding.name()
                ))
            } else {
                Ok(text.into_owned())
            }
        })
        .collect()
}

pub fn read_header_row<R: Read>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<Vec<String>> {
    let headers = reader.byte_headers().context("Reading header row")?.clone();
    decode_record(&headers, encoding)
}
