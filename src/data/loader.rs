use serde::Deserialize;
use serde_json::Value;

use super::decode::{decode_text, TextEncoding, DEFAULT_CHAIN};
use super::model::{MeasurementSeries, RawSample, Variant};
use crate::error::ReadError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Decodes the raw bytes of one measurement file.
pub trait FormatReader: Send + Sync {
    fn read(&self, bytes: &[u8]) -> Result<MeasurementSeries, ReadError>;
}

/// Reader strategy for a format variant.
pub fn reader_for(variant: Variant) -> Box<dyn FormatReader> {
    match variant {
        Variant::Structured => Box::new(StructuredReader::default()),
        Variant::Delimited => Box::new(DelimitedTextReader),
    }
}

// ---------------------------------------------------------------------------
// Structured (session JSON) reader
// ---------------------------------------------------------------------------

/// Expected payload, possibly wrapped in non-JSON bytes:
///
/// ```json
/// { "Measurements": [ { "DataSet": { "Values": [
///     { "Description": "time",      "DataValues": [ {"V": 0.0, "S": 0}, ... ] },
///     { "Description": "potential", "DataValues": [ {"V": 0.41, "S": 0}, ... ] }
/// ] } } ] }
/// ```
#[derive(Debug, Clone)]
pub struct StructuredReader {
    pub encodings: Vec<TextEncoding>,
}

impl Default for StructuredReader {
    fn default() -> Self {
        StructuredReader {
            encodings: DEFAULT_CHAIN.to_vec(),
        }
    }
}

// Only the first measurement and its `time`/`potential` channels are typed;
// everything else in the session stays as loose JSON.
#[derive(Debug, Deserialize)]
struct Session {
    #[serde(rename = "Measurements")]
    measurements: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Measurement {
    #[serde(rename = "DataSet")]
    data_set: DataSet,
}

#[derive(Debug, Deserialize)]
struct DataSet {
    #[serde(rename = "Values")]
    values: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "Description", default)]
    description: Value,
    #[serde(rename = "DataValues", default)]
    data_values: Value,
}

#[derive(Debug, Deserialize)]
struct DataValue {
    #[serde(rename = "V", default)]
    value: Value,
    #[serde(rename = "S", default)]
    status: Value,
}

impl DataValue {
    /// `S` compares numerically, so `0` and `0.0` are both valid.
    fn is_valid(&self) -> bool {
        self.status.as_f64() == Some(0.0)
    }

    fn number(&self, label: &str, index: usize) -> Result<f64, ReadError> {
        self.value.as_f64().ok_or_else(|| {
            ReadError::parse(format!("'{label}' value {index} is not a number: {}", self.value))
        })
    }
}

impl FormatReader for StructuredReader {
    /// Malformed payloads are logged and yield an empty series.
    fn read(&self, bytes: &[u8]) -> Result<MeasurementSeries, ReadError> {
        let (text, _) = decode_text(bytes, &self.encodings)?;
        match parse_session(&text) {
            Ok(series) => Ok(series),
            Err(e) => {
                log::warn!("Failed to parse session payload, check if the file is corrupted: {e}");
                Ok(MeasurementSeries::default())
            }
        }
    }
}

/// Parse of decoded session text. Fails if the first measurement lacks a
/// `time` or `potential` channel or either holds a non-numeric reading.
pub fn parse_session(text: &str) -> Result<MeasurementSeries, ReadError> {
    let payload = brace_span(text).ok_or_else(|| ReadError::parse("no {...} payload found"))?;
    let session: Session =
        serde_json::from_str(payload).map_err(|e| ReadError::parse(format!("invalid JSON: {e}")))?;

    let first = session
        .measurements
        .into_iter()
        .next()
        .ok_or_else(|| ReadError::parse("session contains no measurements"))?;
    let measurement: Measurement = serde_json::from_value(first)
        .map_err(|e| ReadError::parse(format!("invalid first measurement: {e}")))?;
    let channels = &measurement.data_set.values;

    let time = channel(channels, "time")?
        .iter()
        .enumerate()
        .map(|(i, dv)| dv.number("time", i))
        .collect::<Result<Vec<f64>, _>>()?;
    let voltage = channel(channels, "potential")?
        .iter()
        .enumerate()
        .filter(|(_, dv)| dv.is_valid())
        .map(|(i, dv)| dv.number("potential", i))
        .collect::<Result<Vec<f64>, _>>()?;

    Ok(MeasurementSeries::zip_timed(&time, &voltage))
}

/// Span from the first `{` to the last `}`, inclusive.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn channel(channels: &[Channel], description: &str) -> Result<Vec<DataValue>, ReadError> {
    let found = channels
        .iter()
        .find(|c| c.description.as_str() == Some(description))
        .ok_or_else(|| ReadError::parse(format!("no '{description}' dataset")))?;
    if found.data_values.is_null() {
        return Ok(Vec::new());
    }
    Vec::<DataValue>::deserialize(&found.data_values)
        .map_err(|e| ReadError::parse(format!("'{description}' dataset: {e}")))
}

// ---------------------------------------------------------------------------
// Delimited text reader
// ---------------------------------------------------------------------------

/// Whitespace-separated `voltage current [ignored...]` lines. Lines not
/// starting with a digit or `-` are header/metadata and are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelimitedTextReader;

impl FormatReader for DelimitedTextReader {
    fn read(&self, bytes: &[u8]) -> Result<MeasurementSeries, ReadError> {
        let (text, _) = decode_text(bytes, DEFAULT_CHAIN)?;
        parse_delimited(&text)
    }
}

fn is_data_line(line: &str) -> bool {
    line.chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '-')
}

/// Parse every qualifying line; the first bad one fails the whole file.
pub fn parse_delimited(text: &str) -> Result<MeasurementSeries, ReadError> {
    let mut samples = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if !is_data_line(line) {
            continue;
        }
        let line_no = i + 1;
        let mut tokens = line.split_whitespace();
        let voltage = parse_token(tokens.next(), line_no, "voltage")?;
        let current = parse_token(tokens.next(), line_no, "current")?;
        samples.push(RawSample::sweep(voltage, current));
    }

    Ok(MeasurementSeries::new(samples))
}

fn parse_token(tok: Option<&str>, line: usize, what: &str) -> Result<f64, ReadError> {
    let tok = tok.ok_or_else(|| ReadError::parse_at(line, format!("missing {what} column")))?;
    tok.parse::<f64>()
        .map_err(|_| ReadError::parse_at(line, format!("{what} '{tok}' is not a number")))
}
