//! Delimited text format shared by every generator and the exporter.
//!
//! One record per line, fields joined by a comma. There is no quoting or
//! escaping: a field that contains the delimiter splits into two fields on
//! read. Absent values are written as the literal `NULL`.

/// Field delimiter.
pub const DELIMITER: char = ',';

/// Literal token for an absent value.
pub const NULL_TOKEN: &str = "NULL";

/// Encodes and decodes partition lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordCodec;

impl RecordCodec {
    /// Joins the fields into one line, trimming each field.
    pub fn encode<S: AsRef<str>>(fields: &[S]) -> String {
        let mut line = String::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                line.push(DELIMITER);
            }
            line.push_str(field.as_ref().trim());
        }
        line
    }

    /// Splits a line into its fields. `NULL` stays `NULL`.
    pub fn decode(line: &str) -> Vec<String> {
        line.split(DELIMITER)
            .map(|field| field.trim().to_string())
            .collect()
    }

    /// Decodes a line for insertion, mapping `NULL` to `None`.
    pub fn decode_nullable(line: &str) -> Vec<Option<String>> {
        Self::decode(line)
            .into_iter()
            .map(|field| if field == NULL_TOKEN { None } else { Some(field) })
            .collect()
    }

    /// Encodes an optional value, writing `NULL` when absent.
    pub fn nullable<T: ToString>(value: Option<T>) -> String {
        match value {
            Some(v) => v.to_string(),
            None => NULL_TOKEN.to_string(),
        }
    }
}
