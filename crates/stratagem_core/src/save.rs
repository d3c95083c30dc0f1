//! Text save protocol for unit orders.
//!
//! An order is saved as one tagged record: a brace-delimited,
//! comma-separated list whose first element is the order tag and whose
//! remaining elements are keys, each followed by its value unless the key
//! is a flag.
//!
//! ```text
//! {"action-repair", "finished", "goal", "U0003", "tile", {4, 5},
//!  "map-layer", 0, "repair-target", "U0003", "repaircycle", 2, "state", 2}
//! ```
//!
//! Values are quoted strings, integers, or `{x, y}` integer pairs.

use std::fmt::Write as _;

use crate::error::SaveError;
use crate::ids::UnitId;
use crate::math::TilePos;

/// One value of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveValue {
    /// A quoted string.
    Str(String),
    /// An integer.
    Int(i64),
    /// An `{x, y}` pair.
    Pair(i64, i64),
}

impl SaveValue {
    fn describe(&self) -> String {
        match self {
            Self::Str(s) => format!("\"{s}\""),
            Self::Int(n) => n.to_string(),
            Self::Pair(x, y) => format!("{{{x}, {y}}}"),
        }
    }
}

/// A parsed record: the order tag and the flat list of what follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Order tag (first element).
    pub tag: String,
    /// Keys and values, in file order.
    pub values: Vec<SaveValue>,
}

impl Record {
    /// Walk the keys and values of this record.
    #[must_use]
    pub fn fields(&self) -> FieldReader<'_> {
        FieldReader {
            order: &self.tag,
            values: self.values.iter(),
        }
    }
}

/// Parse one record.
///
/// # Errors
///
/// Returns [`SaveError::Syntax`] with the byte offset of the first problem.
pub fn parse_record(text: &str) -> Result<Record, SaveError> {
    let mut scanner = Scanner { text, pos: 0 };

    scanner.expect('{')?;
    let tag = match scanner.value()? {
        SaveValue::Str(tag) => tag,
        other => {
            return Err(scanner.error(format!("expected order tag, found {}", other.describe())));
        }
    };

    let mut values = Vec::new();
    loop {
        scanner.skip_whitespace();
        match scanner.peek() {
            Some('}') => {
                scanner.pos += 1;
                break;
            }
            Some(',') => {
                scanner.pos += 1;
                values.push(scanner.value()?);
            }
            Some(c) => return Err(scanner.error(format!("expected ',' or '}}', found '{c}'"))),
            None => return Err(scanner.error("unterminated record".to_string())),
        }
    }

    scanner.skip_whitespace();
    if scanner.pos < text.len() {
        return Err(scanner.error("trailing characters after record".to_string()));
    }

    Ok(Record { tag, values })
}

struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl Scanner<'_> {
    fn error(&self, message: String) -> SaveError {
        SaveError::Syntax {
            offset: self.pos,
            message,
        }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn expect(&mut self, wanted: char) -> Result<(), SaveError> {
        self.skip_whitespace();
        match self.peek() {
            Some(c) if c == wanted => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{wanted}', found '{c}'"))),
            None => Err(self.error(format!("expected '{wanted}', found end of input"))),
        }
    }

    fn value(&mut self) -> Result<SaveValue, SaveError> {
        self.skip_whitespace();
        match self.peek() {
            Some('"') => self.string().map(SaveValue::Str),
            Some('{') => {
                self.pos += 1;
                let x = self.integer()?;
                self.expect(',')?;
                let y = self.integer()?;
                self.expect('}')?;
                Ok(SaveValue::Pair(x, y))
            }
            Some(c) if c == '-' || c.is_ascii_digit() => self.integer().map(SaveValue::Int),
            Some(c) => Err(self.error(format!("unexpected '{c}'"))),
            None => Err(self.error("expected a value, found end of input".to_string())),
        }
    }

    fn string(&mut self) -> Result<String, SaveError> {
        self.expect('"')?;
        let start = self.pos;
        let Some(len) = self.text[start..].find('"') else {
            return Err(self.error("unterminated string".to_string()));
        };
        self.pos = start + len + 1;
        Ok(self.text[start..start + len].to_string())
    }

    fn integer(&mut self) -> Result<i64, SaveError> {
        self.skip_whitespace();
        let start = self.pos;
        let rest = &self.text[start..];
        let len = rest
            .char_indices()
            .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
            .map_or(rest.len(), |(i, _)| i);

        let digits = &rest[..len];
        let value = digits
            .parse::<i64>()
            .map_err(|_| self.error(format!("invalid integer '{digits}'")))?;
        self.pos = start + len;
        Ok(value)
    }
}

/// Cursor over the keys and values of a record.
///
/// Keys are read with [`next_key`](Self::next_key); the caller then reads
/// the value with the accessor matching the key's type, or reads nothing
/// for a flag.
#[derive(Debug, Clone)]
pub struct FieldReader<'a> {
    order: &'a str,
    values: std::slice::Iter<'a, SaveValue>,
}

impl<'a> FieldReader<'a> {
    /// Tag of the record being read, for error reporting.
    #[must_use]
    pub const fn order(&self) -> &'a str {
        self.order
    }

    /// The next key, or `None` at the end of the record.
    ///
    /// # Errors
    ///
    /// Fails if the element in key position is not a string.
    pub fn next_key(&mut self) -> Result<Option<&'a str>, SaveError> {
        match self.values.next() {
            None => Ok(None),
            Some(SaveValue::Str(key)) => Ok(Some(key.as_str())),
            Some(other) => Err(SaveError::MalformedValue {
                order: self.order.to_string(),
                key: "<key>".to_string(),
                expected: "a field name",
                found: other.describe(),
            }),
        }
    }

    fn next_value(&mut self, key: &str, expected: &'static str) -> Result<&'a SaveValue, SaveError> {
        self.values.next().ok_or_else(|| SaveError::MalformedValue {
            order: self.order.to_string(),
            key: key.to_string(),
            expected,
            found: "end of record".to_string(),
        })
    }

    fn malformed(&self, key: &str, expected: &'static str, found: &SaveValue) -> SaveError {
        SaveError::MalformedValue {
            order: self.order.to_string(),
            key: key.to_string(),
            expected,
            found: found.describe(),
        }
    }

    /// Read an integer value.
    ///
    /// # Errors
    ///
    /// Fails if the value is missing or not an integer.
    pub fn int(&mut self, key: &str) -> Result<i64, SaveError> {
        match self.next_value(key, "an integer")? {
            SaveValue::Int(n) => Ok(*n),
            other => Err(self.malformed(key, "an integer", other)),
        }
    }

    /// Read a non-negative integer that fits a `u32`.
    ///
    /// # Errors
    ///
    /// Fails if the value is missing, not an integer, or out of range.
    pub fn count(&mut self, key: &str) -> Result<u32, SaveError> {
        let value = self.int(key)?;
        u32::try_from(value).map_err(|_| self.invalid(key, value))
    }

    /// Read a map layer index.
    ///
    /// # Errors
    ///
    /// Fails if the value is missing, not an integer, or negative.
    pub fn layer(&mut self, key: &str) -> Result<usize, SaveError> {
        let value = self.int(key)?;
        usize::try_from(value).map_err(|_| self.invalid(key, value))
    }

    /// Read an `{x, y}` tile.
    ///
    /// # Errors
    ///
    /// Fails if the value is missing, not a pair, or does not fit `i32`.
    pub fn tile(&mut self, key: &str) -> Result<TilePos, SaveError> {
        match self.next_value(key, "a tile pair")? {
            SaveValue::Pair(x, y) => {
                let x = i32::try_from(*x).map_err(|_| self.invalid(key, *x))?;
                let y = i32::try_from(*y).map_err(|_| self.invalid(key, *y))?;
                Ok(TilePos::new(x, y))
            }
            other => Err(self.malformed(key, "a tile pair", other)),
        }
    }

    /// Read a unit reference string.
    ///
    /// # Errors
    ///
    /// Fails if the value is missing or not a valid reference.
    pub fn unit(&mut self, key: &str) -> Result<UnitId, SaveError> {
        match self.next_value(key, "a unit reference")? {
            SaveValue::Str(reference) => UnitId::from_reference(reference).ok_or_else(|| {
                self.malformed(key, "a unit reference", &SaveValue::Str(reference.clone()))
            }),
            other => Err(self.malformed(key, "a unit reference", other)),
        }
    }

    /// An out-of-range error for `key`.
    #[must_use]
    pub fn invalid(&self, key: &str, value: i64) -> SaveError {
        SaveError::InvalidValue {
            order: self.order.to_string(),
            key: key.to_string(),
            value,
        }
    }
}

/// Builds a record in the save syntax.
#[derive(Debug, Clone)]
pub struct SaveWriter {
    out: String,
}

impl SaveWriter {
    /// Start a record for `tag`.
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            out: format!("{{\"{tag}\""),
        }
    }

    /// Write a flag key without value.
    pub fn flag(&mut self, key: &str) {
        let _ = write!(self.out, ", \"{key}\"");
    }

    /// Write an integer field.
    pub fn int(&mut self, key: &str, value: i64) {
        let _ = write!(self.out, ", \"{key}\", {value}");
    }

    /// Write a tile field.
    pub fn tile(&mut self, key: &str, tile: TilePos) {
        let _ = write!(self.out, ", \"{key}\", {{{}, {}}}", tile.x, tile.y);
    }

    /// Write a unit reference field.
    pub fn unit(&mut self, key: &str, unit: UnitId) {
        let _ = write!(self.out, ", \"{key}\", \"{}\"", unit.reference());
    }

    /// Close the record.
    #[must_use]
    pub fn finish(mut self) -> String {
        self.out.push('}');
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPAIR: &str = r#"{"action-repair", "finished", "goal", "U0003", "tile", {4, 5}, "map-layer", 0, "repair-target", "U0003", "repaircycle", 2, "state", 2}"#;

    #[test]
    fn test_parse_record() {
        let record = parse_record(REPAIR).unwrap();

        assert_eq!(record.tag, "action-repair");
        assert_eq!(record.values.len(), 12);
        assert_eq!(record.values[0], SaveValue::Str("finished".to_string()));
        assert_eq!(record.values[4], SaveValue::Pair(4, 5));
        assert_eq!(record.values[11], SaveValue::Int(2));
    }

    #[test]
    fn test_writer_matches_syntax() {
        let mut writer = SaveWriter::new("action-repair");
        writer.flag("finished");
        writer.unit("goal", UnitId(3));
        writer.tile("tile", TilePos::new(4, 5));
        writer.int("map-layer", 0);
        writer.unit("repair-target", UnitId(3));
        writer.int("repaircycle", 2);
        writer.int("state", 2);

        assert_eq!(writer.finish(), REPAIR);
    }

    #[test]
    fn test_whitespace_and_negatives() {
        let record = parse_record("  {\n\"action-move\" ,\"tile\",{ -3 , 7 },\"range\", -1 }\n").unwrap();
        assert_eq!(record.tag, "action-move");
        assert_eq!(
            record.values,
            vec![
                SaveValue::Str("tile".to_string()),
                SaveValue::Pair(-3, 7),
                SaveValue::Str("range".to_string()),
                SaveValue::Int(-1),
            ]
        );
    }

    #[test]
    fn test_syntax_errors() {
        for text in [
            "",
            "{}",
            "{\"action-still\"",
            "{\"action-still\", }",
            "{\"action-still\", \"tile\", {1}}",
            "{\"action-still\"} extra",
            "{7, \"tile\"}",
            "{\"unterminated}",
        ] {
            assert!(
                matches!(parse_record(text), Err(SaveError::Syntax { .. })),
                "accepted {text:?}"
            );
        }
    }

    #[test]
    fn test_field_reader() {
        let record = parse_record(REPAIR).unwrap();
        let mut fields = record.fields();

        assert_eq!(fields.next_key().unwrap(), Some("finished"));
        assert_eq!(fields.next_key().unwrap(), Some("goal"));
        assert_eq!(fields.unit("goal").unwrap(), UnitId(3));
        assert_eq!(fields.next_key().unwrap(), Some("tile"));
        assert_eq!(fields.tile("tile").unwrap(), TilePos::new(4, 5));
        assert_eq!(fields.next_key().unwrap(), Some("map-layer"));
        assert_eq!(fields.layer("map-layer").unwrap(), 0);
    }

    #[test]
    fn test_field_reader_type_errors() {
        let record = parse_record(r#"{"action-move", "tile", 4, "range", -2, "goal", "X1"}"#).unwrap();
        let mut fields = record.fields();

        fields.next_key().unwrap();
        assert!(matches!(
            fields.tile("tile"),
            Err(SaveError::MalformedValue { expected: "a tile pair", .. })
        ));
        fields.next_key().unwrap();
        assert_eq!(
            fields.count("range"),
            Err(SaveError::InvalidValue {
                order: "action-move".to_string(),
                key: "range".to_string(),
                value: -2
            })
        );
        fields.next_key().unwrap();
        assert!(fields.unit("goal").is_err());
        assert_eq!(fields.next_key().unwrap(), None);
    }

    #[test]
    fn test_missing_value() {
        let record = parse_record(r#"{"action-move", "range"}"#).unwrap();
        let mut fields = record.fields();
        fields.next_key().unwrap();

        assert!(matches!(
            fields.int("range"),
            Err(SaveError::MalformedValue { found, .. }) if found == "end of record"
        ));
    }
}
