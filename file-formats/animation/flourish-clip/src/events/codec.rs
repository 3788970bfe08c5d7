//! Ordered `;`-separated field codec for event save data
//!
//! Every event kind describes its fields once, through
//! [`FieldCursor::look`]. The same routine reads and writes, so the field
//! order on disk is the same in both directions.

use crate::types::Color;
use glam::{Vec2, Vec3};

/// Separator between fields
pub const FIELD_SEPARATOR: char = ';';

/// Separator between the components of vectors and colors
pub const COMPONENT_SEPARATOR: char = ',';

/// A value that can live in one save-data field
pub trait FieldValue: Sized {
    /// Append the text form of the value
    fn encode(&self, out: &mut String) -> Result<(), String>;

    /// Parse the text form of a field
    fn decode(text: &str) -> Result<Self, String>;
}

impl FieldValue for String {
    fn encode(&self, out: &mut String) -> Result<(), String> {
        if self.contains(FIELD_SEPARATOR) {
            return Err(format!("text '{self}' contains the field separator"));
        }
        out.push_str(self);
        Ok(())
    }

    fn decode(text: &str) -> Result<Self, String> {
        Ok(text.to_string())
    }
}

impl FieldValue for f32 {
    fn encode(&self, out: &mut String) -> Result<(), String> {
        out.push_str(&self.to_string());
        Ok(())
    }

    fn decode(text: &str) -> Result<Self, String> {
        parse_float(text)
    }
}

impl FieldValue for i32 {
    fn encode(&self, out: &mut String) -> Result<(), String> {
        out.push_str(&self.to_string());
        Ok(())
    }

    fn decode(text: &str) -> Result<Self, String> {
        text.trim()
            .parse()
            .map_err(|e| format!("invalid integer '{text}': {e}"))
    }
}

impl FieldValue for bool {
    fn encode(&self, out: &mut String) -> Result<(), String> {
        out.push_str(if *self { "True" } else { "False" });
        Ok(())
    }

    fn decode(text: &str) -> Result<Self, String> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if text.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(format!("invalid boolean '{text}'"))
        }
    }
}

impl FieldValue for Vec2 {
    fn encode(&self, out: &mut String) -> Result<(), String> {
        encode_components(&self.to_array(), out);
        Ok(())
    }

    fn decode(text: &str) -> Result<Self, String> {
        let [x, y] = parse_components::<2>(text)?;
        Ok(Vec2::new(x, y))
    }
}

impl FieldValue for Vec3 {
    fn encode(&self, out: &mut String) -> Result<(), String> {
        encode_components(&self.to_array(), out);
        Ok(())
    }

    fn decode(text: &str) -> Result<Self, String> {
        let [x, y, z] = parse_components::<3>(text)?;
        Ok(Vec3::new(x, y, z))
    }
}

impl FieldValue for Color {
    fn encode(&self, out: &mut String) -> Result<(), String> {
        encode_components(&[self.r, self.g, self.b, self.a], out);
        Ok(())
    }

    fn decode(text: &str) -> Result<Self, String> {
        let [r, g, b, a] = parse_components::<4>(text)?;
        Ok(Color::new(r, g, b, a))
    }
}

fn encode_components(components: &[f32], out: &mut String) {
    for (i, c) in components.iter().enumerate() {
        if i > 0 {
            out.push(COMPONENT_SEPARATOR);
        }
        out.push_str(&c.to_string());
    }
}

fn parse_float(text: &str) -> Result<f32, String> {
    let cleaned = text.trim().trim_start_matches('(').trim_end_matches(')').trim();
    cleaned
        .parse()
        .map_err(|e| format!("invalid number '{text}': {e}"))
}

fn parse_components<const N: usize>(text: &str) -> Result<[f32; N], String> {
    let mut out = [0.0; N];
    let mut parts = text.split(COMPONENT_SEPARATOR);
    for slot in &mut out {
        let part = parts
            .next()
            .ok_or_else(|| format!("expected {N} components in '{text}'"))?;
        *slot = parse_float(part)?;
    }
    if parts.next().is_some() {
        return Err(format!("expected {N} components in '{text}'"));
    }
    Ok(out)
}

enum Mode<'a> {
    Read(std::slice::Iter<'a, &'a str>),
    Write(String),
}

/// Walks the fields of one event in declaration order.
///
/// Errors are latched: the first failing field is remembered and later
/// fields are left alone.
pub struct FieldCursor<'a> {
    mode: Mode<'a>,
    error: Option<String>,
}

impl<'a> FieldCursor<'a> {
    /// Cursor reading from already split fields
    pub fn reader(fields: &'a [&'a str]) -> Self {
        Self {
            mode: Mode::Read(fields.iter()),
            error: None,
        }
    }

    /// Cursor appending to save data that already holds the leading fields
    pub fn writer(prefix: String) -> Self {
        Self {
            mode: Mode::Write(prefix),
            error: None,
        }
    }

    pub fn is_reading(&self) -> bool {
        matches!(self.mode, Mode::Read(_))
    }

    /// Read into or write from `value`.
    ///
    /// When reading, a missing trailing field leaves `value` untouched so
    /// it keeps the kind's default.
    pub fn look<T: FieldValue>(&mut self, name: &str, value: &mut T) {
        if self.error.is_some() {
            return;
        }

        match &mut self.mode {
            Mode::Read(fields) => {
                if let Some(text) = fields.next() {
                    match T::decode(text) {
                        Ok(v) => *value = v,
                        Err(e) => self.error = Some(format!("field {name}: {e}")),
                    }
                }
            }
            Mode::Write(out) => {
                out.push(FIELD_SEPARATOR);
                if let Err(e) = value.encode(out) {
                    self.error = Some(format!("field {name}: {e}"));
                }
            }
        }
    }

    /// The written save data, or the first field error
    pub fn finish(self) -> Result<String, String> {
        if let Some(e) = self.error {
            return Err(e);
        }
        match self.mode {
            Mode::Write(out) => Ok(out),
            Mode::Read(_) => Ok(String::new()),
        }
    }
}
