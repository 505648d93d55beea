use serde::{Deserialize, Serialize};
use std::fmt;

/// One decoded spreadsheet cell.
///
/// Dates arrive as `Float` serials; the attendance layer interprets them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl CellValue {
    /// Null, or text made only of whitespace
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::String(s) => s.trim().is_empty(),
            CellValue::Bool(_) | CellValue::Int(_) | CellValue::Float(_) => false,
        }
    }

    /// Untrimmed display text; empty for `Null`.
    #[must_use]
    pub fn as_str(&self) -> String {
        self.to_string()
    }

    /// Trimmed text suitable for identifiers and names.
    ///
    /// Id columns typed as numbers come back as floats (`1042.0`); integral
    /// floats render without the fraction.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => (*f as i64).to_string(),
            CellValue::String(s) => s.trim().to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Float(x) => write!(f, "{x}"),
            CellValue::String(s) => f.write_str(s),
        }
    }
}

macro_rules! cell_from {
    ($($ty:ty => $variant:ident($conv:expr)),* $(,)?) => {
        $(
            impl From<$ty> for CellValue {
                fn from(value: $ty) -> Self {
                    CellValue::$variant($conv(value))
                }
            }
        )*
    };
}

cell_from! {
    bool => Bool(std::convert::identity),
    i64 => Int(std::convert::identity),
    i32 => Int(i64::from),
    u32 => Int(i64::from),
    f64 => Float(std::convert::identity),
    String => String(std::convert::identity),
    &str => String(str::to_string),
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Null, Into::into)
    }
}
