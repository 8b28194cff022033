// SPDX-License-Identifier: MIT OR Apache-2.0

//! Positional arguments for message templates.
//!
//! A log call passes its arguments as a slice of [`Arg`]. Keeping the type of each value around
//! (rather than pre-rendering to strings) is what lets the formatter notice that a `%d` was
//! handed a string and fall back instead of printing garbage.
//!
//! ```rust
//! use scopedlog::Arg;
//!
//! let args: Vec<Arg> = vec![0.into(), "nothing".into(), 3.237.into()];
//! assert_eq!(args[1].to_string(), "nothing");
//! assert_eq!(Arg::from(3.0).to_string(), "3.0");
//! ```

use std::fmt::{Display, Formatter};

/// A single positional argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// A signed integer and the bit width of the type it came from; `%x` and `%o` render
    /// negative values in that width.
    Int { value: i64, bits: u32 },
    UInt(u64),
    Float(f64),
    /// Rendered from its shortest single-precision form, so `3.1f32` prints as `3.1`.
    Float32(f32),
    Bool(bool),
    Char(char),
    Str(String),
    /// An absent value (`None`); renders as `null`.
    Null,
}

impl Arg {
    /// The value as a double, for float conversions; `None` for non-floats.
    pub(crate) fn as_float(&self) -> Option<f64> {
        match self {
            Arg::Float(v) => Some(*v),
            Arg::Float32(v) => Some(widen(*v)),
            _ => None,
        }
    }
}

fn widen(value: f32) -> f64 {
    value.to_string().parse().unwrap_or(f64::from(value))
}

/// Integral floats keep a trailing `.0`; very large or very small magnitudes use `E` notation.
fn write_float(f: &mut Formatter<'_>, value: f64) -> std::fmt::Result {
    if value.is_nan() {
        return f.write_str("NaN");
    }
    if value.is_infinite() {
        return f.write_str(if value < 0.0 { "-Infinity" } else { "Infinity" });
    }
    let abs = value.abs();
    if abs == 0.0 || (1e-3..1e7).contains(&abs) {
        if value.fract() == 0.0 {
            write!(f, "{value:.1}")
        } else {
            write!(f, "{value}")
        }
    } else {
        let sci = format!("{value:e}");
        let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
        if mantissa.contains('.') {
            write!(f, "{mantissa}E{exponent}")
        } else {
            write!(f, "{mantissa}.0E{exponent}")
        }
    }
}

impl Display for Arg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Arg::Int { value, .. } => write!(f, "{value}"),
            Arg::UInt(v) => write!(f, "{v}"),
            Arg::Float(v) => write_float(f, *v),
            Arg::Float32(v) => write_float(f, widen(*v)),
            Arg::Bool(v) => write!(f, "{v}"),
            Arg::Char(v) => write!(f, "{v}"),
            Arg::Str(v) => f.write_str(v),
            Arg::Null => f.write_str("null"),
        }
    }
}

macro_rules! arg_from {
    ($variant:ident as $target:ty: $($source:ty),+) => {
        $(
            impl From<$source> for Arg {
                #[inline]
                fn from(value: $source) -> Self {
                    Arg::$variant(value as $target)
                }
            }
        )+
    };
}

macro_rules! arg_from_signed {
    ($($source:ty),+) => {
        $(
            impl From<$source> for Arg {
                #[inline]
                fn from(value: $source) -> Self {
                    Arg::Int {
                        value: value as i64,
                        bits: <$source>::BITS,
                    }
                }
            }
        )+
    };
}

arg_from_signed!(i8, i16, i32, i64, isize);
arg_from!(UInt as u64: u8, u16, u32, u64, usize);
arg_from!(Float as f64: f64);

impl From<f32> for Arg {
    fn from(value: f32) -> Self {
        Arg::Float32(value)
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Arg::Bool(value)
    }
}

impl From<char> for Arg {
    fn from(value: char) -> Self {
        Arg::Char(value)
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Str(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Str(value)
    }
}

impl From<&String> for Arg {
    fn from(value: &String) -> Self {
        Arg::Str(value.clone())
    }
}

impl<T: Into<Arg>> From<Option<T>> for Arg {
    fn from(value: Option<T>) -> Self {
        value.map_or(Arg::Null, Into::into)
    }
}
