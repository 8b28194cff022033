// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message formatting.
//!
//! Templates use printf-style positional placeholders:
//! `%[argument_index$][flags][width][.precision]conversion`. Formatting is tolerant: a template
//! that cannot be filled from its arguments (too few arguments, a string handed to `%d`, an
//! unknown conversion) is not an error. The template is kept verbatim and every argument is
//! appended after it, so nothing the caller wanted to log is lost.
//!
//! ```rust
//! use scopedlog::{format_message, Arg};
//!
//! let filled = format_message(
//!     None,
//!     "Encountered %d errors while doing %s for %.2f seconds",
//!     &[0.into(), "nothing".into(), 3.237.into()],
//! );
//! assert_eq!(filled, "Encountered 0 errors while doing nothing for 3.24 seconds");
//!
//! let fallback = format_message(None, "expected a number: %d", &["seven".into()]);
//! assert_eq!(fallback, "expected a number: %d - args: seven;");
//! ```
//!
//! # Fallback text
//!
//! | situation                          | rendering                                        |
//! |------------------------------------|--------------------------------------------------|
//! | substitution failed, some args     | `<template> - args: a1;a2;`                      |
//! | substitution failed, no args       | `<template> - args: no_args_passed`              |
//! | empty template, some args          | `no_message_provided - args: a1;a2;`             |
//! | error attached                     | `<any of the above> :: <error message>`          |

use std::error::Error;
use std::fmt::Write;

use crate::arg::Arg;

/// Separates the verbatim template from the appended arguments.
pub const ARGS_SEPARATOR: &str = " - args: ";
/// Appended after [`ARGS_SEPARATOR`] when substitution failed and there were no arguments.
pub const NO_ARGS_SENTINEL: &str = "no_args_passed";
/// Stands in for an empty template when arguments were passed anyway.
pub const NO_MESSAGE_SENTINEL: &str = "no_message_provided";
/// Separates the message from an attached error's message.
pub const ERROR_SEPARATOR: &str = " :: ";

/**
Renders `template` with `args`, appending `error`'s message when present.

Never panics. Extra arguments beyond the placeholders the template consumes are ignored.
*/
pub fn format_message(error: Option<&dyn Error>, template: &str, args: &[Arg]) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    if !template.is_empty() {
        match substitute(template, args) {
            Ok(filled) => out.push_str(&filled),
            Err(_) => {
                out.push_str(template);
                append_args(&mut out, args);
            }
        }
    } else if !args.is_empty() {
        out.push_str(NO_MESSAGE_SENTINEL);
        append_args(&mut out, args);
    }
    if let Some(error) = error {
        out.push_str(ERROR_SEPARATOR);
        let _ = write!(out, "{error}");
    }
    out
}

/// The template and its arguments with no substitution attempted.
pub(crate) fn unformatted(template: &str, args: &[Arg]) -> String {
    let mut out = String::from(template);
    append_args(&mut out, args);
    out
}

fn append_args(out: &mut String, args: &[Arg]) {
    out.push_str(ARGS_SEPARATOR);
    if args.is_empty() {
        out.push_str(NO_ARGS_SENTINEL);
        return;
    }
    for arg in args {
        let _ = write!(out, "{arg};");
    }
}

/// Why a substitution attempt was abandoned. Never leaves this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    Malformed,
    UnknownConversion(char),
    MissingArgument,
    Mismatch(char),
    FlagMismatch(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ArgIndex {
    #[default]
    Ordinary,
    Explicit(usize),
    Previous,
}

#[derive(Debug, Default)]
struct Directive {
    index: ArgIndex,
    left: bool,
    alternate: bool,
    plus: bool,
    space: bool,
    zero: bool,
    group: bool,
    paren: bool,
    width: Option<usize>,
    precision: Option<usize>,
    conversion: char,
}

impl Directive {
    fn has_numeric_flags(&self) -> bool {
        self.plus || self.space || self.zero || self.group || self.paren
    }
}

fn substitute(template: &str, args: &[Arg]) -> Result<String, Failure> {
    let chars: Vec<char> = template.chars().collect();
    let mut out = String::with_capacity(template.len());
    let mut pos = 0;
    let mut ordinary = 0;
    let mut last: Option<usize> = None;
    while pos < chars.len() {
        let c = chars[pos];
        if c != '%' {
            out.push(c);
            pos += 1;
            continue;
        }
        let (directive, consumed) = parse_directive(&chars[pos + 1..])?;
        pos += 1 + consumed;
        match directive.conversion {
            '%' => {
                out.push_str(&pad(&directive, "%".to_string()));
                continue;
            }
            'n' => {
                out.push('\n');
                continue;
            }
            _ => {}
        }
        let index = match directive.index {
            ArgIndex::Ordinary => {
                ordinary += 1;
                ordinary - 1
            }
            ArgIndex::Explicit(n) => n - 1,
            ArgIndex::Previous => last.ok_or(Failure::MissingArgument)?,
        };
        let arg = args.get(index).ok_or(Failure::MissingArgument)?;
        last = Some(index);
        out.push_str(&render(&directive, arg)?);
    }
    Ok(out)
}

fn count_digits(chars: &[char], from: usize) -> usize {
    chars
        .iter()
        .skip(from)
        .take_while(|c| c.is_ascii_digit())
        .count()
}

fn parse_number(chars: &[char]) -> Result<usize, Failure> {
    chars
        .iter()
        .collect::<String>()
        .parse()
        .map_err(|_| Failure::Malformed)
}

/// Widths and precisions above this are treated as malformed.
const MAX_FIELD: usize = 1 << 16;

fn parse_field(chars: &[char]) -> Result<usize, Failure> {
    match parse_number(chars)? {
        n if n > MAX_FIELD => Err(Failure::Malformed),
        n => Ok(n),
    }
}

/// Parses one specifier from the text following a `%`; returns it with the number of chars used.
fn parse_directive(rest: &[char]) -> Result<(Directive, usize), Failure> {
    let mut directive = Directive::default();
    let mut i = 0;

    if rest.first() == Some(&'<') {
        directive.index = ArgIndex::Previous;
        i = 1;
    } else {
        let digits = count_digits(rest, 0);
        if digits > 0 && rest.get(digits) == Some(&'$') {
            let n = parse_number(&rest[..digits])?;
            if n == 0 {
                return Err(Failure::Malformed);
            }
            directive.index = ArgIndex::Explicit(n);
            i = digits + 1;
        }
    }

    while let Some(&c) = rest.get(i) {
        match c {
            '-' => directive.left = true,
            '#' => directive.alternate = true,
            '+' => directive.plus = true,
            ' ' => directive.space = true,
            '0' => directive.zero = true,
            ',' => directive.group = true,
            '(' => directive.paren = true,
            _ => break,
        }
        i += 1;
    }

    let digits = count_digits(rest, i);
    if digits > 0 {
        directive.width = Some(parse_field(&rest[i..i + digits])?);
        i += digits;
    }

    if rest.get(i) == Some(&'.') {
        i += 1;
        let digits = count_digits(rest, i);
        if digits == 0 {
            return Err(Failure::Malformed);
        }
        directive.precision = Some(parse_field(&rest[i..i + digits])?);
        i += digits;
    }

    directive.conversion = *rest.get(i).ok_or(Failure::Malformed)?;
    i += 1;

    if (directive.left || directive.zero) && directive.width.is_none() {
        return Err(Failure::Malformed);
    }
    if (directive.left && directive.zero) || (directive.plus && directive.space) {
        return Err(Failure::Malformed);
    }
    Ok((directive, i))
}

fn render(directive: &Directive, arg: &Arg) -> Result<String, Failure> {
    let conversion = directive.conversion;
    if !"sSbBcCdoxXeEfgG".contains(conversion) {
        return Err(Failure::UnknownConversion(conversion));
    }
    let lower = conversion.to_ascii_lowercase();

    let body = if matches!(arg, Arg::Null) && lower != 'b' {
        pad(directive, "null".to_string())
    } else {
        match lower {
            's' => {
                if directive.alternate || directive.has_numeric_flags() {
                    return Err(Failure::FlagMismatch(conversion));
                }
                pad(directive, truncate(arg.to_string(), directive.precision))
            }
            'b' => {
                if directive.alternate || directive.has_numeric_flags() {
                    return Err(Failure::FlagMismatch(conversion));
                }
                let text = match arg {
                    Arg::Null => "false".to_string(),
                    Arg::Bool(b) => b.to_string(),
                    _ => "true".to_string(),
                };
                pad(directive, truncate(text, directive.precision))
            }
            'c' => {
                if directive.precision.is_some()
                    || directive.alternate
                    || directive.has_numeric_flags()
                {
                    return Err(Failure::FlagMismatch(conversion));
                }
                let c = match arg {
                    Arg::Char(c) => Some(*c),
                    Arg::Int { value, .. } => u32::try_from(*value).ok().and_then(char::from_u32),
                    Arg::UInt(v) => u32::try_from(*v).ok().and_then(char::from_u32),
                    _ => return Err(Failure::Mismatch(conversion)),
                };
                pad(directive, c.ok_or(Failure::Mismatch(conversion))?.to_string())
            }
            'd' => {
                if directive.precision.is_some() || directive.alternate {
                    return Err(Failure::FlagMismatch(conversion));
                }
                let (negative, digits) = match arg {
                    Arg::Int { value, .. } => (*value < 0, value.unsigned_abs().to_string()),
                    Arg::UInt(v) => (false, v.to_string()),
                    _ => return Err(Failure::Mismatch(conversion)),
                };
                let digits = if directive.group {
                    group_thousands(&digits)
                } else {
                    digits
                };
                pad(directive, numeric(directive, negative, "", digits))
            }
            'x' | 'o' => {
                if directive.precision.is_some()
                    || directive.plus
                    || directive.space
                    || directive.group
                    || directive.paren
                {
                    return Err(Failure::FlagMismatch(conversion));
                }
                let bits = match arg {
                    Arg::Int { value, bits } => *value as u64 & width_mask(*bits),
                    Arg::UInt(v) => *v,
                    _ => return Err(Failure::Mismatch(conversion)),
                };
                let (digits, radix_prefix) = if lower == 'x' {
                    (format!("{bits:x}"), "0x")
                } else {
                    (format!("{bits:o}"), "0")
                };
                let radix_prefix = if directive.alternate { radix_prefix } else { "" };
                pad(directive, numeric(directive, false, radix_prefix, digits))
            }
            _ => {
                let value = arg.as_float().ok_or(Failure::Mismatch(conversion))?;
                pad(directive, float(directive, lower, value)?)
            }
        }
    };

    Ok(if conversion.is_ascii_uppercase() {
        body.to_uppercase()
    } else {
        body
    })
}

fn width_mask(bits: u32) -> u64 {
    if bits >= u64::BITS {
        u64::MAX
    } else {
        (1 << bits) - 1
    }
}

fn truncate(text: String, precision: Option<usize>) -> String {
    match precision {
        Some(p) if text.chars().count() > p => text.chars().take(p).collect(),
        _ => text,
    }
}

fn pad(directive: &Directive, body: String) -> String {
    let len = body.chars().count();
    match directive.width {
        Some(width) if width > len => {
            let fill = " ".repeat(width - len);
            if directive.left {
                body + &fill
            } else {
                fill + &body
            }
        }
        _ => body,
    }
}

/// Applies sign flags and zero padding; `radix_prefix` sits before the zeros (`0x00ff`).
fn numeric(directive: &Directive, negative: bool, radix_prefix: &str, digits: String) -> String {
    let (open, close) = if negative {
        if directive.paren { ("(", ")") } else { ("-", "") }
    } else if directive.plus {
        ("+", "")
    } else if directive.space {
        (" ", "")
    } else {
        ("", "")
    };
    let mut zeros = String::new();
    if directive.zero {
        if let Some(width) = directive.width {
            let used =
                open.len() + radix_prefix.len() + digits.chars().count() + close.len();
            if used < width {
                zeros = "0".repeat(width - used);
            }
        }
    }
    format!("{open}{radix_prefix}{zeros}{digits}{close}")
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn float(directive: &Directive, conversion: char, value: f64) -> Result<String, Failure> {
    if value.is_nan() || value.is_infinite() {
        let text = if value.is_nan() {
            "NaN"
        } else if value < 0.0 {
            if directive.paren { "(Infinity)" } else { "-Infinity" }
        } else if directive.plus {
            "+Infinity"
        } else {
            "Infinity"
        };
        return Ok(text.to_string());
    }
    let negative = value.is_sign_negative();
    let abs = value.abs();
    let magnitude = match conversion {
        'f' => grouped(directive, fixed(abs, directive.precision.unwrap_or(6))),
        'e' => {
            if directive.group {
                return Err(Failure::FlagMismatch(directive.conversion));
            }
            scientific(abs, directive.precision.unwrap_or(6))
        }
        _ => {
            let precision = match directive.precision {
                None => 6,
                Some(0) => 1,
                Some(p) => p,
            };
            match general_exponent(abs, precision) {
                Some(exponent) => {
                    let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
                    grouped(directive, fixed(abs, decimals))
                }
                None => {
                    if directive.group {
                        return Err(Failure::FlagMismatch(directive.conversion));
                    }
                    scientific(abs, precision - 1)
                }
            }
        }
    };
    Ok(numeric(directive, negative, "", magnitude))
}

fn grouped(directive: &Directive, fixed: String) -> String {
    if !directive.group {
        return fixed;
    }
    match fixed.split_once('.') {
        Some((int, frac)) => format!("{}.{frac}", group_thousands(int)),
        None => group_thousands(&fixed),
    }
}

/// Shortest round-trip decimal digits of a finite, non-negative float, with the decimal
/// exponent of the first digit: `2.675` gives `([2, 6, 7, 5], 0)`, `0.00123` gives
/// `([1, 2, 3], -3)`.
fn decompose(abs: f64) -> (Vec<u8>, i32) {
    let sci = format!("{abs:e}");
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let digits = mantissa
        .bytes()
        .filter(u8::is_ascii_digit)
        .map(|b| b - b'0')
        .collect();
    (digits, exponent.parse().unwrap_or(0))
}

/// Keeps `keep` digits, rounding half up on the decimal digits. The flag reports a carry out of
/// the leading digit, in which case the result has one extra leading `1`.
fn round_half_up(mut digits: Vec<u8>, keep: usize) -> (Vec<u8>, bool) {
    if digits.len() <= keep {
        digits.resize(keep, 0);
        return (digits, false);
    }
    let round_up = digits[keep] >= 5;
    digits.truncate(keep);
    if round_up {
        let mut i = keep;
        loop {
            if i == 0 {
                digits.insert(0, 1);
                return (digits, true);
            }
            i -= 1;
            if digits[i] == 9 {
                digits[i] = 0;
            } else {
                digits[i] += 1;
                break;
            }
        }
    }
    (digits, false)
}

fn push_digits(out: &mut String, digits: impl IntoIterator<Item = u8>) {
    out.extend(digits.into_iter().map(|d| char::from(b'0' + d)));
}

fn fixed(abs: f64, precision: usize) -> String {
    let (digits, exponent) = if abs == 0.0 {
        (Vec::new(), 0)
    } else {
        decompose(abs)
    };
    let mut int_len = exponent + 1;
    let keep = int_len + precision as i32;
    let rounded = if keep < 0 || abs == 0.0 {
        int_len = 0;
        Vec::new()
    } else {
        let (rounded, carried) = round_half_up(digits, keep as usize);
        if carried {
            int_len += 1;
        }
        rounded
    };

    let mut out = String::new();
    let fraction: Vec<u8> = if int_len <= 0 {
        out.push('0');
        std::iter::repeat_n(0, int_len.unsigned_abs() as usize)
            .chain(rounded)
            .collect()
    } else {
        let int_len = int_len as usize;
        push_digits(&mut out, rounded.iter().take(int_len).copied());
        rounded.into_iter().skip(int_len).collect()
    };
    if precision > 0 {
        out.push('.');
        push_digits(
            &mut out,
            fraction
                .into_iter()
                .chain(std::iter::repeat(0))
                .take(precision),
        );
    }
    out
}

fn scientific(abs: f64, precision: usize) -> String {
    let (digits, exponent) = if abs == 0.0 {
        (Vec::new(), 0)
    } else {
        decompose(abs)
    };
    let (rounded, carried) = round_half_up(digits, precision + 1);
    let exponent = if carried { exponent + 1 } else { exponent };
    let mut out = String::new();
    push_digits(&mut out, rounded.iter().take(1).copied());
    if precision > 0 {
        out.push('.');
        push_digits(&mut out, rounded.iter().skip(1).take(precision).copied());
    }
    let sign = if exponent < 0 { '-' } else { '+' };
    let _ = write!(out, "e{sign}{:02}", exponent.unsigned_abs());
    out
}

/// For `%g`: the exponent after rounding to `precision` significant digits when the value
/// should be shown in fixed notation, `None` when it needs scientific notation.
fn general_exponent(abs: f64, precision: usize) -> Option<i32> {
    if abs == 0.0 {
        return Some(0);
    }
    let (digits, exponent) = decompose(abs);
    let (_, carried) = round_half_up(digits, precision);
    let exponent = if carried { exponent + 1 } else { exponent };
    (exponent >= -4 && exponent < precision as i32).then_some(exponent)
}
