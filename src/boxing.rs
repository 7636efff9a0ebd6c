//! Conversions between Rust scalars and value tree nodes.
//!
//! Boxing and unboxing are independent of the container protocol: a scalar
//! converts the same way whether it is a mapping entry, a sequence element, or
//! a top-level value. Shape-dependent strategies (deferred binary data and
//! custom functions) are dispatched by the engine instead.

use std::fmt::Write;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use crate::error::{Error, Result};
use crate::path::Path;
use crate::policy::{DecimalStrategy, FormatPolicy, NonFiniteFloatStrategy};
use crate::value::Value;

const NANOS_PER_SECOND: i64 = 1_000_000_000;
const NANOS_PER_MILLI: i64 = 1_000_000;

pub(crate) static NULL: Value = Value::Null;

/// Returns the node a decoder should actually look at, applying the policy's
/// treatment of empty strings as null.
pub(crate) fn resolve<'a>(node: &'a Value, policy: &FormatPolicy) -> &'a Value {
	match node {
		Value::String(s) if s.is_empty() && policy.empty_string_is_null => &NULL,
		node => node,
	}
}

pub(crate) fn box_bool(b: bool, policy: &FormatPolicy) -> Value {
	match &policy.bool_tokens {
		Some(tokens) if b => Value::String(tokens.true_token.clone()),
		Some(tokens) => Value::String(tokens.false_token.clone()),
		None => Value::Bool(b),
	}
}

pub(crate) fn box_f64(f: f64, policy: &FormatPolicy, path: &Path) -> Result<Value> {
	if f.is_finite() {
		return Ok(Value::Float(f));
	}
	match &policy.non_finite_floats {
		NonFiniteFloatStrategy::Throw => Err(Error::invalid_value(
			path.clone(),
			format!("{f} is not representable; configure a non-finite float strategy"),
		)),
		NonFiniteFloatStrategy::ConvertToString {
			positive_infinity,
			negative_infinity,
			nan,
		} => Ok(Value::String(
			if f.is_nan() {
				nan
			} else if f.is_sign_positive() {
				positive_infinity
			} else {
				negative_infinity
			}
			.clone(),
		)),
	}
}

pub(crate) fn box_decimal(d: &BigDecimal, policy: &FormatPolicy) -> Value {
	if policy.decimal == DecimalStrategy::Number {
		if let Some(f) = d.to_f64().filter(|f| f.is_finite()) {
			if BigDecimal::from_str(&f.to_string()).is_ok_and(|back| &back == d) {
				return Value::Float(f);
			}
		}
	}
	Value::String(d.to_string())
}

pub(crate) fn box_base64(bytes: &[u8]) -> Value {
	Value::String(BASE64.encode(bytes))
}

pub(crate) fn unbox_bool(node: &Value, policy: &FormatPolicy, path: &Path) -> Result<bool> {
	match (resolve(node, policy), &policy.bool_tokens) {
		(Value::Bool(b), _) => Ok(*b),
		(Value::String(s), Some(tokens)) if *s == tokens.true_token => Ok(true),
		(Value::String(s), Some(tokens)) if *s == tokens.false_token => Ok(false),
		(node, _) => Err(Error::type_mismatch(path.clone(), "bool", node)),
	}
}

/// Decodes an integer type through the numeric cascade: an exact integer
/// node, then an integral float node, then (where the policy allows) a
/// string.
///
/// Booleans never satisfy the cascade, even though they could be represented
/// as 0 or 1.
pub(crate) fn unbox_integer<T>(node: &Value, policy: &FormatPolicy, path: &Path) -> Result<T>
where
	T: TryFrom<i128> + FromStr,
{
	let expected = std::any::type_name::<T>();
	let node = resolve(node, policy);
	let exact = match node {
		Value::Integer(n) => T::try_from(*n).ok(),
		Value::Float(f) => float_to_i128(*f).and_then(|n| T::try_from(n).ok()),
		Value::String(s) if policy.parse_numeric_strings => s.trim().parse::<T>().ok(),
		_ => None,
	};
	exact.ok_or_else(|| Error::type_mismatch(path.clone(), expected, node))
}

fn float_to_i128(f: f64) -> Option<i128> {
	// 2^127 is exactly representable, and every float below it in magnitude
	// casts without saturating.
	const LIMIT: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;
	(f.is_finite() && f.fract() == 0.0 && f.abs() < LIMIT).then_some(f as i128)
}

pub(crate) fn unbox_f64(node: &Value, policy: &FormatPolicy, path: &Path) -> Result<f64> {
	let node = resolve(node, policy);
	let exact = match node {
		Value::Float(f) => Some(*f),
		#[allow(clippy::cast_precision_loss)]
		Value::Integer(n) => {
			let f = *n as f64;
			(float_to_i128(f) == Some(*n)).then_some(f)
		}
		Value::String(s) => unbox_non_finite(s, policy).or_else(|| {
			policy
				.parse_numeric_strings
				.then(|| s.trim().parse::<f64>().ok())
				.flatten()
		}),
		_ => None,
	};
	exact.ok_or_else(|| Error::type_mismatch(path.clone(), "f64", node))
}

pub(crate) fn unbox_f32(node: &Value, policy: &FormatPolicy, path: &Path) -> Result<f32> {
	let f = unbox_f64(node, policy, path)?;
	if f.is_finite() && f.abs() > f64::from(f32::MAX) {
		return Err(Error::TypeMismatch {
			path: path.clone(),
			expected: "f32",
			found: format!("float {f} out of range"),
		});
	}
	#[allow(clippy::cast_possible_truncation)]
	let narrowed = f as f32;
	Ok(narrowed)
}

fn unbox_non_finite(s: &str, policy: &FormatPolicy) -> Option<f64> {
	match &policy.non_finite_floats {
		NonFiniteFloatStrategy::ConvertToString {
			positive_infinity,
			negative_infinity,
			nan,
		} => {
			if s == positive_infinity {
				Some(f64::INFINITY)
			} else if s == negative_infinity {
				Some(f64::NEG_INFINITY)
			} else if s == nan {
				Some(f64::NAN)
			} else {
				None
			}
		}
		NonFiniteFloatStrategy::Throw => None,
	}
}

pub(crate) fn unbox_str<'a>(node: &'a Value, policy: &FormatPolicy, path: &Path) -> Result<&'a str> {
	match resolve(node, policy) {
		Value::String(s) => Ok(s),
		node => Err(Error::type_mismatch(path.clone(), "string", node)),
	}
}

pub(crate) fn unbox_char(node: &Value, policy: &FormatPolicy, path: &Path) -> Result<char> {
	let s = unbox_str(node, policy, path)?;
	let mut chars = s.chars();
	match (chars.next(), chars.next()) {
		(Some(c), None) => Ok(c),
		_ => Err(Error::type_mismatch(path.clone(), "char", node)),
	}
}

pub(crate) fn unbox_decimal(node: &Value, policy: &FormatPolicy, path: &Path) -> Result<BigDecimal> {
	let text = match resolve(node, policy) {
		Value::Integer(n) => n.to_string(),
		Value::Float(f) if f.is_finite() => f.to_string(),
		Value::String(s) => s.clone(),
		node => return Err(Error::type_mismatch(path.clone(), "decimal", node)),
	};
	BigDecimal::from_str(text.trim())
		.map_err(|err| Error::data_corrupted_by(path.clone(), format!("invalid decimal {text:?}"), err))
}

pub(crate) fn unbox_base64(node: &Value, policy: &FormatPolicy, path: &Path) -> Result<Vec<u8>> {
	let s = unbox_str(node, policy, path)?;
	BASE64
		.decode(s)
		.map_err(|err| Error::data_corrupted_by(path.clone(), "invalid base64 data", err))
}

pub(crate) fn date_to_rfc3339(date: &DateTime<Utc>, precise: bool) -> Value {
	let format = if precise {
		SecondsFormat::AutoSi
	} else {
		SecondsFormat::Secs
	};
	Value::String(date.to_rfc3339_opts(format, true))
}

pub(crate) fn date_to_formatted(date: &DateTime<Utc>, format: &str, path: &Path) -> Result<Value> {
	let mut s = String::new();
	write!(s, "{}", date.format(format))
		.map_err(|_| Error::invalid_value(path.clone(), format!("invalid date format {format:?}")))?;
	Ok(Value::String(s))
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn date_to_seconds(date: &DateTime<Utc>) -> Value {
	let nanos = f64::from(date.timestamp_subsec_nanos());
	Value::Float(date.timestamp() as f64 + nanos / 1e9)
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn date_to_millis(date: &DateTime<Utc>) -> Value {
	let sub_milli_nanos = f64::from(date.timestamp_subsec_nanos() % 1_000_000);
	Value::Float(date.timestamp_millis() as f64 + sub_milli_nanos / 1e6)
}

pub(crate) fn unbox_rfc3339(node: &Value, policy: &FormatPolicy, path: &Path) -> Result<DateTime<Utc>> {
	let s = unbox_str(node, policy, path)?;
	DateTime::parse_from_rfc3339(s)
		.map(|date| date.with_timezone(&Utc))
		.map_err(|err| Error::data_corrupted_by(path.clone(), format!("invalid RFC 3339 date {s:?}"), err))
}

pub(crate) fn unbox_formatted(
	node: &Value,
	format: &str,
	policy: &FormatPolicy,
	path: &Path,
) -> Result<DateTime<Utc>> {
	let s = unbox_str(node, policy, path)?;
	let naive = NaiveDateTime::parse_from_str(s, format).or_else(|err| {
		// Date-only formats cannot produce a NaiveDateTime on their own.
		NaiveDate::parse_from_str(s, format)
			.ok()
			.and_then(|date| date.and_hms_opt(0, 0, 0))
			.ok_or(err)
	});
	naive
		.map(|naive| Utc.from_utc_datetime(&naive))
		.map_err(|err| Error::data_corrupted_by(path.clone(), format!("date {s:?} does not match {format:?}"), err))
}

pub(crate) fn unbox_seconds(node: &Value, policy: &FormatPolicy, path: &Path) -> Result<DateTime<Utc>> {
	let f = unbox_f64(node, policy, path)?;
	let whole = f.floor();
	let nanos = ((f - whole) * 1e9).round();
	timestamp(whole, 0, nanos, path)
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn unbox_millis(node: &Value, policy: &FormatPolicy, path: &Path) -> Result<DateTime<Utc>> {
	let f = unbox_f64(node, policy, path)?;
	let whole = f.floor();
	let sub_milli_nanos = ((f - whole) * 1e6).round();
	let millis = float_to_i128(whole)
		.and_then(|n| i64::try_from(n).ok())
		.ok_or_else(|| Error::data_corrupted(path.clone(), format!("timestamp {f} out of range")))?;
	timestamp(
		millis.div_euclid(1000) as f64,
		millis.rem_euclid(1000) * NANOS_PER_MILLI,
		sub_milli_nanos,
		path,
	)
}

/// Builds a date from whole seconds, plus integral and float nanosecond
/// adjustments that may carry into the next second.
fn timestamp(seconds: f64, nanos: i64, extra_nanos: f64, path: &Path) -> Result<DateTime<Utc>> {
	let out_of_range = || Error::data_corrupted(path.clone(), format!("timestamp {seconds} out of range"));
	let seconds = float_to_i128(seconds)
		.and_then(|n| i64::try_from(n).ok())
		.ok_or_else(out_of_range)?;
	#[allow(clippy::cast_possible_truncation)]
	let nanos = nanos + extra_nanos as i64;
	let seconds = seconds
		.checked_add(nanos.div_euclid(NANOS_PER_SECOND))
		.ok_or_else(out_of_range)?;
	let nanos = u32::try_from(nanos.rem_euclid(NANOS_PER_SECOND)).map_err(|_| out_of_range())?;
	DateTime::from_timestamp(seconds, nanos).ok_or_else(out_of_range)
}
