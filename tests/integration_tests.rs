//! treecodec's integration test suite.
//!
//! Most of these tests are based on the philosophy that a typed value should
//! survive a trip through any supported format unchanged, no matter how deeply
//! it is nested or whether part of it was written through a super encoder. The
//! suite encodes the same values into every format (and every array encoding
//! for URL queries) and checks that decoding gives them back.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use proptest::prelude::*;
use rstest::rstest;
use similar_asserts::assert_eq;

use treecodec::json::{JsonDecoder, JsonEncoder};
use treecodec::policy::{ArrayEncoding, NonFiniteFloatStrategy};
use treecodec::url::{UrlDecoder, UrlEncoder};
use treecodec::{Binary, Decode, Decoder, Encode, Encoder, Error, Path, PathComponent, Result, Value};

#[derive(Clone, Copy, Debug)]
enum Format {
	Json,
	Url,
	UrlIndexed,
}

impl Format {
	const ALL: [Format; 3] = [Format::Json, Format::Url, Format::UrlIndexed];

	fn encode<T: Encode>(self, value: &T) -> Result<Vec<u8>> {
		self.encode_with(value, NonFiniteFloatStrategy::Throw)
	}

	fn decode<T: Decode>(self, bytes: &[u8]) -> Result<T> {
		self.decode_with(bytes, NonFiniteFloatStrategy::Throw)
	}

	fn encode_with<T: Encode>(self, value: &T, floats: NonFiniteFloatStrategy) -> Result<Vec<u8>> {
		match self {
			Format::Json => JsonEncoder::new().non_finite_float_strategy(floats).encode(value),
			Format::Url => UrlEncoder::new().non_finite_float_strategy(floats).encode(value),
			Format::UrlIndexed => UrlEncoder::new()
				.non_finite_float_strategy(floats)
				.array_encoding(ArrayEncoding::Indexed)
				.encode(value),
		}
	}

	fn decode_with<T: Decode>(self, bytes: &[u8], floats: NonFiniteFloatStrategy) -> Result<T> {
		match self {
			Format::Json => JsonDecoder::new().non_finite_float_strategy(floats).decode(bytes),
			Format::Url => UrlDecoder::new().non_finite_float_strategy(floats).decode(bytes),
			Format::UrlIndexed => UrlDecoder::new()
				.non_finite_float_strategy(floats)
				.array_encoding(ArrayEncoding::Indexed)
				.decode(bytes),
		}
	}
}

fn assert_round_trip<T>(format: Format, value: T)
where
	T: Encode + Decode + PartialEq + fmt::Debug,
{
	let bytes = format.encode(&value).unwrap();

	// Decoding failures are easier to diagnose with the wire text at hand.
	let decoded: T = format
		.decode(&bytes)
		.unwrap_or_else(|err| panic!("{err} while decoding {:?}", String::from_utf8_lossy(&bytes)));
	assert_eq!(value, decoded);
}

#[derive(Clone, Debug, PartialEq)]
struct Geo {
	lat: f64,
	lon: f64,
}

impl Encode for Geo {
	fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
		let mut container = encoder.container();
		container.encode("lat", &self.lat)?;
		container.encode("lon", &self.lon)
	}
}

impl Decode for Geo {
	fn decode(decoder: &Decoder<'_>) -> Result<Self> {
		let container = decoder.container()?;
		Ok(Geo {
			lat: container.decode("lat")?,
			lon: container.decode("lon")?,
		})
	}
}

#[derive(Clone, Debug, PartialEq)]
struct Address {
	city: String,
	zip: Option<String>,
	geo: Geo,
}

impl Encode for Address {
	fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
		let mut container = encoder.container();
		container.encode("city", &self.city)?;
		container.encode_if_some("zip", &self.zip)?;
		container.encode("geo", &self.geo)
	}
}

impl Decode for Address {
	fn decode(decoder: &Decoder<'_>) -> Result<Self> {
		let container = decoder.container()?;
		Ok(Address {
			city: container.decode("city")?,
			zip: container.decode_if_present("zip")?,
			geo: container.decode("geo")?,
		})
	}
}

#[derive(Clone, Debug, PartialEq)]
struct User {
	name: String,
	age: u32,
	active: bool,
	score: f64,
	tags: Vec<String>,
	lucky: Vec<i64>,
	joined: DateTime<Utc>,
	avatar: Binary,
	address: Address,
}

impl Encode for User {
	fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
		let mut container = encoder.container();
		container.encode("name", &self.name)?;
		container.encode("age", &self.age)?;
		container.encode("active", &self.active)?;
		container.encode("score", &self.score)?;
		container.encode("tags", &self.tags)?;
		container.encode("lucky", &self.lucky)?;
		container.encode("joined", &self.joined)?;
		container.encode("avatar", &self.avatar)?;
		container.encode("address", &self.address)
	}
}

impl Decode for User {
	fn decode(decoder: &Decoder<'_>) -> Result<Self> {
		let container = decoder.container()?;
		Ok(User {
			name: container.decode("name")?,
			age: container.decode("age")?,
			active: container.decode("active")?,
			score: container.decode("score")?,
			// Queries cannot tell an empty sequence from a missing one.
			tags: container.decode_if_present("tags")?.unwrap_or_default(),
			lucky: container.decode_if_present("lucky")?.unwrap_or_default(),
			joined: container.decode("joined")?,
			avatar: container.decode("avatar")?,
			address: container.decode("address")?,
		})
	}
}

/// A value that extends [`User`] by handing its base to a super encoder.
#[derive(Clone, Debug, PartialEq)]
struct Employee {
	employee_id: u64,
	user: User,
}

impl Encode for Employee {
	fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
		let mut container = encoder.container();
		container.encode("employee_id", &self.employee_id)?;
		let mut base = container.super_encoder();
		self.user.encode(&mut base)?;
		base.finish();
		Ok(())
	}
}

impl Decode for Employee {
	fn decode(decoder: &Decoder<'_>) -> Result<Self> {
		let container = decoder.container()?;
		Ok(Employee {
			employee_id: container.decode("employee_id")?,
			user: User::decode(&container.super_decoder())?,
		})
	}
}

/// A base value that encodes as a single scalar.
#[derive(Clone, Debug, PartialEq)]
struct Reading(i64);

impl Encode for Reading {
	fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
		encoder.encode_i64(self.0)
	}
}

impl Decode for Reading {
	fn decode(decoder: &Decoder<'_>) -> Result<Self> {
		decoder.decode_i64().map(Reading)
	}
}

#[derive(Clone, Debug, PartialEq)]
struct Measurement {
	unit: String,
	reading: Reading,
}

impl Encode for Measurement {
	fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
		let mut container = encoder.container();
		container.encode("unit", &self.unit)?;
		let mut base = container.super_encoder();
		self.reading.encode(&mut base)?;
		base.finish();
		Ok(())
	}
}

impl Decode for Measurement {
	fn decode(decoder: &Decoder<'_>) -> Result<Self> {
		let container = decoder.container()?;
		Ok(Measurement {
			unit: container.decode("unit")?,
			reading: Reading::decode(&container.super_decoder())?,
		})
	}
}

/// A sequence whose second element is written by its base's super encoder.
#[derive(Clone, Debug, PartialEq)]
struct Tagged {
	label: String,
	reading: Reading,
}

impl Encode for Tagged {
	fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
		let mut seq = encoder.unkeyed_container();
		seq.encode(&self.label)?;
		let mut base = seq.super_encoder();
		self.reading.encode(&mut base)?;
		base.finish();
		Ok(())
	}
}

impl Decode for Tagged {
	fn decode(decoder: &Decoder<'_>) -> Result<Self> {
		let mut seq = decoder.unkeyed_container()?;
		let label = seq.decode()?;
		let reading = Reading::decode(&seq.super_decoder()?)?;
		Ok(Tagged { label, reading })
	}
}

/// A mapping that stores its base under a key of its own choosing.
#[derive(Clone, Debug, PartialEq)]
struct Station {
	name: String,
	calibration: Measurement,
}

impl Encode for Station {
	fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
		let mut container = encoder.container();
		container.encode("name", &self.name)?;
		let mut base = container.super_encoder_for_key("calibration");
		self.calibration.encode(&mut base)?;
		base.finish();
		Ok(())
	}
}

impl Decode for Station {
	fn decode(decoder: &Decoder<'_>) -> Result<Self> {
		let container = decoder.container()?;
		Ok(Station {
			name: container.decode("name")?,
			calibration: Measurement::decode(&container.super_decoder_for_key("calibration"))?,
		})
	}
}

fn sample_user() -> User {
	User {
		name: "Clark".to_owned(),
		age: 35,
		active: true,
		score: 98.25,
		tags: vec!["reporter".to_owned(), "farm boy".to_owned()],
		lucky: vec![7, -3],
		joined: DateTime::from_timestamp(1_614_834_367, 250_000_000).unwrap(),
		avatar: Binary(vec![0, 159, 146, 150, 255]),
		address: Address {
			city: "Metropolis".to_owned(),
			zip: Some("12345".to_owned()),
			geo: Geo { lat: 40.5, lon: -74.125 },
		},
	}
}

fn sample_employee() -> Employee {
	Employee {
		employee_id: 7,
		user: sample_user(),
	}
}

#[rstest]
fn round_trip_user(#[values(Format::Json, Format::Url, Format::UrlIndexed)] format: Format) {
	assert_round_trip(format, sample_user());
}

#[rstest]
fn round_trip_user_without_optionals(#[values(Format::Json, Format::Url, Format::UrlIndexed)] format: Format) {
	let mut user = sample_user();
	user.tags.clear();
	user.lucky.clear();
	user.address.zip = None;
	assert_round_trip(format, user);
}

#[rstest]
fn round_trip_super_encoded(#[values(Format::Json, Format::Url, Format::UrlIndexed)] format: Format) {
	assert_round_trip(format, sample_employee());
	assert_round_trip(
		format,
		Measurement {
			unit: "C".to_owned(),
			reading: Reading(-12),
		}
	);
}

#[rstest]
fn round_trip_unkeyed_super(#[values(Format::Json, Format::Url, Format::UrlIndexed)] format: Format) {
	let tagged = Tagged {
		label: "t".to_owned(),
		reading: Reading(9),
	};
	let wrapped: BTreeMap<String, Tagged> = [("x".to_owned(), tagged)].into_iter().collect();
	assert_round_trip(format, wrapped);
	assert_round_trip(
		format,
		Station {
			name: "north".to_owned(),
			calibration: Measurement {
				unit: "K".to_owned(),
				reading: Reading(273),
			},
		},
	);
}

/// Tests sequences of super-encoded composites, which nest employee, user,
/// address and geo inside each element.
#[rstest]
fn round_trip_sequence_of_super_encoded(#[values(Format::Json, Format::UrlIndexed)] format: Format) {
	let mut second = sample_employee();
	second.employee_id = 8;
	second.user.address.zip = None;
	let team: BTreeMap<String, Vec<Employee>> =
		[("team".to_owned(), vec![sample_employee(), second])].into_iter().collect();
	assert_round_trip(format, team);
}

#[test]
fn unkeyed_super_wire_form() {
	let tagged = Tagged {
		label: "t".to_owned(),
		reading: Reading(9),
	};
	assert_eq!(JsonEncoder::new().encode_to_string(&tagged).unwrap().as_str(), r#"["t",9]"#);

	let wrapped: BTreeMap<&str, &Tagged> = [("x", &tagged)].into_iter().collect();
	assert_eq!(
		UrlEncoder::new().encode_query_string(&wrapped).unwrap().as_str(),
		"x[]=t&x[]=9"
	);
	let decoded: BTreeMap<String, Tagged> = UrlDecoder::new().decode_query_string("x[]=t&x[]=9").unwrap();
	assert_eq!(decoded.get("x"), Some(&tagged));

	let station = Station {
		name: "north".to_owned(),
		calibration: Measurement {
			unit: "K".to_owned(),
			reading: Reading(273),
		},
	};
	assert_eq!(
		JsonEncoder::new().encode_to_string(&station).unwrap().as_str(),
		r#"{"name":"north","calibration":{"unit":"K","super":273}}"#
	);
}

/// Tests that a super encoder's output lands in the slot it reserved, so that
/// the base value appears exactly where a plain nested value would.
#[test]
fn super_encoder_layout() {
	let measurement = Measurement {
		unit: "C".to_owned(),
		reading: Reading(21),
	};
	let text = JsonEncoder::new().encode_to_string(&measurement).unwrap();
	assert_eq!(text.as_str(), r#"{"unit":"C","super":21}"#);

	let tree = JsonEncoder::new().encode_value(&sample_employee()).unwrap();
	let keys: Vec<&str> = tree.as_mapping().unwrap().keys().map(String::as_str).collect();
	assert_eq!(keys, vec!["employee_id", "super"]);
	assert_eq!(
		tree.get("super").and_then(|user| user.get("address")).and_then(|a| a.get("city")),
		Some(&Value::from("Metropolis"))
	);
}

#[test]
fn url_wire_form() {
	let address = sample_user().address;
	let encoder = UrlEncoder::new();
	assert_eq!(
		encoder.encode_query_string(&address).unwrap().as_str(),
		"city=Metropolis&zip=12345&geo[lat]=40.5&geo[lon]=-74.125"
	);
	let query = encoder.encode_query_string(&sample_user()).unwrap();
	assert!(query.contains("tags[]=reporter&tags[]=farm%20boy"), "{query}");
	assert!(query.contains("avatar=AJ%2BSlv8%3D"), "{query}");
}

/// Replaces the node at `path` in a tree of mappings and sequences.
fn replace(tree: &mut Value, path: &[&str], new: Value) {
	let mut node = tree;
	for component in path {
		node = match node {
			Value::Mapping(entries) => entries.get_mut(*component).unwrap(),
			Value::Sequence(elements) => &mut elements[component.parse::<usize>().unwrap()],
			node => panic!("cannot descend into {node:?}"),
		};
	}
	*node = new;
}

/// Tests that a decoding failure at depth n reports a path of n+1 components
/// that ends at the failing key or index.
#[rstest]
#[case(&["super", "address", "geo", "lat"], Value::from("north"), "super.address.geo.lat")]
#[case(&["super", "tags", "1"], Value::Integer(5), "super.tags[1]")]
#[case(&["super", "address", "city"], Value::Null, "super.address.city")]
#[case(&["employee_id"], Value::Float(7.5), "employee_id")]
fn decode_error_paths(#[case] at: &[&str], #[case] bad: Value, #[case] expected: &str) {
	let mut tree = JsonEncoder::new().encode_value(&sample_employee()).unwrap();
	replace(&mut tree, at, bad);
	let err = JsonDecoder::new().decode_value::<Employee>(&tree).unwrap_err();
	assert_eq!(err.path().to_string().as_str(), expected);
	assert_eq!(err.path().len(), at.len());
	assert!(
		matches!(err, Error::TypeMismatch { .. } | Error::ValueNotFound { .. }),
		"{err:?}"
	);
}

#[test]
fn missing_key_path() {
	let mut tree = JsonEncoder::new().encode_value(&sample_employee()).unwrap();
	let mut address = tree.get("super").and_then(|user| user.get("address")).cloned().unwrap();
	if let Value::Mapping(entries) = &mut address {
		entries.shift_remove("city");
	}
	replace(&mut tree, &["super", "address"], address);

	let err = JsonDecoder::new().decode_value::<Employee>(&tree).unwrap_err();
	assert!(matches!(&err, Error::KeyNotFound { key, .. } if key == "city"));
	assert_eq!(
		err.path(),
		&Path::root().join(PathComponent::Super).key("address").key("city")
	);
}

#[test]
fn encode_error_path() {
	let mut user = sample_user();
	user.address.geo.lon = f64::NEG_INFINITY;
	let err = Format::Json.encode(&sample_employee_with(user)).unwrap_err();
	assert!(matches!(err, Error::InvalidValue { .. }));
	assert_eq!(err.path().to_string().as_str(), "super.address.geo.lon");
}

fn sample_employee_with(user: User) -> Employee {
	Employee { employee_id: 1, user }
}

/// Tests that non-finite floats survive a round trip when both sides agree on
/// the strings that stand for them.
#[rstest]
fn non_finite_float_round_trip(
	#[values(Format::Json, Format::Url, Format::UrlIndexed)] format: Format,
	#[values(f64::INFINITY, f64::NEG_INFINITY, f64::NAN)] special: f64,
) {
	let floats = NonFiniteFloatStrategy::ConvertToString {
		positive_infinity: "+Infinity".to_owned(),
		negative_infinity: "-Infinity".to_owned(),
		nan: "NaN".to_owned(),
	};
	let mut user = sample_user();
	user.score = special;

	assert!(format.encode(&user).is_err());
	let bytes = format.encode_with(&user, floats.clone()).unwrap();
	let decoded: User = format.decode_with(&bytes, floats).unwrap();
	if special.is_nan() {
		assert!(decoded.score.is_nan());
	} else {
		assert!(decoded.score.is_infinite());
		assert_eq!(decoded.score.is_sign_positive(), special.is_sign_positive());
	}
}

fn dyadic() -> impl Strategy<Value = f64> {
	// Eighths print and parse exactly in every format.
	(-8_000_000_i32..8_000_000).prop_map(|n| f64::from(n) / 8.0)
}

fn address_strategy() -> impl Strategy<Value = Address> {
	("[A-Za-z][A-Za-z .'-]{0,15}", proptest::option::of("[0-9]{5}"), dyadic(), dyadic()).prop_map(
		|(city, zip, lat, lon)| Address {
			city,
			zip,
			geo: Geo { lat, lon },
		},
	)
}

fn user_strategy() -> impl Strategy<Value = User> {
	(
		"[A-Za-z0-9 ._~-]{1,12}",
		any::<u32>(),
		any::<bool>(),
		dyadic(),
		proptest::collection::vec("[a-z]{1,6}", 0..4),
		proptest::collection::vec(any::<i64>(), 0..4),
		(0_i64..4_000_000_000, 0_u32..1_000_000_000),
		proptest::collection::vec(any::<u8>(), 1..16),
		address_strategy(),
	)
		.prop_map(
			|(name, age, active, score, tags, lucky, (secs, nanos), avatar, address)| User {
				name,
				age,
				active,
				score,
				tags,
				lucky,
				joined: DateTime::from_timestamp(secs, nanos).unwrap(),
				avatar: Binary(avatar),
				address,
			},
		)
}

proptest! {
	#[test]
	fn users_round_trip(user in user_strategy()) {
		for format in Format::ALL {
			let bytes = format.encode(&user).unwrap();
			let decoded: User = format.decode(&bytes).unwrap();
			prop_assert_eq!(&decoded, &user);
		}
	}

	#[test]
	fn employees_round_trip(user in user_strategy(), employee_id in any::<u64>()) {
		let employee = Employee { employee_id, user };
		for format in Format::ALL {
			let bytes = format.encode(&employee).unwrap();
			let decoded: Employee = format.decode(&bytes).unwrap();
			prop_assert_eq!(&decoded, &employee);
		}
	}
}
