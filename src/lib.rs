//! Typed encoding and decoding through a format-agnostic value tree.
//!
//! A type implements [`Encode`] and [`Decode`] once, against the container
//! protocol of [`Encoder`] and [`Decoder`], and can then be written to or read
//! from any supported format:
//!
//! - [`json`]: JSON text through `serde_json`.
//! - [`url`]: bracket-notation URL queries, such as
//!   `user[tags][]=a&user[tags][]=b`.
//!
//! Scalars that a format cannot represent natively, like dates, binary data,
//! and non-finite floats, are converted according to a [`FormatPolicy`].
//!
//! ```
//! use treecodec::json::{JsonDecoder, JsonEncoder};
//! use treecodec::{Decode, Decoder, Encode, Encoder, Result};
//!
//! struct Point {
//! 	x: i32,
//! 	y: i32,
//! }
//!
//! impl Encode for Point {
//! 	fn encode(&self, encoder: &mut Encoder<'_>) -> Result<()> {
//! 		let mut container = encoder.container();
//! 		container.encode("x", &self.x)?;
//! 		container.encode("y", &self.y)
//! 	}
//! }
//!
//! impl Decode for Point {
//! 	fn decode(decoder: &Decoder<'_>) -> Result<Self> {
//! 		let container = decoder.container()?;
//! 		Ok(Point {
//! 			x: container.decode("x")?,
//! 			y: container.decode("y")?,
//! 		})
//! 	}
//! }
//!
//! let text = JsonEncoder::new().encode_to_string(&Point { x: 1, y: -2 })?;
//! assert_eq!(text, r#"{"x":1,"y":-2}"#);
//! let point: Point = JsonDecoder::new().decode_str(&text)?;
//! assert_eq!((point.x, point.y), (1, -2));
//! # Ok::<(), treecodec::Error>(())
//! ```

mod binary;
mod boxing;
pub mod decode;
pub mod encode;
mod error;
pub mod json;
mod path;
pub mod policy;
pub mod url;
mod value;

pub use binary::Binary;
pub use decode::{from_value, Decode, Decoder, KeyedDecoder, UnkeyedDecoder};
pub use encode::{to_value, Encode, Encoder, KeyedEncoder, SuperEncoder, UnkeyedEncoder};
pub use error::{Error, Result, Source};
pub use path::{Path, PathComponent};
pub use policy::FormatPolicy;
pub use url::QueryItem;
pub use value::{Map, Value};
