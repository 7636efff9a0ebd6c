#![no_main]

use libfuzzer_sys::fuzz_target;

use treecodec::json::{JsonDecoder, JsonEncoder};
use treecodec::policy::ArrayEncoding;
use treecodec::url::{TextEncoding, UrlDecoder, UrlEncoder};
use treecodec::Value;

fuzz_target!(|data: &[u8]| {
	if let Ok(value) = JsonDecoder::new().decode::<Value>(data) {
		let _ = JsonEncoder::new().encode(&value);
		let _ = UrlEncoder::new().encode(&value);
	}
	for encoding in [TextEncoding::Utf8, TextEncoding::Utf16] {
		for arrays in [ArrayEncoding::Brackets, ArrayEncoding::Indexed] {
			let decoder = UrlDecoder::new().text_encoding(encoding).array_encoding(arrays);
			if let Ok(value) = decoder.decode::<Value>(data) {
				let encoder = UrlEncoder::new().text_encoding(encoding).array_encoding(arrays);
				let _ = encoder.encode(&value);
				let _ = JsonEncoder::new().encode(&value);
			}
		}
	}
});
