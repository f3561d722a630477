//! XML wire codec.
//!
//! Requests are flat documents under an `<xml>` root, one element per field.
//! Replies may nest: elements with attributes or children decode to maps, and
//! repeated sibling tags fold into a list stored under `<tag>_all`:
//!
//! ```text
//! <xml><item>a</item></xml>                         {"item": "a"}
//! <xml><item>a</item><item>b</item></xml>           {"item_all": ["a", "b"]}
//! <xml><item>a</item><item>b</item><item>c</item>   {"item_all": ["a", "b", "c"]}
//! ```
//!
//! Folding is order dependent and does not round-trip a document that mixes a
//! literal `<item_all>` element with repeated `<item>` siblings. That is a
//! property of the provider's format and is kept as-is.
//!
//! Element text is written verbatim (surrounding whitespace trimmed). Values
//! containing `<` or `&` produce a document the provider cannot parse; callers
//! are expected to send plain text.
//!
//! # Examples
//!
//! ```rust
//! use weixinpay::{
//!     value::{ParamMap, Value},
//!     xml,
//! };
//!
//! # fn example() -> weixinpay::error::Result<()> {
//! let mut params = ParamMap::new();
//! params.insert("return_code".to_owned(), Value::from("SUCCESS"));
//! params.insert("total_fee".to_owned(), Value::from(100));
//! params.insert("attach".to_owned(), Value::from(""));
//!
//! let document = xml::encode(xml::ROOT, &params);
//! assert_eq!(document, "<xml><return_code>SUCCESS</return_code><total_fee>100</total_fee></xml>");
//!
//! let decoded = xml::decode(&document)?;
//! assert_eq!(decoded["total_fee"], Value::from("100"));
//! # Ok(())
//! # }
//! ```

mod decode;
mod encode;

pub use decode::{decode, parse_document};
pub use encode::{encode, write_document};

/// Root element of every request and reply.
pub const ROOT: &str = "xml";

/// Suffix of the key that holds folded repeated siblings.
pub const FOLD_SUFFIX: &str = "_all";

/// Key under which an element's own text is kept when it also has fields.
pub const TEXT_KEY: &str = "text";
