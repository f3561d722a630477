//! XML to map.

use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};

use super::{FOLD_SUFFIX, TEXT_KEY};
use crate::{
    error::{PayError, Result},
    value::{ParamMap, Value, XmlMap},
};

/// An element that has been opened but not yet closed.
#[derive(Debug)]
struct Frame {
    name: String,
    /// Text seen before the first child element.
    text: String,
    fields: ParamMap,
    has_attributes: bool,
    has_children: bool,
}

impl Frame {
    fn open(start: &BytesStart<'_>, position: usize) -> Result<Self> {
        let name = element_name(start, position)?;
        let mut fields = ParamMap::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| malformed(position, &e))?;
            let key = std::str::from_utf8(attribute.key.as_ref())
                .map_err(|e| malformed(position, &e))?
                .to_owned();
            let value = attribute.unescape_value().map_err(|e| malformed(position, &e))?;
            fields.insert(key, Value::String(value.into_owned()));
        }
        let has_attributes = !fields.is_empty();
        Ok(Self { name, text: String::new(), fields, has_attributes, has_children: false })
    }

    fn push_text(&mut self, text: &str) {
        // text after the first child is tail text and is not kept
        if !self.has_children {
            self.text.push_str(text);
        }
    }

    fn add_child(&mut self, name: String, value: Value) {
        self.has_children = true;
        insert_folded(&mut self.fields, name, value);
    }

    fn finish(self) -> (String, Value) {
        let text = self.text.trim();
        if !self.has_attributes && !self.has_children {
            return (self.name, Value::String(text.to_owned()));
        }

        let mut fields = self.fields;
        if !text.is_empty() {
            fields.insert(TEXT_KEY.to_owned(), Value::String(text.to_owned()));
        }
        (self.name, Value::Map(fields))
    }
}

/// Decodes a reply document into the fields of its root element.
///
/// # Errors
///
/// Returns [`PayError::MalformedDocument`] if the text is not well-formed XML.
pub fn decode(document: &str) -> Result<XmlMap> {
    let (_, root) = parse_document(document)?;
    Ok(match root {
        Value::Map(fields) => fields,
        Value::String(text) if text.is_empty() => XmlMap::new(),
        other => {
            let mut fields = XmlMap::new();
            fields.insert(TEXT_KEY.to_owned(), other);
            fields
        }
    })
}

/// Parses a document into its root tag and decoded root value.
///
/// A leaf element decodes to its trimmed text. An element with attributes or
/// children decodes to a map of its attributes and children, plus its own text
/// under `text` when there is any.
///
/// # Errors
///
/// Returns [`PayError::MalformedDocument`] on syntax errors, mismatched or
/// unclosed tags, text outside the root element, a second root element, or an
/// empty document.
pub fn parse_document(document: &str) -> Result<(String, Value)> {
    let mut reader = Reader::from_str(document);
    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        let position = reader.buffer_position();
        let event = reader.read_event().map_err(|e| malformed(position, &e))?;

        match event {
            Event::Start(start) => {
                ensure_single_root(root.as_ref(), position)?;
                stack.push(Frame::open(&start, position)?);
            }
            Event::Empty(start) => {
                ensure_single_root(root.as_ref(), position)?;
                let (name, value) = Frame::open(&start, position)?.finish();
                attach(&mut stack, &mut root, name, value);
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| malformed(position, &"closing tag without an open element"))?;
                let (name, value) = frame.finish();
                attach(&mut stack, &mut root, name, value);
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| malformed(position, &e))?;
                match stack.last_mut() {
                    Some(frame) => frame.push_text(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err(malformed(position, &"text outside the root element")),
                }
            }
            Event::CData(data) => {
                let text = std::str::from_utf8(&data).map_err(|e| malformed(position, &e))?;
                match stack.last_mut() {
                    Some(frame) => frame.push_text(text),
                    None => return Err(malformed(position, &"CDATA outside the root element")),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(PayError::MalformedDocument(format!("element <{}> is never closed", open.name)));
    }
    root.ok_or_else(|| PayError::MalformedDocument("document has no root element".to_owned()))
}

/// Stores `value` under `tag`, folding repeated tags into `<tag>_all`.
///
/// The second occurrence moves the first value and the new one into a
/// two-item list under the suffixed key; later occurrences append to it.
pub(crate) fn insert_folded(fields: &mut ParamMap, tag: String, value: Value) {
    let folded = format!("{tag}{FOLD_SUFFIX}");
    if let Some(first) = fields.remove(&tag) {
        fields.insert(folded, Value::List(vec![first, value]));
    } else if let Some(Value::List(items)) = fields.get_mut(&folded) {
        items.push(value);
    } else {
        fields.insert(tag, value);
    }
}

fn attach(stack: &mut [Frame], root: &mut Option<(String, Value)>, name: String, value: Value) {
    match stack.last_mut() {
        Some(parent) => parent.add_child(name, value),
        None => *root = Some((name, value)),
    }
}

fn ensure_single_root(root: Option<&(String, Value)>, position: usize) -> Result<()> {
    match root {
        Some((name, _)) => {
            Err(malformed(position, &format!("second root element after <{name}>")))
        }
        None => Ok(()),
    }
}

fn element_name(start: &BytesStart<'_>, position: usize) -> Result<String> {
    std::str::from_utf8(start.name().as_ref())
        .map(str::to_owned)
        .map_err(|e| malformed(position, &e))
}

fn malformed(position: usize, cause: &dyn std::fmt::Display) -> PayError {
    PayError::MalformedDocument(format!("at byte {position}: {cause}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_flat_reply() {
        let decoded = decode(
            "<xml><return_code><![CDATA[SUCCESS]]></return_code>\n\
             <return_msg><![CDATA[OK]]></return_msg>\n\
             <total_fee>100</total_fee></xml>",
        )
        .unwrap();

        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded["return_code"], Value::from("SUCCESS"));
        assert_eq!(decoded["return_msg"], Value::from("OK"));
        assert_eq!(decoded["total_fee"], Value::from("100"));
    }

    #[test]
    fn test_decode_trims_text() {
        let decoded = decode("<xml><body>\n  test  \n</body></xml>").unwrap();
        assert_eq!(decoded["body"], Value::from("test"));
    }

    #[test]
    fn test_decode_unescapes_entities() {
        let decoded = decode("<xml><body>a &amp; b</body></xml>").unwrap();
        assert_eq!(decoded["body"], Value::from("a & b"));
    }

    #[test]
    fn test_decode_empty_element() {
        let decoded = decode("<xml><attach></attach><device_info/></xml>").unwrap();
        assert_eq!(decoded["attach"], Value::from(""));
        assert_eq!(decoded["device_info"], Value::from(""));
    }

    #[test]
    fn test_decode_attributes_only() {
        let decoded = decode(r#"<xml><coupon id="1" fee="10"/></xml>"#).unwrap();
        let coupon = decoded["coupon"].as_map().unwrap();
        assert_eq!(coupon["id"], Value::from("1"));
        assert_eq!(coupon["fee"], Value::from("10"));
        assert!(!coupon.contains_key(TEXT_KEY));
    }

    #[test]
    fn test_decode_attributes_with_text() {
        let decoded = decode(r#"<xml><fee currency="CNY">100</fee></xml>"#).unwrap();
        let fee = decoded["fee"].as_map().unwrap();
        assert_eq!(fee["currency"], Value::from("CNY"));
        assert_eq!(fee[TEXT_KEY], Value::from("100"));
    }

    #[test]
    fn test_decode_text_before_children_is_kept() {
        let decoded = decode("<xml><a>head<b>1</b>tail</a></xml>").unwrap();
        let a = decoded["a"].as_map().unwrap();
        assert_eq!(a["b"], Value::from("1"));
        assert_eq!(a[TEXT_KEY], Value::from("head"));
    }

    #[test]
    fn test_decode_two_siblings_fold() {
        let decoded = decode("<xml><item>a</item><item>b</item></xml>").unwrap();
        assert!(!decoded.contains_key("item"));
        assert_eq!(decoded["item_all"], Value::List(vec![Value::from("a"), Value::from("b")]));
    }

    #[test]
    fn test_decode_interleaved_siblings_fold_in_order() {
        let decoded = decode("<xml><item>a</item><other>x</other><item>b</item></xml>").unwrap();
        assert_eq!(decoded["other"], Value::from("x"));
        assert_eq!(decoded["item_all"], Value::List(vec![Value::from("a"), Value::from("b")]));
    }

    #[test]
    fn test_child_named_like_attribute_folds() {
        let decoded = decode(r#"<xml><a id="1"><id>2</id></a></xml>"#).unwrap();
        let a = decoded["a"].as_map().unwrap();
        assert_eq!(a["id_all"], Value::List(vec![Value::from("1"), Value::from("2")]));
    }

    #[test]
    fn test_parse_document_returns_root() {
        let (root, value) = parse_document("<?xml version=\"1.0\"?><!-- c --><reply><a>1</a></reply>").unwrap();
        assert_eq!(root, "reply");
        assert_eq!(value.as_map().unwrap()["a"], Value::from("1"));
    }

    #[test]
    fn test_decode_text_root() {
        let decoded = decode("<xml>plain</xml>").unwrap();
        assert_eq!(decoded[TEXT_KEY], Value::from("plain"));
        assert!(decode("<xml></xml>").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_mismatched_tag() {
        let err = decode("<xml><a>1</b></xml>").unwrap_err();
        assert!(matches!(err, PayError::MalformedDocument(_)));
    }

    #[test]
    fn test_malformed_unclosed_root() {
        let err = decode("<xml><a>1</a>").unwrap_err();
        assert!(matches!(err, PayError::MalformedDocument(_)));
    }

    #[test]
    fn test_malformed_two_roots() {
        let err = decode("<xml></xml><xml></xml>").unwrap_err();
        assert!(matches!(err, PayError::MalformedDocument(_)));
    }

    #[test]
    fn test_malformed_text_outside_root() {
        assert!(decode("oops<xml></xml>").is_err());
        assert!(decode("").is_err());
        assert!(decode("not xml at all").is_err());
    }
}
