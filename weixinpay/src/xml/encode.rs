//! Map to XML.

use crate::value::{ParamMap, Value};

/// Encodes a request document.
///
/// Blank values are left out. Every other value is rendered with
/// [`Value::to_wire_text`], so lists and maps travel as JSON text inside a
/// single element.
#[must_use]
pub fn encode(root: &str, params: &ParamMap) -> String {
    let flat: ParamMap = params
        .iter()
        .filter(|(_, value)| !value.is_blank())
        .map(|(name, value)| (name.clone(), Value::String(value.to_wire_text())))
        .collect();
    write_document(root, &flat)
}

/// Writes `fields` structurally under `root`.
///
/// Maps become nested elements and each list item becomes a sibling element
/// with the list's tag, the inverse of the decoder's folding. Nothing is
/// dropped, so an empty string is written as an empty element.
#[must_use]
pub fn write_document(root: &str, fields: &ParamMap) -> String {
    let mut out = String::new();
    open(&mut out, root);
    write_fields(&mut out, fields);
    close(&mut out, root);
    out
}

fn write_fields(out: &mut String, fields: &ParamMap) {
    for (tag, value) in fields {
        write_element(out, tag, value);
    }
}

fn write_element(out: &mut String, tag: &str, value: &Value) {
    match value {
        Value::String(text) => {
            open(out, tag);
            out.push_str(text.trim());
            close(out, tag);
        }
        Value::Integer(number) => {
            open(out, tag);
            out.push_str(&number.to_string());
            close(out, tag);
        }
        Value::List(items) => {
            for item in items {
                write_element(out, tag, item);
            }
        }
        Value::Map(fields) => {
            open(out, tag);
            write_fields(out, fields);
            close(out, tag);
        }
    }
}

fn open(out: &mut String, tag: &str) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
}

fn close(out: &mut String, tag: &str) {
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_skips_blank_values() {
        let mut params = ParamMap::new();
        params.insert("appid".to_owned(), Value::from("wx123"));
        params.insert("attach".to_owned(), Value::from(""));
        params.insert("detail".to_owned(), Value::List(vec![]));
        params.insert("total_fee".to_owned(), Value::from(0));

        assert_eq!(
            encode("xml", &params),
            "<xml><appid>wx123</appid><total_fee>0</total_fee></xml>"
        );
    }

    #[test]
    fn test_encode_trims_text() {
        let mut params = ParamMap::new();
        params.insert("body".to_owned(), Value::from("  test \n"));
        assert_eq!(encode("xml", &params), "<xml><body>test</body></xml>");
    }

    #[test]
    fn test_encode_list_is_json_text() {
        let mut params = ParamMap::new();
        params.insert("ids".to_owned(), Value::List(vec![Value::from(1), Value::from(2)]));
        assert_eq!(encode("xml", &params), "<xml><ids>[1,2]</ids></xml>");
    }

    #[test]
    fn test_encode_does_not_escape() {
        let mut params = ParamMap::new();
        params.insert("body".to_owned(), Value::from("a&b"));
        assert_eq!(encode("xml", &params), "<xml><body>a&b</body></xml>");
    }

    #[test]
    fn test_encode_empty_map() {
        assert_eq!(encode("xml", &ParamMap::new()), "<xml></xml>");
    }

    #[test]
    fn test_write_document_keeps_empty_text() {
        let mut params = ParamMap::new();
        params.insert("attach".to_owned(), Value::from(""));
        assert_eq!(write_document("root", &params), "<root><attach></attach></root>");
    }

    #[test]
    fn test_write_document_nested_lists() {
        let mut params = ParamMap::new();
        params.insert(
            "n".to_owned(),
            Value::List(vec![Value::from(1), Value::List(vec![Value::from(2), Value::from(3)])]),
        );
        assert_eq!(write_document("xml", &params), "<xml><n>1</n><n>2</n><n>3</n></xml>");
    }
}
