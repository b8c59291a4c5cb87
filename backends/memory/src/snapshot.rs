use std::{collections::BTreeMap, fmt::Write as _};

use serde::{Deserialize, Serialize};

/// Owned, serialisable copy of an output subtree.
///
/// Listeners are not part of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Snapshot {
    /// An element and its subtree.
    Element {
        /// Tag name.
        tag: String,
        /// Attributes in key order.
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attributes: BTreeMap<String, String>,
        /// Children in document order.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<Snapshot>,
    },
    /// A text leaf.
    Text {
        /// Text content.
        content: String,
    },
}

impl Snapshot {
    /// Serialises the subtree as markup, escaping text and attribute values.
    #[must_use]
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        match self {
            Self::Text { content } => escape_into(out, content),
            Self::Element {
                tag,
                attributes,
                children,
            } => {
                out.push('<');
                out.push_str(tag);
                for (key, value) in attributes {
                    let _ = write!(out, " {key}=\"");
                    escape_into(out, value);
                    out.push('"');
                }
                out.push('>');
                for child in children {
                    child.write_markup(out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }

    /// Converts the snapshot into a JSON value.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` serialisation failures.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Snapshot {
        Snapshot::Element {
            tag: "p".into(),
            attributes: BTreeMap::from([("title".to_owned(), "a \"b\"".to_owned())]),
            children: vec![Snapshot::Text {
                content: "1 < 2 & 3".into(),
            }],
        }
    }

    #[test]
    fn markup_escapes_text_and_attributes() {
        assert_eq!(
            sample().to_markup(),
            r#"<p title="a &quot;b&quot;">1 &lt; 2 &amp; 3</p>"#
        );
    }

    #[test]
    fn json_is_tagged_by_kind() {
        let value = sample().to_json().unwrap();
        assert_eq!(
            value,
            json!({
                "kind": "element",
                "tag": "p",
                "attributes": {"title": "a \"b\""},
                "children": [{"kind": "text", "content": "1 < 2 & 3"}],
            })
        );
        let back: Snapshot = serde_json::from_value(value).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn empty_collections_are_omitted() {
        let value = Snapshot::Element {
            tag: "br".into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
        .to_json()
        .unwrap();
        assert_eq!(value, json!({"kind": "element", "tag": "br"}));
    }
}
