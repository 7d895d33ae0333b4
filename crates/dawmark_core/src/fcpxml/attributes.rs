//! Typed attribute accessors.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::timecode::Fraction;

/// An attribute whose value does not match its grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedAttribute {
    pub attribute: &'static str,
    pub value: String,
}

impl fmt::Display for MalformedAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed {}=\"{}\"", self.attribute, self.value)
    }
}

/// A time attribute: absent, present, or malformed.
///
/// Absence and zero are distinct: `Ok(None)` is not `Ok(Some(0s))`.
pub type TimeAttr = Result<Option<Fraction>, MalformedAttribute>;

/// Read a rational time attribute (`start`, `offset`, `duration`, `tcStart`).
pub fn time_attr(node: roxmltree::Node<'_, '_>, attribute: &'static str) -> TimeAttr {
    match node.attribute(attribute) {
        None => Ok(None),
        Some(value) => value
            .parse::<Fraction>()
            .map(Some)
            .map_err(|_| MalformedAttribute {
                attribute,
                value: value.to_string(),
            }),
    }
}

/// Anchor lane; absent means 0 (contained in the parent's primary storyline).
pub fn lane(node: roxmltree::Node<'_, '_>) -> Result<i32, MalformedAttribute> {
    match node.attribute("lane") {
        None => Ok(0),
        Some(value) => value.trim().parse().map_err(|_| MalformedAttribute {
            attribute: "lane",
            value: value.to_string(),
        }),
    }
}

/// `"1"`/`"0"` flags. Anything else reads as absent.
pub fn flag(node: roxmltree::Node<'_, '_>, attribute: &str) -> Option<bool> {
    match node.attribute(attribute) {
        Some("1") => Some(true),
        Some("0") => Some(false),
        _ => None,
    }
}

/// Elements are enabled unless they carry `enabled="0"`.
pub fn is_enabled(node: roxmltree::Node<'_, '_>) -> bool {
    flag(node, "enabled") != Some(false)
}

/// True when the element or any ancestor is disabled.
pub fn is_effectively_disabled(node: roxmltree::Node<'_, '_>) -> bool {
    node.ancestors()
        .filter(|n| n.is_element())
        .any(|n| !is_enabled(n))
}

/// Timecode display format of a sequence or media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimecodeFormat {
    #[serde(rename = "DF")]
    DropFrame,
    #[serde(rename = "NDF")]
    NonDropFrame,
}

impl TimecodeFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "DF" => Some(Self::DropFrame),
            "NDF" => Some(Self::NonDropFrame),
            _ => None,
        }
    }

    pub fn is_drop_frame(&self) -> bool {
        matches!(self, Self::DropFrame)
    }
}

/// Read `tcFormat`. Unknown values read as absent.
pub fn tc_format(node: roxmltree::Node<'_, '_>) -> Option<TimecodeFormat> {
    node.attribute("tcFormat").and_then(TimecodeFormat::parse)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_root<F: FnOnce(roxmltree::Node<'_, '_>)>(xml: &str, f: F) {
        let doc = roxmltree::Document::parse(xml).unwrap();
        f(doc.root_element());
    }

    #[test]
    fn time_attr_states() {
        with_root(r#"<clip offset="3600/25s" start="0s" duration="bad"/>"#, |node| {
            assert_eq!(
                time_attr(node, "offset"),
                Ok(Some(Fraction::from_seconds(144)))
            );
            assert_eq!(time_attr(node, "start"), Ok(Some(Fraction::ZERO)));
            assert_eq!(time_attr(node, "tcStart"), Ok(None));
            assert_eq!(
                time_attr(node, "duration"),
                Err(MalformedAttribute {
                    attribute: "duration",
                    value: "bad".to_string()
                })
            );
        });
    }

    #[test]
    fn lane_defaults_to_zero() {
        with_root(r#"<clip/>"#, |node| assert_eq!(lane(node), Ok(0)));
        with_root(r#"<clip lane="-2"/>"#, |node| assert_eq!(lane(node), Ok(-2)));
        with_root(r#"<clip lane="x"/>"#, |node| assert!(lane(node).is_err()));
    }

    #[test]
    fn disabled_through_ancestor() {
        let doc =
            roxmltree::Document::parse(r#"<spine><clip enabled="0"><marker/></clip></spine>"#)
                .unwrap();
        let marker = doc
            .descendants()
            .find(|n| n.has_tag_name("marker"))
            .unwrap();
        assert!(is_enabled(marker));
        assert!(is_effectively_disabled(marker));
        assert!(!is_effectively_disabled(doc.root_element()));
    }

    #[test]
    fn tc_format_values() {
        with_root(r#"<sequence tcFormat="DF"/>"#, |node| {
            assert_eq!(tc_format(node), Some(TimecodeFormat::DropFrame));
        });
        with_root(r#"<sequence tcFormat="xx"/>"#, |node| {
            assert_eq!(tc_format(node), None);
        });
    }
}
