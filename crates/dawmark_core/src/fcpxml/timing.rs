//! Absolute-time resolution.
//!
//! Every clip has a local timeline whose origin is its `start` (implied
//! `0s` when absent); its children are positioned in that local time. A
//! sequence's origin is its `tcStart`. Spines are transparent containers.
//! Folding the breadcrumb list from the outside in yields the running
//! absolute position of the innermost local origin.

use std::iter;

use super::attributes::{tc_format, time_attr, MalformedAttribute, TimecodeFormat};
use super::breadcrumbs::{breadcrumbs, Breadcrumb};
use super::diagnostics::{Unresolved, UnresolvedReason};
use super::element_type::ElementType;
use super::error::ResourceLookupError;
use super::resources::{Resource, ResourceTable};
use crate::timecode::{
    Fraction, FrameRate, SubframesBase, Timecode, TimecodeProperties, UpperLimit,
};

/// Result of folding a breadcrumb list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Accumulated {
    /// Absolute position of the innermost local origin. `None` when no
    /// ancestor carries timing context.
    pub running: Option<Fraction>,
    /// Local time value of that origin in the innermost timeline.
    pub origin: Option<Fraction>,
}

impl Accumulated {
    /// Map a local time in the innermost timeline to absolute time.
    ///
    /// With no context the local value is returned unchanged.
    pub fn place(&self, local: Fraction) -> Option<Fraction> {
        match (self.running, self.origin) {
            (Some(running), Some(origin)) => running.checked_add(local.checked_sub(origin)?),
            _ => Some(local),
        }
    }
}

/// Fold ancestors outermost to innermost into an accumulated position.
///
/// Clips and captions require an `offset`; a missing or malformed value
/// anywhere in the chain makes the result unresolved. Structure elements,
/// spines and unrecognised elements contribute nothing.
pub fn aggregate_offset(chain: &[Breadcrumb<'_, '_>]) -> Result<Accumulated, Unresolved> {
    let mut acc = Accumulated::default();

    for crumb in chain {
        let Some(element_type) = crumb.element_type else {
            continue;
        };

        let Some(origin) = local_origin(crumb) else {
            continue;
        };
        let origin = origin.map_err(|e| Unresolved::new(crumb.node, e.into()))?;

        if element_type.is_sequence() {
            acc = Accumulated {
                running: Some(origin),
                origin: Some(origin),
            };
        } else if element_type.is_positioned() {
            let offset = crumb
                .offset
                .clone()
                .map_err(|e| Unresolved::new(crumb.node, e.into()))?
                .ok_or_else(|| {
                    Unresolved::new(
                        crumb.node,
                        UnresolvedReason::MissingAttribute { attribute: "offset" },
                    )
                })?;
            let running = acc.place(offset).ok_or_else(|| overflow(crumb.node))?;
            acc = Accumulated {
                running: Some(running),
                origin: Some(origin),
            };
        }
    }

    Ok(acc)
}

/// Innermost local origin in the chain, the value `aggregate_offset`
/// rebases on. Sequences and positioned elements without `start`/`tcStart`
/// have an origin of `0s`.
///
/// Malformed values are skipped here; `aggregate_offset` reports them.
pub fn nearest_start(chain: &[Breadcrumb<'_, '_>]) -> Option<Fraction> {
    chain
        .iter()
        .rev()
        .find_map(|crumb| local_origin(crumb).and_then(Result::ok))
}

/// Local timeline origin of a sequence or positioned element; `None` for
/// elements that do not open a local timeline.
fn local_origin(crumb: &Breadcrumb<'_, '_>) -> Option<Result<Fraction, MalformedAttribute>> {
    let element_type = crumb.element_type?;
    if !(element_type.is_sequence() || element_type.is_positioned()) {
        return None;
    }
    Some(crumb.start.clone().map(|start| start.unwrap_or(Fraction::ZERO)))
}

/// Resolves absolute start times against one document's resources.
#[derive(Debug, Clone, Copy)]
pub struct TimelineResolver<'r> {
    resources: &'r ResourceTable,
    upper_limit: UpperLimit,
    subframes_base: SubframesBase,
    fallback_frame_rate: Option<FrameRate>,
}

impl<'r> TimelineResolver<'r> {
    pub fn new(resources: &'r ResourceTable) -> Self {
        Self {
            resources,
            upper_limit: UpperLimit::default(),
            subframes_base: SubframesBase::default(),
            fallback_frame_rate: None,
        }
    }

    pub fn with_upper_limit(mut self, upper_limit: UpperLimit) -> Self {
        self.upper_limit = upper_limit;
        self
    }

    pub fn with_subframes_base(mut self, subframes_base: SubframesBase) -> Self {
        self.subframes_base = subframes_base;
        self
    }

    /// Rate used when the document does not determine one.
    pub fn with_fallback_frame_rate(mut self, frame_rate: Option<FrameRate>) -> Self {
        self.fallback_frame_rate = frame_rate;
        self
    }

    /// Absolute start of `target` on the top-level timeline.
    pub fn absolute_start(&self, target: roxmltree::Node<'_, '_>) -> Result<Timecode, Unresolved> {
        let chain = breadcrumbs(target);
        let seconds = self.absolute_seconds_in(target, &chain)?;
        let frame_rate = self.frame_rate_in(target, &chain)?;
        let properties = TimecodeProperties::new(frame_rate)
            .with_subframes_base(self.subframes_base)
            .with_upper_limit(self.upper_limit);

        let timecode = Timecode::from_rational_wrapping(seconds, properties).map_err(|e| {
            Unresolved::new(
                target,
                UnresolvedReason::OutOfRange {
                    detail: e.to_string(),
                },
            )
        })?;
        tracing::debug!(
            "<{}> resolved to {} ({})",
            target.tag_name().name(),
            timecode,
            seconds
        );
        Ok(timecode)
    }

    /// Absolute start of `target` as exact seconds, before wrapping.
    pub fn absolute_seconds(&self, target: roxmltree::Node<'_, '_>) -> Result<Fraction, Unresolved> {
        self.absolute_seconds_in(target, &breadcrumbs(target))
    }

    fn absolute_seconds_in(
        &self,
        target: roxmltree::Node<'_, '_>,
        chain: &[Breadcrumb<'_, '_>],
    ) -> Result<Fraction, Unresolved> {
        let element_type = ElementType::of(target);

        if element_type.is_some_and(|t| t.is_sequence()) {
            return time_attr(target, "tcStart")
                .map(|v| v.unwrap_or(Fraction::ZERO))
                .map_err(|e| Unresolved::new(target, e.into()));
        }

        let acc = aggregate_offset(chain)?;
        let attribute = element_type.map_or("offset", |t| t.position_attribute());
        let position = time_attr(target, attribute).map_err(|e| Unresolved::new(target, e.into()))?;

        match position {
            Some(local) => acc.place(local).ok_or_else(|| overflow(target)),
            None if element_type.is_some_and(|t| t.is_spine()) => acc.running.ok_or_else(|| {
                Unresolved::new(target, UnresolvedReason::MissingAttribute { attribute })
            }),
            None => Err(Unresolved::new(
                target,
                UnresolvedReason::MissingAttribute { attribute },
            )),
        }
    }

    /// Frame rate governing `target`'s timeline.
    ///
    /// The outermost sequence's `format` wins. Without one, the innermost
    /// `format` attribute or asset/media `ref` is used, then the fallback.
    pub fn frame_rate(&self, target: roxmltree::Node<'_, '_>) -> Result<FrameRate, Unresolved> {
        self.frame_rate_in(target, &breadcrumbs(target))
    }

    fn frame_rate_in(
        &self,
        target: roxmltree::Node<'_, '_>,
        chain: &[Breadcrumb<'_, '_>],
    ) -> Result<FrameRate, Unresolved> {
        let outermost_first = || chain.iter().map(|b| b.node).chain(iter::once(target));

        let sequence = outermost_first().find(|n| {
            ElementType::of(*n).is_some_and(|t| t.is_sequence()) && n.attribute("format").is_some()
        });
        if let Some(sequence) = sequence {
            return self.lookup(sequence, "format", tc_format(sequence));
        }

        for node in iter::once(target).chain(chain.iter().rev().map(|b| b.node)) {
            if node.attribute("format").is_some() {
                return self.lookup(node, "format", tc_format(node));
            }
            if let Some(id) = node.attribute("ref") {
                match self.resources.get(id) {
                    // The element's own tcFormat picks drop or non-drop
                    Some(Resource::Media(media)) => {
                        return self.lookup(node, "ref", tc_format(node).or(media.tc_format));
                    }
                    Some(Resource::Asset(_)) => return self.lookup(node, "ref", tc_format(node)),
                    _ => {}
                }
            }
        }

        self.fallback(target)
    }

    fn lookup(
        &self,
        node: roxmltree::Node<'_, '_>,
        attribute: &'static str,
        tc_format: Option<TimecodeFormat>,
    ) -> Result<FrameRate, Unresolved> {
        let id = node.attribute(attribute).unwrap_or_default();
        match self.resources.frame_rate(id, tc_format) {
            Ok(rate) => Ok(rate),
            Err(ResourceLookupError::MissingResource(missing)) => Err(Unresolved::new(
                node,
                UnresolvedReason::UnresolvedReference {
                    attribute,
                    id: missing,
                },
            )),
            Err(e) => {
                tracing::warn!("{}", e);
                self.fallback(node)
            }
        }
    }

    fn fallback(&self, node: roxmltree::Node<'_, '_>) -> Result<FrameRate, Unresolved> {
        self.fallback_frame_rate
            .ok_or_else(|| Unresolved::new(node, UnresolvedReason::NoFrameRate))
    }
}

fn overflow(node: roxmltree::Node<'_, '_>) -> Unresolved {
    Unresolved::new(
        node,
        UnresolvedReason::OutOfRange {
            detail: "time arithmetic overflowed".to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESOURCES: &str = r#"<resources>
        <format id="r24" frameDuration="1/24s"/>
        <format id="r25" frameDuration="1/25s"/>
        <format id="r2997" frameDuration="1001/30000s"/>
        <asset id="a1" format="r25" hasVideo="1"/>
    </resources>"#;

    fn document(story: &str) -> String {
        format!(r#"<fcpxml version="1.11">{RESOURCES}<library><event><project name="P">{story}</project></event></library></fcpxml>"#)
    }

    fn resolve(xml: &str, tag: &str, name: &str) -> Result<Timecode, Unresolved> {
        let doc = roxmltree::Document::parse(xml).unwrap();
        let resources = ResourceTable::build(
            doc.descendants().find(|n| n.has_tag_name("resources")).unwrap(),
        );
        let target = doc
            .descendants()
            .find(|n| n.has_tag_name(tag) && n.attribute("name") == Some(name))
            .unwrap();
        TimelineResolver::new(&resources).absolute_start(target)
    }

    #[test]
    fn nested_anchored_clips_accumulate() {
        let xml = document(
            r#"<sequence format="r24" tcStart="3600s"><spine>
                <asset-clip name="Outer" ref="a1" offset="3600s" duration="10s">
                    <clip name="Mid" lane="1" offset="1s" duration="5s">
                        <title name="Inner" lane="1" offset="1s" duration="2s"/>
                    </clip>
                </asset-clip>
            </spine></sequence>"#,
        );
        assert_eq!(resolve(&xml, "asset-clip", "Outer").unwrap().to_string(), "01:00:00:00");
        assert_eq!(resolve(&xml, "clip", "Mid").unwrap().to_string(), "01:00:01:00");
        assert_eq!(resolve(&xml, "title", "Inner").unwrap().to_string(), "01:00:02:00");
    }

    #[test]
    fn clip_start_rebases_children() {
        // Marker at 13s in a clip whose local timeline starts at 10s,
        // placed at 01:00:05:00.
        let xml = document(
            r#"<sequence format="r24" tcStart="3600s"><spine>
                <asset-clip name="C" ref="a1" offset="3605s" start="10s" duration="20s">
                    <marker name="M" start="13s" duration="1/24s" value="Hit"/>
                </asset-clip>
            </spine></sequence>"#,
        );
        let marker = resolve(&xml, "marker", "M").unwrap();
        assert_eq!(marker.to_string(), "01:00:08:00");
        assert_eq!(marker.frame_rate(), FrameRate::Fps24);
    }

    #[test]
    fn sequence_resolves_to_tc_start() {
        let xml = document(r#"<sequence name="S" format="r2997" tcStart="3600s" tcFormat="DF"><spine/></sequence>"#);
        let tc = resolve(&xml, "sequence", "S").unwrap();
        assert_eq!(tc.frame_rate(), FrameRate::Fps29_97Drop);
        assert_eq!(tc.to_string(), "01:00:00;00");
    }

    #[test]
    fn element_tc_format_selects_drop_frame() {
        let xml = r#"<fcpxml version="1.11">
            <resources>
                <format id="r2997" frameDuration="1001/30000s"/>
                <asset id="a2997" format="r2997" hasVideo="1"/>
                <media id="m1"><sequence format="r2997" tcFormat="NDF"><spine/></sequence></media>
            </resources>
            <asset-clip name="DF" ref="a2997" offset="60s" tcFormat="DF"/>
            <asset-clip name="NDF" ref="a2997" offset="60s"/>
            <ref-clip name="Compound" ref="m1" offset="60s" tcFormat="DF"/>
            <ref-clip name="Inherits" ref="m1" offset="60s"/>
        </fcpxml>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let resources = ResourceTable::build(
            doc.descendants().find(|n| n.has_tag_name("resources")).unwrap(),
        );
        let resolver = TimelineResolver::new(&resources);
        let rate = |name: &str| {
            let node = doc
                .descendants()
                .find(|n| n.attribute("name") == Some(name))
                .unwrap();
            resolver.frame_rate(node).unwrap()
        };

        assert_eq!(rate("DF"), FrameRate::Fps29_97Drop);
        assert_eq!(rate("NDF"), FrameRate::Fps29_97);
        assert_eq!(rate("Compound"), FrameRate::Fps29_97Drop);
        assert_eq!(rate("Inherits"), FrameRate::Fps29_97);
    }

    #[test]
    fn root_fallback_uses_own_offset() {
        let xml = format!(r#"<fcpxml>{RESOURCES}<asset-clip name="X" ref="a1" offset="5s"/></fcpxml>"#);
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let clip = doc.descendants().find(|n| n.has_tag_name("asset-clip")).unwrap();
        let chain = breadcrumbs(clip);
        assert_eq!(aggregate_offset(&chain).unwrap(), Accumulated::default());

        let tc = resolve(&xml, "asset-clip", "X").unwrap();
        assert_eq!(tc.to_rational(), Fraction::from_seconds(5));
        assert_eq!(tc.frame_rate(), FrameRate::Fps25);
    }

    #[test]
    fn missing_ancestor_offset_is_unresolved() {
        let xml = document(
            r#"<sequence format="r24"><spine>
                <clip name="C" duration="5s"><marker name="M" start="1s"/></clip>
            </spine></sequence>"#,
        );
        let err = resolve(&xml, "marker", "M").unwrap_err();
        assert_eq!(err.element.tag, "clip");
        assert_eq!(
            err.reason,
            UnresolvedReason::MissingAttribute { attribute: "offset" }
        );
    }

    #[test]
    fn malformed_target_is_unresolved_not_zero() {
        let xml = document(
            r#"<sequence format="r24"><spine>
                <gap name="G" offset="abc" duration="1s"/>
                <gap name="Z" offset="0s" duration="1s"/>
            </spine></sequence>"#,
        );
        assert!(matches!(
            resolve(&xml, "gap", "G").unwrap_err().reason,
            UnresolvedReason::MalformedAttribute { attribute: "offset", .. }
        ));
        assert_eq!(resolve(&xml, "gap", "Z").unwrap().frame_count(), 0);
    }

    #[test]
    fn unknown_format_reference() {
        let xml = document(r#"<sequence format="missing"><spine><gap name="G" offset="0s"/></spine></sequence>"#);
        assert_eq!(
            resolve(&xml, "gap", "G").unwrap_err().reason,
            UnresolvedReason::UnresolvedReference {
                attribute: "format",
                id: "missing".to_string()
            }
        );
    }

    #[test]
    fn no_frame_rate_without_fallback() {
        let xml = r#"<fcpxml><gap name="G" offset="1s"/></fcpxml>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let gap = doc.descendants().find(|n| n.has_tag_name("gap")).unwrap();
        let resources = ResourceTable::default();

        let resolver = TimelineResolver::new(&resources);
        assert_eq!(
            resolver.absolute_start(gap).unwrap_err().reason,
            UnresolvedReason::NoFrameRate
        );

        let resolver = resolver.with_fallback_frame_rate(Some(FrameRate::Fps25));
        assert_eq!(resolver.absolute_start(gap).unwrap().to_string(), "00:00:01:00");
    }

    #[test]
    fn wraps_past_upper_limit() {
        let xml = document(
            r#"<sequence format="r24" tcStart="82800s"><spine>
                <clip name="C" offset="82800s" duration="10800s">
                    <marker name="M" start="7200s"/>
                </clip>
            </spine></sequence>"#,
        );
        assert_eq!(resolve(&xml, "marker", "M").unwrap().to_string(), "01:00:00:00");
    }

    #[test]
    fn nearest_start_is_innermost() {
        let xml = document(
            r#"<sequence format="r24" tcStart="3600s"><spine>
                <clip offset="3600s" start="10s"><spine><video name="V" offset="12s"/></spine></clip>
            </spine></sequence>"#,
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let video = doc.descendants().find(|n| n.has_tag_name("video")).unwrap();
        let chain = breadcrumbs(video);
        assert_eq!(nearest_start(&chain), Some(Fraction::from_seconds(10)));
    }

    #[test]
    fn nearest_start_matches_resolver_origin() {
        // The title has no start, so its local origin is 0s, not the
        // enclosing clip's 10s.
        let xml = document(
            r#"<sequence format="r24" tcStart="3600s"><spine>
                <clip name="C" offset="3600s" start="10s" duration="20s">
                    <title name="T" lane="1" offset="12s" duration="5s">
                        <marker name="M" start="1s" duration="1/24s" value="Hit"/>
                    </title>
                </clip>
            </spine></sequence>"#,
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let marker = doc.descendants().find(|n| n.has_tag_name("marker")).unwrap();
        let chain = breadcrumbs(marker);

        let acc = aggregate_offset(&chain).unwrap();
        assert_eq!(nearest_start(&chain), Some(Fraction::ZERO));
        assert_eq!(nearest_start(&chain), acc.origin);
        assert_eq!(resolve(&xml, "marker", "M").unwrap().to_string(), "01:00:03:00");
    }
}
