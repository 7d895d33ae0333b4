//! Parsed FCPXML documents and whole-document extraction.

use std::collections::HashSet;

use serde::{Serialize, Serializer};

use super::attributes::is_effectively_disabled;
use super::diagnostics::{Diagnostic, ElementIdentity};
use super::element_type::{AnnotationType, ElementType, StoryElementType};
use super::error::{FcpxmlError, FcpxmlResult};
use super::resources::ResourceTable;
use super::role_resolver::{AncestorRoles, FlattenedRoles, RoleResolver};
use super::timing::TimelineResolver;
use crate::config::{ExtractionScope, Settings, TimelineSettings};
use crate::markers::{DawMarker, MarkerTime};
use crate::timecode::Timecode;

/// A parsed document with its resource table.
///
/// The tree and the table are read-only after parsing, so any number of
/// queries can run against one document.
#[derive(Debug)]
pub struct FcpxmlDocument<'input> {
    doc: roxmltree::Document<'input>,
    resources: ResourceTable,
}

impl<'input> FcpxmlDocument<'input> {
    /// Parse an FCPXML string.
    ///
    /// Fails only when the input is not XML or the root is not `<fcpxml>`.
    /// Problems inside the document become diagnostics.
    pub fn parse(xml: &'input str) -> FcpxmlResult<Self> {
        let doc = roxmltree::Document::parse(xml)
            .map_err(|e| FcpxmlError::MalformedXml(format!("XML parse error: {}", e)))?;

        let root = doc.root_element();
        if root.tag_name().name() != "fcpxml" {
            return Err(FcpxmlError::NotFcpxml(root.tag_name().name().to_string()));
        }

        let resources = root
            .children()
            .find(|n| n.has_tag_name("resources"))
            .map(ResourceTable::build)
            .unwrap_or_default();

        tracing::debug!(
            "Parsed FCPXML {} with {} resources",
            root.attribute("version").unwrap_or("(no version)"),
            resources.len()
        );

        Ok(Self { doc, resources })
    }

    /// The root `version` attribute.
    pub fn version(&self) -> Option<&str> {
        self.doc.root_element().attribute("version")
    }

    pub fn root(&self) -> roxmltree::Node<'_, 'input> {
        self.doc.root_element()
    }

    pub fn resources(&self) -> &ResourceTable {
        &self.resources
    }

    pub fn events(&self) -> impl Iterator<Item = roxmltree::Node<'_, 'input>> + '_ {
        self.doc.descendants().filter(|n| n.has_tag_name("event"))
    }

    pub fn projects(&self) -> impl Iterator<Item = roxmltree::Node<'_, 'input>> + '_ {
        self.doc.descendants().filter(|n| n.has_tag_name("project"))
    }

    /// Story elements in document order, excluding compound-clip timelines
    /// defined inside `<resources>`.
    pub fn story_elements(&self) -> impl Iterator<Item = roxmltree::Node<'_, 'input>> + '_ {
        self.doc.descendants().filter(|n| {
            matches!(ElementType::of(*n), Some(ElementType::Story(_)))
                && !n.ancestors().any(|a| a.has_tag_name("resources"))
        })
    }

    /// Time resolver configured from timeline settings.
    pub fn resolver(&self, settings: &TimelineSettings) -> TimelineResolver<'_> {
        TimelineResolver::new(&self.resources)
            .with_upper_limit(settings.upper_limit)
            .with_subframes_base(settings.subframes_base)
            .with_fallback_frame_rate(settings.fallback_frame_rate)
    }

    pub fn role_resolver(&self) -> RoleResolver<'_> {
        RoleResolver::new(&self.resources)
    }

    /// Absolute start of one element, or `None` when it cannot be resolved.
    pub fn absolute_start(
        &self,
        node: roxmltree::Node<'_, '_>,
        settings: &TimelineSettings,
    ) -> Option<Timecode> {
        match self.resolver(settings).absolute_start(node) {
            Ok(timecode) => Some(timecode),
            Err(unresolved) => {
                tracing::debug!("{}", unresolved);
                None
            }
        }
    }

    pub fn ancestor_roles(&self, node: roxmltree::Node<'_, '_>) -> AncestorRoles {
        self.role_resolver().ancestor_roles(node)
    }

    /// Resolve time and roles for every story element in scope.
    ///
    /// One element failing never stops the pass; each failure adds a
    /// diagnostic and leaves that element's start absent.
    pub fn extract(&self, settings: &Settings) -> Extraction {
        let timeline = self.resolver(&settings.timeline);
        let roles = self.role_resolver();
        let mut diagnostics = self.resources.diagnostics().to_vec();
        let mut seen_role_diagnostics = HashSet::new();
        let mut elements = Vec::new();
        let mut skipped_disabled = 0usize;

        for node in self.story_elements() {
            let Some(element_type) = ElementType::of(node) else {
                continue;
            };
            if !in_scope(settings.extraction.scope, element_type) {
                continue;
            }
            if !settings.extraction.include_disabled && is_effectively_disabled(node) {
                skipped_disabled += 1;
                continue;
            }

            let absolute_start = match timeline.absolute_start(node) {
                Ok(timecode) => Some(timecode),
                Err(unresolved) => {
                    tracing::warn!("{}", unresolved);
                    diagnostics.push(Diagnostic::unresolved(node, unresolved));
                    None
                }
            };

            // Ancestors are revisited for every descendant; report each once
            let mut role_diagnostics = Vec::new();
            let roles = roles
                .ancestor_roles_collecting(node, &mut role_diagnostics)
                .flattened_roles();
            for diagnostic in role_diagnostics {
                if seen_role_diagnostics.insert(diagnostic.clone()) {
                    tracing::warn!("{}", diagnostic);
                    diagnostics.push(diagnostic);
                }
            }

            elements.push(ExtractedElement {
                element: ElementIdentity::of(node),
                element_type,
                absolute_start,
                roles,
            });
        }

        let extraction = Extraction {
            elements,
            diagnostics,
        };
        tracing::info!(
            "Extracted {} elements ({} unresolved, {} disabled skipped, {} diagnostics)",
            extraction.elements.len(),
            extraction.unresolved_count(),
            skipped_disabled,
            extraction.diagnostics.len()
        );
        extraction
    }

    /// Markers and chapter markers as format-independent markers.
    ///
    /// Times are stored as exact seconds on the top-level timeline, wrapped
    /// into the configured upper limit. Disabled markers are skipped.
    pub fn extract_markers(&self, settings: &TimelineSettings) -> MarkerExtraction {
        let timeline = self.resolver(settings);
        let mut markers = Vec::new();
        let mut diagnostics = Vec::new();

        let marker_nodes = self.story_elements().filter(|n| {
            matches!(
                ElementType::of(*n),
                Some(ElementType::Story(StoryElementType::Annotation(
                    AnnotationType::Marker | AnnotationType::ChapterMarker
                )))
            )
        });

        for node in marker_nodes {
            if is_effectively_disabled(node) {
                continue;
            }
            let seconds = timeline.absolute_start(node).and_then(|timecode| {
                let seconds = timeline.absolute_seconds(node)?;
                Ok(seconds
                    .rem_euclid(timecode.properties().limit_duration())
                    .unwrap_or_else(|| timecode.to_rational()))
            });
            match seconds {
                Ok(seconds) => {
                    let name = node.attribute("value").unwrap_or_default();
                    let mut marker = DawMarker::new(MarkerTime::rational(seconds), name);
                    if let Some(note) = node.attribute("note").filter(|n| !n.is_empty()) {
                        marker = marker.with_comment(note);
                    }
                    markers.push(marker);
                }
                Err(unresolved) => {
                    tracing::warn!("Skipping marker: {}", unresolved);
                    diagnostics.push(Diagnostic::unresolved(node, unresolved));
                }
            }
        }

        let timeline_start = self
            .projects()
            .flat_map(|p| p.children())
            .find(|n| n.has_tag_name("sequence"))
            .and_then(|sequence| timeline.absolute_start(sequence).ok());

        tracing::info!(
            "Extracted {} markers ({} unresolved)",
            markers.len(),
            diagnostics.len()
        );
        MarkerExtraction {
            markers,
            timeline_start,
            diagnostics,
        }
    }
}

fn in_scope(scope: ExtractionScope, element_type: ElementType) -> bool {
    match scope {
        ExtractionScope::All => true,
        ExtractionScope::Clips => element_type.is_clip(),
        ExtractionScope::Annotations => element_type.is_annotation(),
        ExtractionScope::Markers => matches!(
            element_type.annotation_type(),
            Some(AnnotationType::Marker | AnnotationType::ChapterMarker)
        ),
    }
}

/// One story element's resolved values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedElement {
    pub element: ElementIdentity,
    pub element_type: ElementType,
    /// `None` when the start could not be resolved.
    #[serde(serialize_with = "serialize_timecode")]
    pub absolute_start: Option<Timecode>,
    pub roles: FlattenedRoles,
}

fn serialize_timecode<S: Serializer>(
    timecode: &Option<Timecode>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match timecode {
        Some(tc) => serializer.serialize_some(&tc.to_string_with_subframes()),
        None => serializer.serialize_none(),
    }
}

/// Result of a whole-document pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Extraction {
    pub elements: Vec<ExtractedElement>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Extraction {
    pub fn unresolved_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| e.absolute_start.is_none())
            .count()
    }

    /// Pretty-printed JSON report.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Markers read from a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerExtraction {
    /// Markers in document order.
    pub markers: Vec<DawMarker>,
    /// Start of the first project's sequence, for ring ordering.
    pub timeline_start: Option<Timecode>,
    pub diagnostics: Vec<Diagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionSettings;
    use crate::fcpxml::{DiagnosticReason, Role, UnresolvedReason};
    use crate::markers::sort_markers;
    use crate::timecode::Fraction;

    const RESOURCES: &str = r#"<resources>
        <format id="r24" frameDuration="1/24s"/>
        <asset id="a1" format="r24" hasVideo="1" hasAudio="1"/>
    </resources>"#;

    fn document(story: &str) -> String {
        format!(
            r#"<fcpxml version="1.11">{RESOURCES}<library><event name="E"><project name="P"><sequence format="r24" tcStart="3600s"><spine>{story}</spine></sequence></project></event></library></fcpxml>"#
        )
    }

    fn settings(scope: ExtractionScope) -> Settings {
        Settings {
            extraction: ExtractionSettings {
                scope,
                include_disabled: false,
            },
            ..Settings::default()
        }
    }

    #[test]
    fn rejects_non_fcpxml() {
        assert!(matches!(
            FcpxmlDocument::parse("<fcpxml"),
            Err(FcpxmlError::MalformedXml(_))
        ));
        assert_eq!(
            FcpxmlDocument::parse("<xmeml/>").err(),
            Some(FcpxmlError::NotFcpxml("xmeml".to_string()))
        );
    }

    #[test]
    fn document_listing() {
        let xml = document(r#"<asset-clip name="A" ref="a1" offset="3600s" duration="1s"/>"#);
        let doc = FcpxmlDocument::parse(&xml).unwrap();
        assert_eq!(doc.version(), Some("1.11"));
        assert_eq!(doc.resources().len(), 2);
        assert_eq!(doc.events().count(), 1);
        assert_eq!(doc.projects().count(), 1);
        // sequence, spine, asset-clip
        assert_eq!(doc.story_elements().count(), 3);
    }

    #[test]
    fn single_element_queries() {
        let xml = document(r#"<asset-clip name="A" ref="a1" offset="3610s" duration="1s"/>"#);
        let doc = FcpxmlDocument::parse(&xml).unwrap();
        let clip = doc
            .story_elements()
            .find(|n| n.has_tag_name("asset-clip"))
            .unwrap();

        let start = doc.absolute_start(clip, &TimelineSettings::default()).unwrap();
        assert_eq!(start.to_string(), "01:00:10:00");

        let roles = doc.ancestor_roles(clip).flattened_roles();
        assert_eq!(roles.video, Role::video("Video"));
        assert_eq!(roles.audio, Role::audio("Dialogue"));
    }

    #[test]
    fn malformed_entry_is_isolated() {
        crate::logging::init_test_tracing();
        let clips: String = (0..100)
            .map(|i| {
                let offset = if i == 42 {
                    "bad".to_string()
                } else {
                    format!("{}s", 3600 + i)
                };
                format!(r#"<asset-clip name="c{i}" ref="a1" offset="{offset}" duration="1s"/>"#)
            })
            .collect();
        let xml = document(&clips);
        let doc = FcpxmlDocument::parse(&xml).unwrap();

        let extraction = doc.extract(&settings(ExtractionScope::Clips));
        assert_eq!(extraction.elements.len(), 100);
        assert_eq!(extraction.unresolved_count(), 1);
        assert_eq!(extraction.diagnostics.len(), 1);

        let broken = &extraction.elements[42];
        assert_eq!(broken.element.name.as_deref(), Some("c42"));
        assert!(broken.absolute_start.is_none());
        assert!(matches!(
            &extraction.diagnostics[0].reason,
            DiagnosticReason::Unresolved {
                reason: UnresolvedReason::MalformedAttribute { attribute: "offset", .. },
                ..
            }
        ));

        let last = &extraction.elements[99];
        assert_eq!(last.absolute_start.unwrap().to_string(), "01:01:39:00");
    }

    #[test]
    fn scope_and_disabled_filtering() {
        let xml = document(
            r#"<asset-clip name="A" ref="a1" offset="3600s" duration="10s">
                <marker start="1s" duration="1/24s" value="M1"/>
                <keyword start="0s" duration="10s" value="kw"/>
            </asset-clip>
            <asset-clip name="B" ref="a1" offset="3610s" duration="10s" enabled="0">
                <marker start="1s" duration="1/24s" value="M2"/>
            </asset-clip>"#,
        );
        let doc = FcpxmlDocument::parse(&xml).unwrap();

        let clips = doc.extract(&settings(ExtractionScope::Clips));
        assert_eq!(clips.elements.len(), 1);
        assert_eq!(clips.elements[0].element.name.as_deref(), Some("A"));

        let annotations = doc.extract(&settings(ExtractionScope::Annotations));
        assert_eq!(annotations.elements.len(), 2);

        let mut with_disabled = settings(ExtractionScope::Markers);
        with_disabled.extraction.include_disabled = true;
        let markers = doc.extract(&with_disabled);
        assert_eq!(markers.elements.len(), 2);
        assert_eq!(
            markers.elements[1].absolute_start.unwrap().to_string(),
            "01:00:11:00"
        );
    }

    #[test]
    fn shared_ancestor_role_diagnostic_reported_once() {
        let clips: String = (0..50)
            .map(|i| format!(r#"<video name="v{i}" offset="{i}s" duration="1s"/>"#))
            .collect();
        let xml = document(&format!(
            r#"<sync-clip name="S" offset="3600s" duration="60s" audioRole=".bad"><spine>{clips}</spine></sync-clip>"#
        ));
        let doc = FcpxmlDocument::parse(&xml).unwrap();
        let extraction = doc.extract(&settings(ExtractionScope::Clips));

        assert_eq!(extraction.elements.len(), 51);
        let malformed: Vec<_> = extraction
            .diagnostics
            .iter()
            .filter(|d| matches!(d.reason, DiagnosticReason::MalformedRole { .. }))
            .collect();
        assert_eq!(malformed.len(), 1);
        assert_eq!(malformed[0].element.name.as_deref(), Some("S"));
    }

    #[test]
    fn extraction_json_report() {
        let xml = document(r#"<asset-clip name="A" ref="a1" offset="3600s" duration="1s"/>"#);
        let doc = FcpxmlDocument::parse(&xml).unwrap();
        let json = doc.extract(&settings(ExtractionScope::Clips)).to_json().unwrap();
        assert!(json.contains("\"absolute_start\": \"01:00:00:00.00\""));
        assert!(json.contains("\"diagnostics\": []"));
    }

    #[test]
    fn markers_become_daw_markers() {
        let xml = document(
            r#"<asset-clip name="A" ref="a1" offset="3600s" start="10s" duration="20s">
                <marker start="15s" duration="1/24s" value="Late" note="check mix"/>
                <chapter-marker start="11s" duration="1/24s" value="Chapter" posterOffset="0s"/>
                <marker duration="1/24s" value="No start"/>
            </asset-clip>"#,
        );
        let doc = FcpxmlDocument::parse(&xml).unwrap();
        let extraction = doc.extract_markers(&TimelineSettings::default());

        assert_eq!(extraction.markers.len(), 2);
        assert_eq!(extraction.diagnostics.len(), 1);

        let late = &extraction.markers[0];
        assert_eq!(late.name, "Late");
        assert_eq!(late.comment.as_deref(), Some("check mix"));
        assert_eq!(late.time, MarkerTime::rational(Fraction::from_seconds(3605)));

        let start = extraction.timeline_start.unwrap();
        assert_eq!(start.to_string(), "01:00:00:00");

        let mut markers = extraction.markers.clone();
        sort_markers(&mut markers, start.properties(), &start);
        assert_eq!(markers[0].name, "Chapter");
    }
}
