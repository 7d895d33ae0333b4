//! Resource table.
//!
//! Built in one pass over `<resources>`, read-only afterwards. Story
//! elements refer to resources by exact ID match through `ref` and `format`.

use std::collections::HashMap;

use serde::Serialize;

use super::attributes::{flag, tc_format, time_attr, TimecodeFormat};
use super::diagnostics::{Diagnostic, DiagnosticReason};
use super::element_type::{ElementType, ResourceKind};
use super::error::ResourceLookupError;
use crate::timecode::{Fraction, FrameRate};

/// Video format: frame duration and raster.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FormatResource {
    pub name: Option<String>,
    pub frame_duration: Option<Fraction>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub color_space: Option<String>,
}

/// A media file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AssetResource {
    pub name: Option<String>,
    pub uid: Option<String>,
    /// `None` when the attribute is absent.
    pub has_video: Option<bool>,
    pub has_audio: Option<bool>,
    pub format: Option<String>,
    pub start: Option<Fraction>,
    pub duration: Option<Fraction>,
    pub audio_sources: Option<u32>,
    pub audio_channels: Option<u32>,
    pub audio_rate: Option<String>,
    pub src: Option<String>,
}

/// A compound or multicam clip definition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MediaResource {
    pub name: Option<String>,
    pub uid: Option<String>,
    /// Format of the inner sequence or multicam.
    pub format: Option<String>,
    pub tc_start: Option<Fraction>,
    pub tc_format: Option<TimecodeFormat>,
    pub multicam: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct EffectResource {
    pub name: Option<String>,
    pub uid: Option<String>,
    pub src: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LocatorResource {
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ObjectTrackerResource {
    /// IDs of the nested tracking shapes.
    pub tracking_shapes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TrackingShapeResource {
    pub name: Option<String>,
    pub offset_enabled: Option<bool>,
    pub analysis_method: Option<String>,
}

/// A shared definition from `<resources>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resource {
    Asset(AssetResource),
    Media(MediaResource),
    Format(FormatResource),
    Effect(EffectResource),
    Locator(LocatorResource),
    ObjectTracker(ObjectTrackerResource),
    TrackingShape(TrackingShapeResource),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Asset(_) => ResourceKind::Asset,
            Self::Media(_) => ResourceKind::Media,
            Self::Format(_) => ResourceKind::Format,
            Self::Effect(_) => ResourceKind::Effect,
            Self::Locator(_) => ResourceKind::Locator,
            Self::ObjectTracker(_) => ResourceKind::ObjectTracker,
            Self::TrackingShape(_) => ResourceKind::TrackingShape,
        }
    }

    /// The `format` reference of an asset or media.
    pub fn format_ref(&self) -> Option<&str> {
        match self {
            Self::Asset(asset) => asset.format.as_deref(),
            Self::Media(media) => media.format.as_deref(),
            _ => None,
        }
    }
}

/// ID-keyed resource records plus the diagnostics produced while building.
#[derive(Debug, Clone, Default)]
pub struct ResourceTable {
    resources: HashMap<String, Resource>,
    diagnostics: Vec<Diagnostic>,
}

impl ResourceTable {
    /// Build the table from a `<resources>` element.
    ///
    /// Unknown children and resources without IDs are skipped with a
    /// diagnostic. Duplicate IDs keep the first definition.
    pub fn build(resources: roxmltree::Node<'_, '_>) -> Self {
        let mut table = Self::default();
        for child in resources.children().filter(|n| n.is_element()) {
            table.add_node(child);
        }
        tracing::debug!(
            "Built resource table with {} entries ({} diagnostics)",
            table.resources.len(),
            table.diagnostics.len()
        );
        table
    }

    fn add_node(&mut self, node: roxmltree::Node<'_, '_>) {
        let kind = match ElementType::of(node) {
            Some(ElementType::Resource(kind)) => kind,
            _ => {
                tracing::warn!(
                    "Skipping unknown resource <{}>",
                    node.tag_name().name()
                );
                self.diagnostics
                    .push(Diagnostic::new(node, DiagnosticReason::UnknownResource));
                return;
            }
        };

        let resource = match kind {
            ResourceKind::Asset => Resource::Asset(read_asset(node)),
            ResourceKind::Media => Resource::Media(read_media(node)),
            ResourceKind::Format => Resource::Format(read_format(node)),
            ResourceKind::Effect => Resource::Effect(EffectResource {
                name: string_attr(node, "name"),
                uid: string_attr(node, "uid"),
                src: string_attr(node, "src"),
            }),
            ResourceKind::Locator => Resource::Locator(LocatorResource {
                url: string_attr(node, "url"),
            }),
            ResourceKind::ObjectTracker => {
                let shapes: Vec<_> = node
                    .children()
                    .filter(|n| n.has_tag_name("tracking-shape"))
                    .collect();
                for shape in &shapes {
                    self.add_node(*shape);
                }
                Resource::ObjectTracker(ObjectTrackerResource {
                    tracking_shapes: shapes
                        .iter()
                        .filter_map(|s| s.attribute("id"))
                        .map(str::to_string)
                        .collect(),
                })
            }
            ResourceKind::TrackingShape => Resource::TrackingShape(TrackingShapeResource {
                name: string_attr(node, "name"),
                offset_enabled: flag(node, "offsetEnabled"),
                analysis_method: string_attr(node, "analysisMethod"),
            }),
        };

        self.insert(node, resource);
    }

    fn insert(&mut self, node: roxmltree::Node<'_, '_>, resource: Resource) {
        let Some(id) = node.attribute("id") else {
            tracing::warn!("Skipping <{}> without id", node.tag_name().name());
            self.diagnostics
                .push(Diagnostic::new(node, DiagnosticReason::MissingResourceId));
            return;
        };
        if self.resources.contains_key(id) {
            tracing::warn!("Duplicate resource id '{}', keeping first", id);
            self.diagnostics.push(Diagnostic::new(
                node,
                DiagnosticReason::DuplicateResourceId { id: id.to_string() },
            ));
            return;
        }
        self.resources.insert(id.to_string(), resource);
    }

    pub fn get(&self, id: &str) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub fn format(&self, id: &str) -> Option<&FormatResource> {
        match self.resources.get(id) {
            Some(Resource::Format(format)) => Some(format),
            _ => None,
        }
    }

    pub fn asset(&self, id: &str) -> Option<&AssetResource> {
        match self.resources.get(id) {
            Some(Resource::Asset(asset)) => Some(asset),
            _ => None,
        }
    }

    pub fn media(&self, id: &str) -> Option<&MediaResource> {
        match self.resources.get(id) {
            Some(Resource::Media(media)) => Some(media),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Resource)> {
        self.resources.iter().map(|(id, r)| (id.as_str(), r))
    }

    /// Diagnostics collected while building.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Resolve a frame rate for a resource ID.
    ///
    /// A format resolves directly; an asset or media follows its `format`
    /// reference. The drop-frame flag only matters for rates that have a
    /// drop-frame variant.
    pub fn frame_rate(
        &self,
        id: &str,
        tc_format: Option<TimecodeFormat>,
    ) -> Result<FrameRate, ResourceLookupError> {
        let resource = self
            .get(id)
            .ok_or_else(|| ResourceLookupError::MissingResource(id.to_string()))?;

        let (format_id, format) = match resource {
            Resource::Format(format) => (id, format),
            other => {
                let format_id = other
                    .format_ref()
                    .ok_or_else(|| ResourceLookupError::NotAFormat(id.to_string()))?;
                let format = self
                    .format(format_id)
                    .ok_or_else(|| ResourceLookupError::MissingResource(format_id.to_string()))?;
                (format_id, format)
            }
        };

        let frame_duration = format
            .frame_duration
            .ok_or_else(|| ResourceLookupError::MissingFrameDuration(format_id.to_string()))?;
        let drop_frame = tc_format.is_some_and(|f| f.is_drop_frame());

        FrameRate::from_frame_duration(frame_duration, drop_frame).ok_or_else(|| {
            ResourceLookupError::UnknownFrameRate {
                id: format_id.to_string(),
                frame_duration: frame_duration.to_string(),
            }
        })
    }
}

fn string_attr(node: roxmltree::Node<'_, '_>, attribute: &str) -> Option<String> {
    node.attribute(attribute).map(str::to_string)
}

fn u32_attr(node: roxmltree::Node<'_, '_>, attribute: &str) -> Option<u32> {
    node.attribute(attribute).and_then(|v| v.trim().parse().ok())
}

fn read_format(node: roxmltree::Node<'_, '_>) -> FormatResource {
    let frame_duration = match time_attr(node, "frameDuration") {
        Ok(value) => value,
        Err(malformed) => {
            tracing::warn!("Format {:?}: {}", node.attribute("id"), malformed);
            None
        }
    };
    FormatResource {
        name: string_attr(node, "name"),
        frame_duration,
        width: u32_attr(node, "width"),
        height: u32_attr(node, "height"),
        color_space: string_attr(node, "colorSpace"),
    }
}

fn read_asset(node: roxmltree::Node<'_, '_>) -> AssetResource {
    let src = node
        .children()
        .find(|n| n.has_tag_name("media-rep"))
        .and_then(|rep| rep.attribute("src"))
        .or_else(|| node.attribute("src"))
        .map(str::to_string);

    AssetResource {
        name: string_attr(node, "name"),
        uid: string_attr(node, "uid"),
        has_video: flag(node, "hasVideo"),
        has_audio: flag(node, "hasAudio"),
        format: string_attr(node, "format"),
        start: time_attr(node, "start").ok().flatten(),
        duration: time_attr(node, "duration").ok().flatten(),
        audio_sources: u32_attr(node, "audioSources"),
        audio_channels: u32_attr(node, "audioChannels"),
        audio_rate: string_attr(node, "audioRate"),
        src,
    }
}

fn read_media(node: roxmltree::Node<'_, '_>) -> MediaResource {
    let inner = node
        .children()
        .find(|n| n.has_tag_name("sequence") || n.has_tag_name("multicam"));

    MediaResource {
        name: string_attr(node, "name"),
        uid: string_attr(node, "uid"),
        format: inner.and_then(|n| string_attr(n, "format")),
        tc_start: inner.and_then(|n| time_attr(n, "tcStart").ok().flatten()),
        tc_format: inner.and_then(tc_format),
        multicam: inner.is_some_and(|n| n.has_tag_name("multicam")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESOURCES: &str = r#"<resources>
        <format id="r1" name="FFVideoFormat1080p2997" frameDuration="1001/30000s" width="1920" height="1080" colorSpace="1-1-1 (Rec. 709)"/>
        <format id="r2" frameDuration="1/25s"/>
        <format id="r3"/>
        <format id="r4" frameDuration="1/13s"/>
        <asset id="a1" name="Interview" hasVideo="1" hasAudio="1" format="r1" start="0s" duration="60s" audioSources="1" audioChannels="2" audioRate="48000">
            <media-rep kind="original-media" src="file:///media/interview.mov"/>
        </asset>
        <media id="m1" name="Compound">
            <sequence format="r2" tcStart="3600s" tcFormat="NDF"><spine/></sequence>
        </media>
        <effect id="e1" name="Basic Title" uid=".../Basic Title.moti"/>
        <locator id="l1" url="file:///tracking.data"/>
        <object-tracker id="t1">
            <tracking-shape id="ts1" name="Face" offsetEnabled="1" analysisMethod="Machine Learning"/>
        </object-tracker>
        <shape-tracker id="x1"/>
        <format id="r1" frameDuration="1/24s"/>
    </resources>"#;

    fn table() -> ResourceTable {
        let doc = roxmltree::Document::parse(RESOURCES).unwrap();
        ResourceTable::build(doc.root_element())
    }

    #[test]
    fn builds_all_kinds() {
        let table = table();
        assert_eq!(table.get("r1").unwrap().kind(), ResourceKind::Format);
        assert_eq!(table.get("a1").unwrap().kind(), ResourceKind::Asset);
        assert_eq!(table.get("m1").unwrap().kind(), ResourceKind::Media);
        assert_eq!(table.get("e1").unwrap().kind(), ResourceKind::Effect);
        assert_eq!(table.get("l1").unwrap().kind(), ResourceKind::Locator);
        assert_eq!(table.get("t1").unwrap().kind(), ResourceKind::ObjectTracker);
        assert_eq!(table.get("ts1").unwrap().kind(), ResourceKind::TrackingShape);
        assert!(table.get("x1").is_none());
    }

    #[test]
    fn asset_fields() {
        let table = table();
        let asset = table.asset("a1").unwrap();
        assert_eq!(asset.has_video, Some(true));
        assert_eq!(asset.audio_channels, Some(2));
        assert_eq!(asset.duration, Some(Fraction::from_seconds(60)));
        assert_eq!(asset.src.as_deref(), Some("file:///media/interview.mov"));

        let media = table.media("m1").unwrap();
        assert_eq!(media.format.as_deref(), Some("r2"));
        assert_eq!(media.tc_start, Some(Fraction::from_seconds(3600)));
        assert_eq!(media.tc_format, Some(TimecodeFormat::NonDropFrame));
    }

    #[test]
    fn unknown_and_duplicate_are_diagnosed() {
        let table = table();
        let reasons: Vec<_> = table.diagnostics().iter().map(|d| &d.reason).collect();
        assert!(reasons.contains(&&DiagnosticReason::UnknownResource));
        assert!(reasons.contains(&&DiagnosticReason::DuplicateResourceId {
            id: "r1".to_string()
        }));
        // First definition wins
        assert_eq!(
            table.format("r1").unwrap().frame_duration,
            Some(Fraction::new(1001, 30000).unwrap())
        );
    }

    #[test]
    fn frame_rate_lookup() {
        let table = table();
        assert_eq!(table.frame_rate("r1", None), Ok(FrameRate::Fps29_97));
        assert_eq!(
            table.frame_rate("r1", Some(TimecodeFormat::DropFrame)),
            Ok(FrameRate::Fps29_97Drop)
        );
        assert_eq!(table.frame_rate("a1", None), Ok(FrameRate::Fps29_97));
        assert_eq!(
            table.frame_rate("m1", Some(TimecodeFormat::DropFrame)),
            Ok(FrameRate::Fps25)
        );
    }

    #[test]
    fn frame_rate_failures() {
        let table = table();
        assert_eq!(
            table.frame_rate("nope", None),
            Err(ResourceLookupError::MissingResource("nope".to_string()))
        );
        assert_eq!(
            table.frame_rate("e1", None),
            Err(ResourceLookupError::NotAFormat("e1".to_string()))
        );
        assert_eq!(
            table.frame_rate("r3", None),
            Err(ResourceLookupError::MissingFrameDuration("r3".to_string()))
        );
        assert!(matches!(
            table.frame_rate("r4", None),
            Err(ResourceLookupError::UnknownFrameRate { .. })
        ));
    }
}
