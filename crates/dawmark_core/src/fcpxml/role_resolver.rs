//! Role resolution over an ancestor chain.
//!
//! Each element kind maps to one `RoleRule` describing where its own roles
//! come from and which built-in defaults apply. `AncestorRoles` collects one
//! layer per recognised element from the outermost ancestor down to the
//! target; flattening picks one effective role per classification.

use serde::Serialize;

use super::breadcrumbs::breadcrumbs;
use super::diagnostics::{Diagnostic, DiagnosticReason};
use super::element_type::{AnnotationType, ClipType, ElementType, StoryElementType};
use super::resources::ResourceTable;
use super::roles::{InterpolatedRole, Role, RoleType};

/// Where an element's own roles come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalRoleSource {
    /// No roles of its own.
    None,
    /// `audioRole`/`videoRole` attributes. Active, time-unscoped sub-role
    /// children replace the audio roles.
    ClipAttributes,
    /// As `ClipAttributes`, falling back to the first content child.
    ClipAttributesOrFirstChild,
    /// Roles of the first content child in document order.
    FirstContentChild,
    /// A single `role` attribute of one classification.
    RoleAttribute(RoleType),
}

/// Built-in roles applied when the element has none of that classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultRoles {
    None,
    /// Derived from the referenced asset's `hasVideo`/`hasAudio`.
    FromAsset,
    Fixed(RoleType, &'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleRule {
    pub local: LocalRoleSource,
    pub defaults: DefaultRoles,
}

/// Role extraction rule for an element kind.
pub fn role_rule(element_type: ElementType) -> RoleRule {
    use DefaultRoles as D;
    use LocalRoleSource as L;

    let rule = |local, defaults| RoleRule { local, defaults };

    let Some(clip) = element_type.clip_type() else {
        return match element_type {
            ElementType::Story(StoryElementType::Annotation(AnnotationType::Caption)) => {
                rule(L::RoleAttribute(RoleType::Caption), D::None)
            }
            _ => rule(L::None, D::None),
        };
    };

    match clip {
        ClipType::AssetClip => rule(L::ClipAttributes, D::FromAsset),
        ClipType::RefClip => rule(L::ClipAttributes, D::Fixed(RoleType::Video, "Video")),
        ClipType::SyncClip | ClipType::McClip | ClipType::Clip => {
            rule(L::ClipAttributesOrFirstChild, D::None)
        }
        ClipType::Audition => rule(L::FirstContentChild, D::None),
        ClipType::Audio => rule(
            L::RoleAttribute(RoleType::Audio),
            D::Fixed(RoleType::Audio, "Dialogue"),
        ),
        ClipType::Video => rule(
            L::RoleAttribute(RoleType::Video),
            D::Fixed(RoleType::Video, "Video"),
        ),
        ClipType::Title => rule(
            L::RoleAttribute(RoleType::Video),
            D::Fixed(RoleType::Video, "Titles"),
        ),
        ClipType::LiveDrawing => rule(
            L::RoleAttribute(RoleType::Video),
            D::Fixed(RoleType::Video, "Video"),
        ),
        ClipType::Gap => rule(L::None, D::None),
    }
}

/// Roles contributed by one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleLayer {
    pub element_type: ElementType,
    /// `Assigned` and `Defaulted` roles, at most one used per classification.
    pub roles: Vec<InterpolatedRole>,
}

/// Effective roles, one per classification.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FlattenedRoles {
    pub audio: Option<Role>,
    pub video: Option<Role>,
    pub caption: Option<Role>,
}

/// Role layers from the outermost ancestor to the target.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AncestorRoles {
    pub layers: Vec<RoleLayer>,
    /// Whether the last layer is the target itself.
    pub ends_at_target: bool,
}

impl AncestorRoles {
    /// One effective role per classification, with provenance.
    ///
    /// Walking outermost to innermost, a closer role replaces a further one,
    /// except that a default never replaces an assigned role seen earlier.
    /// Roles from strict ancestors come out tagged `Inherited`.
    pub fn flattened_interpolated_roles(&self) -> Vec<InterpolatedRole> {
        let last = self.layers.len().saturating_sub(1);

        RoleType::ALL
            .iter()
            .filter_map(|role_type| {
                let mut current: Option<InterpolatedRole> = None;
                let mut seen_assigned = false;

                for (index, layer) in self.layers.iter().enumerate() {
                    let Some(found) = layer.roles.iter().find(|r| r.role_type() == *role_type)
                    else {
                        continue;
                    };
                    if found.is_defaulted() {
                        if seen_assigned {
                            continue;
                        }
                    } else {
                        seen_assigned = true;
                    }
                    current = Some(if self.ends_at_target && index == last {
                        found.clone()
                    } else {
                        found.inherited()
                    });
                }
                current
            })
            .collect()
    }

    /// One effective role per classification.
    pub fn flattened_roles(&self) -> FlattenedRoles {
        let mut flattened = FlattenedRoles::default();
        for role in self.flattened_interpolated_roles() {
            let role = role.into_role();
            match role.role_type() {
                RoleType::Audio => flattened.audio = Some(role),
                RoleType::Video => flattened.video = Some(role),
                RoleType::Caption => flattened.caption = Some(role),
            }
        }
        flattened
    }
}

/// Sub-role override children.
const SUB_ROLE_TAGS: [&str; 2] = ["audio-channel-source", "audio-role-source"];
/// Containers that hold sub-role children of sync and multicam clips.
const SOURCE_TAGS: [&str; 2] = ["sync-source", "mc-source"];

/// Builds role layers against one document's resources.
#[derive(Debug, Clone, Copy)]
pub struct RoleResolver<'r> {
    resources: &'r ResourceTable,
}

impl<'r> RoleResolver<'r> {
    pub fn new(resources: &'r ResourceTable) -> Self {
        Self { resources }
    }

    /// Role layers for `target`, logging malformed role attributes.
    pub fn ancestor_roles(&self, target: roxmltree::Node<'_, '_>) -> AncestorRoles {
        let mut diagnostics = Vec::new();
        let roles = self.ancestor_roles_collecting(target, &mut diagnostics);
        for diagnostic in &diagnostics {
            tracing::warn!("{}", diagnostic);
        }
        roles
    }

    /// Role layers for `target`, appending malformed-role diagnostics.
    pub fn ancestor_roles_collecting(
        &self,
        target: roxmltree::Node<'_, '_>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> AncestorRoles {
        let mut layers: Vec<RoleLayer> = breadcrumbs(target)
            .iter()
            .filter_map(|crumb| {
                let element_type = crumb.element_type?;
                Some(RoleLayer {
                    element_type,
                    roles: self.layer_roles(crumb.node, element_type, diagnostics),
                })
            })
            .collect();

        let target_type = ElementType::of(target);
        if let Some(element_type) = target_type {
            layers.push(RoleLayer {
                element_type,
                roles: self.layer_roles(target, element_type, diagnostics),
            });
        }

        AncestorRoles {
            layers,
            ends_at_target: target_type.is_some(),
        }
    }

    /// Local roles followed by defaults for classifications not covered.
    fn layer_roles(
        &self,
        node: roxmltree::Node<'_, '_>,
        element_type: ElementType,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<InterpolatedRole> {
        let rule = role_rule(element_type);
        let mut roles = self.local_roles(node, rule.local, diagnostics);

        for default in self.default_roles(node, rule.defaults) {
            if !roles.iter().any(|r| r.role_type() == default.role_type()) {
                roles.push(InterpolatedRole::Defaulted(default));
            }
        }
        roles
    }

    fn local_roles(
        &self,
        node: roxmltree::Node<'_, '_>,
        source: LocalRoleSource,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<InterpolatedRole> {
        match source {
            LocalRoleSource::None => Vec::new(),
            LocalRoleSource::ClipAttributes => clip_attribute_roles(node, diagnostics),
            LocalRoleSource::ClipAttributesOrFirstChild => {
                let roles = clip_attribute_roles(node, diagnostics);
                if roles.is_empty() {
                    self.first_content_child_roles(node, diagnostics)
                } else {
                    roles
                }
            }
            LocalRoleSource::FirstContentChild => {
                self.first_content_child_roles(node, diagnostics)
            }
            LocalRoleSource::RoleAttribute(role_type) => {
                parse_role_attribute(node, "role", role_type, diagnostics)
                    .map(InterpolatedRole::Assigned)
                    .into_iter()
                    .collect()
            }
        }
    }

    /// Full layer roles of the first clip-kind child, looking through spines.
    fn first_content_child_roles(
        &self,
        node: roxmltree::Node<'_, '_>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<InterpolatedRole> {
        for child in node.children() {
            match ElementType::of(child) {
                Some(t) if t.is_clip() => return self.layer_roles(child, t, diagnostics),
                Some(t) if t.is_spine() => {
                    return self.first_content_child_roles(child, diagnostics);
                }
                _ => {}
            }
        }
        Vec::new()
    }

    fn default_roles(&self, node: roxmltree::Node<'_, '_>, defaults: DefaultRoles) -> Vec<Role> {
        match defaults {
            DefaultRoles::None => Vec::new(),
            DefaultRoles::Fixed(role_type, name) => vec![Role::built_in(role_type, name)],
            DefaultRoles::FromAsset => {
                let asset = node.attribute("ref").and_then(|id| self.resources.asset(id));
                let has_video = asset.and_then(|a| a.has_video).unwrap_or(true);
                let has_audio = asset.and_then(|a| a.has_audio).unwrap_or(false);

                let mut roles = Vec::new();
                if has_video {
                    roles.push(Role::built_in(RoleType::Video, "Video"));
                }
                if has_audio {
                    roles.push(Role::built_in(RoleType::Audio, "Dialogue"));
                }
                roles
            }
        }
    }
}

/// `audioRole`/`videoRole`, with sub-role children replacing the audio roles.
fn clip_attribute_roles(
    node: roxmltree::Node<'_, '_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<InterpolatedRole> {
    let sub_roles = sub_role_children(node, diagnostics);

    let mut roles = Vec::new();
    if sub_roles.is_empty() {
        roles.extend(parse_role_attribute(node, "audioRole", RoleType::Audio, diagnostics));
    } else {
        roles.extend(sub_roles);
    }
    roles.extend(parse_role_attribute(node, "videoRole", RoleType::Video, diagnostics));

    roles.into_iter().map(InterpolatedRole::Assigned).collect()
}

/// Roles of active sub-role children that are not time-scoped.
fn sub_role_children(node: roxmltree::Node<'_, '_>, diagnostics: &mut Vec<Diagnostic>) -> Vec<Role> {
    let direct = node.children().filter(|n| n.is_element());
    let nested = node
        .children()
        .filter(|n| SOURCE_TAGS.iter().any(|tag| n.has_tag_name(*tag)))
        .flat_map(|source| source.children().filter(|n| n.is_element()));

    direct
        .chain(nested)
        .filter(|n| SUB_ROLE_TAGS.iter().any(|tag| n.has_tag_name(*tag)))
        .filter(|n| n.attribute("active") != Some("0"))
        .filter(|n| n.attribute("start").is_none() && n.attribute("duration").is_none())
        .filter_map(|n| parse_role_attribute(n, "role", RoleType::Audio, diagnostics))
        .collect()
}

fn parse_role_attribute(
    node: roxmltree::Node<'_, '_>,
    attribute: &'static str,
    role_type: RoleType,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<Role> {
    let value = node.attribute(attribute)?;
    let role = Role::parse(role_type, value);
    if role.is_none() {
        diagnostics.push(Diagnostic::new(
            node,
            DiagnosticReason::MalformedRole {
                attribute,
                value: value.to_string(),
            },
        ));
    }
    role
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fcpxml::element_type::StructureElementType;

    const RESOURCES: &str = r#"<resources>
        <format id="r1" frameDuration="1/24s"/>
        <asset id="av" hasVideo="1" hasAudio="1" format="r1"/>
        <asset id="audio-only" hasVideo="0" hasAudio="1"/>
    </resources>"#;

    fn with_target<F>(story: &str, tag: &str, f: F)
    where
        F: FnOnce(AncestorRoles, Vec<Diagnostic>),
    {
        let xml = format!(
            r#"<fcpxml>{RESOURCES}<library><event><project><sequence format="r1"><spine>{story}</spine></sequence></project></event></library></fcpxml>"#
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let resources = ResourceTable::build(
            doc.descendants().find(|n| n.has_tag_name("resources")).unwrap(),
        );
        let target = doc.descendants().find(|n| n.has_tag_name(tag)).unwrap();
        let mut diagnostics = Vec::new();
        let roles =
            RoleResolver::new(&resources).ancestor_roles_collecting(target, &mut diagnostics);
        f(roles, diagnostics);
    }

    fn video(name: &str) -> Role {
        Role::video(name).unwrap()
    }

    fn audio(name: &str) -> Role {
        Role::audio(name).unwrap()
    }

    fn layer(element_type: ElementType, roles: Vec<InterpolatedRole>) -> RoleLayer {
        RoleLayer {
            element_type,
            roles,
        }
    }

    #[test]
    fn dispatch_table() {
        let rule = role_rule(ElementType::from_tag("audio").unwrap());
        assert_eq!(rule.local, LocalRoleSource::RoleAttribute(RoleType::Audio));
        assert_eq!(rule.defaults, DefaultRoles::Fixed(RoleType::Audio, "Dialogue"));

        let rule = role_rule(ElementType::from_tag("gap").unwrap());
        assert_eq!(rule, RoleRule { local: LocalRoleSource::None, defaults: DefaultRoles::None });

        let rule = role_rule(ElementType::from_tag("marker").unwrap());
        assert_eq!(rule.local, LocalRoleSource::None);

        let rule = role_rule(ElementType::from_tag("caption").unwrap());
        assert_eq!(rule.local, LocalRoleSource::RoleAttribute(RoleType::Caption));
    }

    #[test]
    fn assigned_default_does_not_override() {
        let root = ElementType::Structure(StructureElementType::Root);
        let clip = ElementType::from_tag("clip").unwrap();
        let marker = ElementType::from_tag("marker").unwrap();

        let roles = AncestorRoles {
            layers: vec![
                layer(root, vec![InterpolatedRole::Defaulted(video("Video"))]),
                layer(clip, vec![InterpolatedRole::Assigned(video("Titles"))]),
                layer(clip, vec![InterpolatedRole::Defaulted(video("B-Roll"))]),
                layer(marker, vec![]),
            ],
            ends_at_target: true,
        };
        assert_eq!(
            roles.flattened_interpolated_roles(),
            vec![InterpolatedRole::Inherited(video("Titles"))]
        );
        assert_eq!(roles.flattened_roles().video, Some(video("Titles")));
    }

    #[test]
    fn closer_assignment_replaces_outer() {
        let clip = ElementType::from_tag("clip").unwrap();
        let title = ElementType::from_tag("title").unwrap();
        let roles = AncestorRoles {
            layers: vec![
                layer(clip, vec![InterpolatedRole::Assigned(video("Outer"))]),
                layer(title, vec![InterpolatedRole::Assigned(video("Inner"))]),
            ],
            ends_at_target: true,
        };
        assert_eq!(
            roles.flattened_interpolated_roles(),
            vec![InterpolatedRole::Assigned(video("Inner"))]
        );
    }

    #[test]
    fn flattening_is_idempotent() {
        let clip = ElementType::from_tag("asset-clip").unwrap();
        let title = ElementType::from_tag("title").unwrap();
        let roles = AncestorRoles {
            layers: vec![
                layer(
                    clip,
                    vec![
                        InterpolatedRole::Assigned(audio("Music")),
                        InterpolatedRole::Defaulted(video("Video")),
                    ],
                ),
                layer(title, vec![InterpolatedRole::Defaulted(video("Titles"))]),
            ],
            ends_at_target: true,
        };
        let first = roles.flattened_interpolated_roles();
        assert_eq!(first, roles.flattened_interpolated_roles());

        let reflattened = AncestorRoles {
            layers: vec![layer(title, first.clone())],
            ends_at_target: true,
        };
        assert_eq!(reflattened.flattened_interpolated_roles(), first);
    }

    #[test]
    fn asset_clip_roles_and_defaults() {
        with_target(
            r#"<asset-clip ref="av" offset="0s" audioRole="dialogue.boom"/>"#,
            "asset-clip",
            |roles, diagnostics| {
                assert!(diagnostics.is_empty());
                assert_eq!(
                    roles.flattened_interpolated_roles(),
                    vec![
                        InterpolatedRole::Assigned(audio("Dialogue.boom")),
                        InterpolatedRole::Defaulted(video("Video")),
                    ]
                );
            },
        );
        with_target(
            r#"<asset-clip ref="audio-only" offset="0s"/>"#,
            "asset-clip",
            |roles, _| {
                let flat = roles.flattened_roles();
                assert_eq!(flat.audio, Some(audio("Dialogue")));
                assert_eq!(flat.video, None);
            },
        );
    }

    #[test]
    fn sub_roles_replace_audio_role() {
        with_target(
            r#"<asset-clip ref="av" offset="0s" audioRole="Music" videoRole="B-Roll">
                <audio-channel-source srcCh="1, 2" role="Effects.Crowd" active="1"/>
                <audio-channel-source srcCh="3" role="Dialogue" active="0"/>
                <audio-channel-source srcCh="4" role="Music" start="1s" duration="2s"/>
            </asset-clip>"#,
            "asset-clip",
            |roles, _| {
                let flat = roles.flattened_roles();
                assert_eq!(flat.audio, Some(audio("Effects.Crowd")));
                assert_eq!(flat.video, Some(video("B-Roll")));
            },
        );
    }

    #[test]
    fn sync_clip_sub_roles_through_sync_source() {
        with_target(
            r#"<sync-clip offset="0s" name="S">
                <spine><asset-clip ref="av" offset="0s"/></spine>
                <sync-source sourceID="storyline">
                    <audio-role-source role="dialogue.dialogue-2"/>
                </sync-source>
            </sync-clip>"#,
            "sync-clip",
            |roles, _| {
                assert_eq!(
                    roles.flattened_roles().audio,
                    Some(audio("Dialogue.Dialogue-2"))
                );
            },
        );
    }

    #[test]
    fn container_uses_first_content_child() {
        with_target(
            r#"<clip offset="0s" name="C">
                <marker start="0s" value="M"/>
                <spine>
                    <title ref="e1" offset="0s" role="Titles.Lower Third"/>
                    <video ref="x" offset="5s" role="Graphics"/>
                </spine>
            </clip>"#,
            "marker",
            |roles, _| {
                assert_eq!(
                    roles.flattened_interpolated_roles(),
                    vec![InterpolatedRole::Inherited(video("Titles.Lower Third"))]
                );
            },
        );
    }

    #[test]
    fn audition_uses_first_pick() {
        with_target(
            r#"<audition offset="0s">
                <audio ref="a" offset="0s" role="Music.Score"/>
                <audio ref="b" offset="0s" role="Music.Temp"/>
            </audition>"#,
            "audition",
            |roles, _| {
                assert_eq!(roles.flattened_roles().audio, Some(audio("Music.Score")));
            },
        );
    }

    #[test]
    fn bare_elements_default() {
        with_target(r#"<audio ref="a" offset="0s"/>"#, "audio", |roles, _| {
            assert_eq!(
                roles.flattened_interpolated_roles(),
                vec![InterpolatedRole::Defaulted(audio("Dialogue"))]
            );
        });
        with_target(r#"<title ref="e" offset="0s"/>"#, "title", |roles, _| {
            assert_eq!(roles.flattened_roles().video, Some(video("Titles")));
        });
    }

    #[test]
    fn caption_role() {
        with_target(
            r#"<clip offset="0s"><caption lane="1" offset="1s" role="iTT?captionFormat=ITT.en"/></clip>"#,
            "caption",
            |roles, _| {
                let flat = roles.flattened_roles();
                assert_eq!(flat.caption, Some(Role::caption("iTT?captionFormat=ITT.en").unwrap()));
            },
        );
    }

    #[test]
    fn malformed_role_is_diagnosed() {
        with_target(r#"<audio ref="a" offset="0s" role=".bad"/>"#, "audio", |roles, diagnostics| {
            assert_eq!(diagnostics.len(), 1);
            assert_eq!(
                diagnostics[0].reason,
                DiagnosticReason::MalformedRole {
                    attribute: "role",
                    value: ".bad".to_string()
                }
            );
            // Falls back to the default rather than failing
            assert_eq!(
                roles.flattened_interpolated_roles(),
                vec![InterpolatedRole::Defaulted(audio("Dialogue"))]
            );
        });
    }
}
