//! Marker rendering.
//!
//! Each input is rendered independently; a missing input simply yields no
//! marker. Hazard reports whose coordinates do not parse are left out without
//! raising an error.

use std::time::Duration;

use model::{
    hazard::{HazardReport, Severity},
    position::Position,
};
use serde::Serialize;
use utility::id::Id;

/// Image based marker icon, e.g. the engine's stock pin.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageIcon {
    pub icon_url: String,
    pub icon_retina_url: String,
    pub shadow_url: String,
}

/// Colors and assets for every marker type. Passed once to
/// [`MarkerRenderer::new`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct IconSet {
    pub stock: ImageIcon,
    pub self_color: &'static str,
    pub live_color: &'static str,
    pub start_color: &'static str,
    pub end_color: &'static str,
    pub picked_color: &'static str,
    pub next_turn_color: &'static str,
    pub critical_color: &'static str,
    pub moderate_color: &'static str,
    pub ripple_period: Duration,
}

impl Default for IconSet {
    fn default() -> Self {
        Self {
            stock: ImageIcon {
                icon_url: "https://unpkg.com/leaflet@1.9.4/dist/images/marker-icon.png"
                    .to_owned(),
                icon_retina_url:
                    "https://unpkg.com/leaflet@1.9.4/dist/images/marker-icon-2x.png"
                        .to_owned(),
                shadow_url: "https://unpkg.com/leaflet@1.9.4/dist/images/marker-shadow.png"
                    .to_owned(),
            },
            self_color: "#2563eb",
            live_color: "#dc2626",
            start_color: "#16a34a",
            end_color: "#dc2626",
            picked_color: "#7c3aed",
            next_turn_color: "#f59e0b",
            critical_color: "#b91c1c",
            moderate_color: "#d97706",
            ripple_period: Duration::from_millis(1600),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HazardTreatment {
    Critical,
    Moderate,
}

impl From<Severity> for HazardTreatment {
    fn from(severity: Severity) -> Self {
        if severity.is_critical() {
            HazardTreatment::Critical
        } else {
            HazardTreatment::Moderate
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "shape")]
pub enum MarkerIcon {
    Image(ImageIcon),
    PulsingDot {
        color: &'static str,
        ripple_period: Duration,
    },
    Pin {
        color: &'static str,
        label: &'static str,
    },
    TurnIndicator {
        color: &'static str,
    },
    Hazard {
        treatment: HazardTreatment,
        color: &'static str,
        label: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "id")]
pub enum MarkerKind {
    SelfPosition,
    Live,
    Start,
    End,
    Picked,
    NextTurn,
    Hazard(Id<HazardReport>),
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub kind: MarkerKind,
    pub position: Position,
    pub icon: MarkerIcon,
    pub popup: Option<&'static str>,
}

impl Marker {
    /// Only hazard markers open a detail view.
    pub fn is_clickable(&self) -> bool {
        matches!(self.kind, MarkerKind::Hazard(_))
    }
}

/// Inputs of one render pass. Every field is optional.
#[derive(Debug, Clone, Default)]
pub struct MarkerInputs<'a> {
    pub self_position: Option<Position>,
    pub live_position: Option<Position>,
    pub start: Option<Position>,
    pub end: Option<Position>,
    pub picked: Option<Position>,
    pub next_turn: Option<Position>,
    pub hazards: &'a [HazardReport],
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLink {
    pub src: String,
    /// Full resolution asset.
    pub href: String,
}

/// Content shown when a hazard marker is clicked.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardDetail {
    pub id: Id<HazardReport>,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub location: String,
    pub severity_label: String,
    pub date: String,
    pub image: Option<ImageLink>,
}

pub const DATE_FORMAT: &str = "%-d %b %Y";

pub struct MarkerRenderer {
    icons: IconSet,
}

impl MarkerRenderer {
    pub fn new(icons: IconSet) -> Self {
        Self { icons }
    }

    pub fn render(&self, inputs: &MarkerInputs<'_>) -> Vec<Marker> {
        let fixed = [
            (MarkerKind::SelfPosition, inputs.self_position),
            (MarkerKind::Live, inputs.live_position),
            (MarkerKind::Start, inputs.start),
            (MarkerKind::End, inputs.end),
            (MarkerKind::Picked, inputs.picked),
            (MarkerKind::NextTurn, inputs.next_turn),
        ];
        fixed
            .into_iter()
            .filter_map(|(kind, position)| self.fixed(kind, position?))
            .chain(inputs.hazards.iter().filter_map(|report| self.hazard(report)))
            .collect()
    }

    fn fixed(&self, kind: MarkerKind, position: Position) -> Option<Marker> {
        let icons = &self.icons;
        let (icon, popup) = match kind {
            MarkerKind::SelfPosition => (
                MarkerIcon::PulsingDot {
                    color: icons.self_color,
                    ripple_period: icons.ripple_period,
                },
                Some("You are here!"),
            ),
            MarkerKind::Live => (
                MarkerIcon::PulsingDot {
                    color: icons.live_color,
                    ripple_period: icons.ripple_period,
                },
                None,
            ),
            MarkerKind::Start => (
                MarkerIcon::Pin {
                    color: icons.start_color,
                    label: "Start",
                },
                Some("Start"),
            ),
            MarkerKind::End => (
                MarkerIcon::Pin {
                    color: icons.end_color,
                    label: "End",
                },
                Some("Destination"),
            ),
            MarkerKind::Picked => (MarkerIcon::Image(icons.stock.clone()), None),
            MarkerKind::NextTurn => (
                MarkerIcon::TurnIndicator {
                    color: icons.next_turn_color,
                },
                None,
            ),
            MarkerKind::Hazard(_) => return None,
        };
        Some(Marker {
            kind,
            position,
            icon,
            popup,
        })
    }

    /// `None` if the report has no parsable coordinates.
    pub fn hazard(&self, report: &HazardReport) -> Option<Marker> {
        let Some(position) = report.position().valid() else {
            log::debug!(
                "skipping hazard {} with malformed coordinates {:?}",
                report.id,
                report.coordinates
            );
            return None;
        };
        let treatment = HazardTreatment::from(report.rating);
        let color = match treatment {
            HazardTreatment::Critical => self.icons.critical_color,
            HazardTreatment::Moderate => self.icons.moderate_color,
        };
        Some(Marker {
            kind: MarkerKind::Hazard(report.id.clone()),
            position,
            icon: MarkerIcon::Hazard {
                treatment,
                color,
                label: severity_label(report.rating),
            },
            popup: None,
        })
    }

    pub fn hazard_detail(&self, report: &HazardReport) -> HazardDetail {
        HazardDetail {
            id: report.id.clone(),
            title: report.title.clone(),
            description: report
                .description
                .clone()
                .filter(|description| !description.trim().is_empty()),
            category: report.category.clone(),
            location: report.location.clone(),
            severity_label: severity_label(report.rating),
            date: report.created_at.format(DATE_FORMAT).to_string(),
            image: report
                .image_url
                .as_ref()
                .filter(|url| !url.trim().is_empty())
                .map(|url| ImageLink {
                    src: url.clone(),
                    href: url.clone(),
                }),
        }
    }
}

pub fn severity_label(severity: Severity) -> String {
    format!("Severity: {}/5", severity.rating())
}
