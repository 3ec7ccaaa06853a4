use crate::domain::GeofencePartition;
use common::domain::Geofence;
use serde::Serialize;
use serde_json::{json, Value};

pub const NON_BREACHING_FILL_COLOR: &str = "#FF1B57";
pub const BREACHING_FILL_COLOR: &str = "#2DC9C9";
pub const GEOFENCE_FILL_OPACITY: f64 = 0.4;

/// Fill paint of a polygon layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillStyle {
    #[serde(rename = "fill-color")]
    pub fill_color: String,
    #[serde(rename = "fill-opacity")]
    pub fill_opacity: f64,
}

impl FillStyle {
    pub fn non_breaching() -> Self {
        Self {
            fill_color: NON_BREACHING_FILL_COLOR.to_string(),
            fill_opacity: GEOFENCE_FILL_OPACITY,
        }
    }

    pub fn breaching() -> Self {
        Self {
            fill_color: BREACHING_FILL_COLOR.to_string(),
            fill_opacity: GEOFENCE_FILL_OPACITY,
        }
    }
}

/// One styled polygon layer with its GeoJSON source data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayLayer {
    pub id: String,
    pub paint: FillStyle,
    pub data: Value,
}

/// Both geofence layers as they should currently be drawn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedOverlay {
    pub visible: bool,
    pub non_breaching: OverlayLayer,
    pub breaching: OverlayLayer,
}

impl RenderedOverlay {
    pub fn render(partition: &GeofencePartition, visible: bool) -> Self {
        Self {
            visible,
            non_breaching: OverlayLayer {
                id: "polygons".to_string(),
                paint: FillStyle::non_breaching(),
                data: feature_collection(&partition.non_breaching),
            },
            breaching: OverlayLayer {
                id: "polygonsBreached".to_string(),
                paint: FillStyle::breaching(),
                data: feature_collection(&partition.breaching),
            },
        }
    }

    /// Layers to draw; none when the overlay is hidden
    pub fn visible_layers(&self) -> Vec<&OverlayLayer> {
        if self.visible {
            vec![&self.non_breaching, &self.breaching]
        } else {
            Vec::new()
        }
    }
}

/// GeoJSON FeatureCollection with one Polygon feature per geofence
pub fn feature_collection(geofences: &[Geofence]) -> Value {
    let features: Vec<Value> = geofences
        .iter()
        .map(|geofence| {
            json!({
                "type": "Feature",
                "properties": { "geofenceId": geofence.geofence_id },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [geofence.polygon],
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}
