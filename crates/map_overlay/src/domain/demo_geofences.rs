use common::domain::PutGeofenceInput;

const WAREHOUSE: [[f64; 2]; 7] = [
    [-122.329736, 47.543216],
    [-122.328513, 47.542365],
    [-122.327278, 47.541601],
    [-122.326672, 47.541613],
    [-122.326415, 47.541739],
    [-122.329429, 47.543460],
    [-122.329736, 47.543216],
];

const WAREHOUSE_VICINITY_NORTH: [[f64; 2]; 4] = [
    [-122.331564, 47.544981],
    [-122.329476, 47.543950],
    [-122.329509, 47.545398],
    [-122.331564, 47.544981],
];

const WAREHOUSE_VICINITY_SOUTH: [[f64; 2]; 4] = [
    [-122.324886, 47.541209],
    [-122.323688, 47.540418],
    [-122.323353, 47.541535],
    [-122.324886, 47.541209],
];

/// Geofences around the warehouse the demo trucks drive past
pub fn demo_geofences() -> Vec<PutGeofenceInput> {
    vec![
        PutGeofenceInput {
            geofence_id: "Warehouse".to_string(),
            polygon: WAREHOUSE.to_vec(),
        },
        PutGeofenceInput {
            geofence_id: "WarehouseVicinity-North".to_string(),
            polygon: WAREHOUSE_VICINITY_NORTH.to_vec(),
        },
        PutGeofenceInput {
            geofence_id: "WarehouseVicinity-South".to_string(),
            polygon: WAREHOUSE_VICINITY_SOUTH.to_vec(),
        },
    ]
}
