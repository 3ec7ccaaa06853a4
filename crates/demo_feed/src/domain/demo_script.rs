use common::domain::PositionSample;
use std::time::Duration;

/// Delay between consecutive demo steps
pub const DEFAULT_DEMO_INTERVAL: Duration = Duration::from_millis(5000);

/// Ordered position samples of one simulated device
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceScript {
    pub device_id: String,
    pub samples: Vec<PositionSample>,
}

impl DeviceScript {
    pub fn new(device_id: impl Into<String>, samples: Vec<PositionSample>) -> Self {
        Self {
            device_id: device_id.into(),
            samples,
        }
    }

    /// Build a script from `(longitude, latitude, partition_key)` steps
    pub fn from_steps(device_id: &str, steps: &[(f64, f64, &str)]) -> Self {
        let samples = steps
            .iter()
            .map(|(longitude, latitude, partition_key)| {
                PositionSample::new(device_id, *longitude, *latitude, *partition_key)
            })
            .collect();
        Self::new(device_id, samples)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

const TRUCK_1_STEPS: [(f64, f64, &str); 8] = [
    (-122.329640, 47.550247, "1"),
    (-122.329608, 47.548651, "2"),
    (-122.329592, 47.546398, "2"),
    (-122.329654, 47.545014, "2"),
    (-122.329586, 47.544046, "3"),
    (-122.328683, 47.543379, "2"),
    (-122.328889, 47.543028, "2"),
    (-122.328417, 47.543341, "2"),
];

const TRUCK_2_STEPS: [(f64, f64, &str); 8] = [
    (-122.322219, 47.545143, "3"),
    (-122.322891, 47.543234, "3"),
    (-122.323321, 47.541726, "2"),
    (-122.323784, 47.540603, "1"),
    (-122.324112, 47.540823, "2"),
    (-122.326810, 47.542322, "3"),
    (-122.327667, 47.542306, "3"),
    (-122.326375, 47.542144, "3"),
];

/// Two trucks driving past the demo warehouse
pub fn demo_scripts() -> Vec<DeviceScript> {
    vec![
        DeviceScript::from_steps("Truck-1", &TRUCK_1_STEPS),
        DeviceScript::from_steps("Truck-2", &TRUCK_2_STEPS),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_scripts_have_eight_steps_per_truck() {
        let scripts = demo_scripts();

        assert_eq!(scripts.len(), 2);
        assert!(scripts.iter().all(|s| s.len() == 8));
        assert!(scripts[0].samples.iter().all(|s| s.device_id == "Truck-1"));
        assert!(scripts[1].samples.iter().all(|s| s.device_id == "Truck-2"));
    }

    #[test]
    fn test_from_steps_keeps_partition_keys() {
        let script = DeviceScript::from_steps("Truck-9", &[(1.0, 2.0, "7"), (3.0, 4.0, "8")]);

        assert_eq!(script.samples[0], PositionSample::new("Truck-9", 1.0, 2.0, "7"));
        assert_eq!(script.samples[1].partition_key, "8");
    }
}
