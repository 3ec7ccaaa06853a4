use async_trait::async_trait;
use chrono::Utc;
use common::domain::{DomainError, DomainResult, Geofence, GeofenceRepository, PutGeofenceInput};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory geofence collection kept in insertion order
pub struct InMemoryGeofenceRepository {
    geofences: Arc<RwLock<Vec<Geofence>>>,
}

impl InMemoryGeofenceRepository {
    pub fn new() -> Self {
        Self {
            geofences: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryGeofenceRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GeofenceRepository for InMemoryGeofenceRepository {
    async fn list_geofences(&self) -> DomainResult<Vec<Geofence>> {
        let geofences = self.geofences.read().await;
        Ok(geofences.clone())
    }

    async fn put_geofence(&self, input: PutGeofenceInput) -> DomainResult<Geofence> {
        let mut geofences = self.geofences.write().await;
        if geofences.iter().any(|g| g.geofence_id == input.geofence_id) {
            return Err(DomainError::GeofenceAlreadyExists(input.geofence_id));
        }

        let geofence = Geofence {
            geofence_id: input.geofence_id,
            polygon: input.polygon,
            create_time: Some(Utc::now()),
            update_time: None,
        };
        geofences.push(geofence.clone());
        Ok(geofence)
    }

    async fn batch_delete_geofences(&self, geofence_ids: &[String]) -> DomainResult<()> {
        let mut geofences = self.geofences.write().await;
        geofences.retain(|g| !geofence_ids.contains(&g.geofence_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(id: &str) -> PutGeofenceInput {
        PutGeofenceInput {
            geofence_id: id.to_string(),
            polygon: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]],
        }
    }

    #[tokio::test]
    async fn test_put_list_and_delete() {
        let repository = InMemoryGeofenceRepository::new();
        repository.put_geofence(input("A")).await.unwrap();
        repository.put_geofence(input("B")).await.unwrap();
        repository.put_geofence(input("C")).await.unwrap();

        repository
            .batch_delete_geofences(&["B".to_string(), "missing".to_string()])
            .await
            .unwrap();

        let ids: Vec<String> = repository
            .list_geofences()
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.geofence_id)
            .collect();
        assert_eq!(ids, vec!["A", "C"]);
    }

    #[tokio::test]
    async fn test_duplicate_id_conflicts() {
        let repository = InMemoryGeofenceRepository::new();
        repository.put_geofence(input("A")).await.unwrap();

        let result = repository.put_geofence(input("A")).await;

        assert!(matches!(result, Err(DomainError::GeofenceAlreadyExists(id)) if id == "A"));
    }
}
