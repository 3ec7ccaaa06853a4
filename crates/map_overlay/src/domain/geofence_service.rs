use crate::domain::demo_geofences;
use chrono::Utc;
use common::domain::{
    ensure_counter_clockwise, validate_ring, DomainError, DomainResult, Geofence,
    GeofenceRepository, PutGeofenceInput,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Most geofences shown on the map at once
pub const MAX_DISPLAYED_GEOFENCES: usize = 10;

/// The newest geofences plus the size of the whole collection
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayedGeofences {
    pub geofences: Vec<Geofence>,
    pub total: usize,
}

pub struct GeofenceService {
    repository: Arc<dyn GeofenceRepository>,
}

impl GeofenceService {
    pub fn new(repository: Arc<dyn GeofenceRepository>) -> Self {
        Self { repository }
    }

    /// Put the demo geofences that are not in the collection yet.
    /// Returns how many were created.
    #[instrument(skip(self))]
    pub async fn seed_demo_geofences(&self) -> DomainResult<usize> {
        let existing = self.repository.list_geofences().await?;
        let mut created = 0;

        for input in demo_geofences() {
            if existing.iter().any(|g| g.geofence_id == input.geofence_id) {
                continue;
            }

            let geofence_id = input.geofence_id.clone();
            match self.repository.put_geofence(input).await {
                Ok(_) => created += 1,
                Err(DomainError::GeofenceAlreadyExists(_)) => {
                    debug!(geofence_id = %geofence_id, "demo geofence already exists, skipping");
                }
                Err(e) => return Err(e),
            }
        }

        info!(created, "seeded demo geofences");
        Ok(created)
    }

    /// Create a geofence from a drawn polygon.
    ///
    /// The ring is closed and wound counter-clockwise before it is stored.
    /// Without an explicit id one is generated from the current time.
    #[instrument(skip(self, polygon), fields(points = polygon.len()))]
    pub async fn create_geofence(
        &self,
        polygon: Vec<[f64; 2]>,
        geofence_id: Option<String>,
    ) -> DomainResult<Geofence> {
        let ring = ensure_counter_clockwise(validate_ring(polygon)?);
        let geofence_id =
            geofence_id.unwrap_or_else(|| format!("Geofence-{}", Utc::now().timestamp_millis()));

        let geofence = self
            .repository
            .put_geofence(PutGeofenceInput {
                geofence_id,
                polygon: ring,
            })
            .await?;

        info!(geofence_id = %geofence.geofence_id, "created geofence");
        Ok(geofence)
    }

    pub async fn delete_geofences(&self, geofence_ids: &[String]) -> DomainResult<()> {
        if geofence_ids.is_empty() {
            return Ok(());
        }

        self.repository.batch_delete_geofences(geofence_ids).await?;
        info!(count = geofence_ids.len(), "deleted geofences");
        Ok(())
    }

    pub async fn list_geofences(&self) -> DomainResult<Vec<Geofence>> {
        self.repository.list_geofences().await
    }

    /// Newest geofences first, capped at MAX_DISPLAYED_GEOFENCES
    pub async fn list_displayed(&self) -> DomainResult<DisplayedGeofences> {
        let mut geofences = self.repository.list_geofences().await?;
        let total = geofences.len();

        geofences.reverse();
        geofences.truncate(MAX_DISPLAYED_GEOFENCES);

        Ok(DisplayedGeofences { geofences, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::domain::{signed_double_area, MockGeofenceRepository};

    fn geofence(id: &str) -> Geofence {
        Geofence {
            geofence_id: id.to_string(),
            polygon: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]],
            create_time: None,
            update_time: None,
        }
    }

    fn stored(input: PutGeofenceInput) -> Geofence {
        Geofence {
            geofence_id: input.geofence_id,
            polygon: input.polygon,
            create_time: Some(Utc::now()),
            update_time: None,
        }
    }

    #[tokio::test]
    async fn test_seed_skips_existing_demo_geofences() {
        let mut repository = MockGeofenceRepository::new();
        repository
            .expect_list_geofences()
            .times(1)
            .returning(|| Ok(vec![geofence("Warehouse")]));
        repository
            .expect_put_geofence()
            .withf(|input: &PutGeofenceInput| input.geofence_id != "Warehouse")
            .times(2)
            .returning(|input| Ok(stored(input)));

        let service = GeofenceService::new(Arc::new(repository));

        assert_eq!(service.seed_demo_geofences().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_seed_treats_conflict_as_success() {
        let mut repository = MockGeofenceRepository::new();
        repository.expect_list_geofences().returning(|| Ok(Vec::new()));
        repository
            .expect_put_geofence()
            .times(3)
            .returning(|input| Err(DomainError::GeofenceAlreadyExists(input.geofence_id)));

        let service = GeofenceService::new(Arc::new(repository));

        assert_eq!(service.seed_demo_geofences().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_geofence_winds_counter_clockwise_and_names_by_time() {
        let mut repository = MockGeofenceRepository::new();
        repository
            .expect_put_geofence()
            .withf(|input: &PutGeofenceInput| {
                input.geofence_id.starts_with("Geofence-")
                    && signed_double_area(&input.polygon) > 0.0
                    && input.polygon.first() == input.polygon.last()
            })
            .times(1)
            .returning(|input| Ok(stored(input)));

        let service = GeofenceService::new(Arc::new(repository));
        let clockwise = vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]];

        let geofence = service.create_geofence(clockwise, None).await.unwrap();

        let millis: i64 = geofence.geofence_id["Geofence-".len()..].parse().unwrap();
        assert!(millis > 0);
    }

    #[tokio::test]
    async fn test_create_geofence_rejects_degenerate_polygon() {
        let mut repository = MockGeofenceRepository::new();
        repository.expect_put_geofence().never();

        let service = GeofenceService::new(Arc::new(repository));
        let result = service
            .create_geofence(vec![[0.0, 0.0], [1.0, 1.0]], Some("Line".to_string()))
            .await;

        assert!(matches!(result, Err(DomainError::InvalidGeofence(_))));
    }

    #[tokio::test]
    async fn test_delete_empty_list_is_noop() {
        let mut repository = MockGeofenceRepository::new();
        repository.expect_batch_delete_geofences().never();

        let service = GeofenceService::new(Arc::new(repository));

        assert!(service.delete_geofences(&[]).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_displayed_is_newest_first_and_capped() {
        let mut repository = MockGeofenceRepository::new();
        repository.expect_list_geofences().returning(|| {
            Ok((0..12).map(|i| geofence(&format!("G{}", i))).collect())
        });

        let service = GeofenceService::new(Arc::new(repository));
        let displayed = service.list_displayed().await.unwrap();

        assert_eq!(displayed.total, 12);
        assert_eq!(displayed.geofences.len(), MAX_DISPLAYED_GEOFENCES);
        assert_eq!(displayed.geofences[0].geofence_id, "G11");
        assert_eq!(displayed.geofences[9].geofence_id, "G2");
    }
}
