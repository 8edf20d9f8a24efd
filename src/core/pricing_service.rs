// core/pricing_service.rs
use crate::core::resource::{QueryContext, Resource, ResourceHooks};
use crate::models::{NewPricing, Pricing, PricingCategory, PricingPatch};
use crate::services::cache::ResourceKind;
use crate::utils::error::{ApiError, Result};
use std::collections::BTreeSet;
use tracing::info;

impl Resource for Pricing {
    const KIND: ResourceKind = ResourceKind::Pricing;
    const ENDPOINT: &'static str = "/Pricing";
    const LABEL: &'static str = "la tarification";
    const CREATED: &'static str = "Tarification créée";
    const UPDATED: &'static str = "Tarification enregistrée";
    const DELETED: &'static str = "Tarification supprimée";

    fn id(&self) -> i64 {
        self.id
    }
}

/// Grilles tarifaires, une par catégorie de permis
#[derive(Clone)]
pub struct PricingService {
    hooks: ResourceHooks<Pricing>,
}

impl PricingService {
    pub fn new(ctx: QueryContext) -> Self {
        Self {
            hooks: ResourceHooks::new(ctx),
        }
    }

    pub async fn list(&self) -> Result<Vec<Pricing>> {
        self.hooks.list(Vec::new()).await
    }

    pub async fn get(&self, id: i64) -> Result<Pricing> {
        self.hooks.get(id).await
    }

    /// Catégories sans grille, seules proposées à la création
    pub async fn unconfigured_categories(&self) -> Result<Vec<PricingCategory>> {
        let configured: BTreeSet<PricingCategory> =
            self.list().await?.into_iter().map(|p| p.license_category).collect();

        Ok(PricingCategory::ALL
            .into_iter()
            .filter(|c| !configured.contains(c))
            .collect())
    }

    /// Créer la grille d'une catégorie avec le barème par défaut
    pub async fn create(&self, category: PricingCategory) -> Result<Pricing> {
        if !self.unconfigured_categories().await?.contains(&category) {
            let error = ApiError::Conflict(format!(
                "La catégorie {} possède déjà une tarification",
                category
            ));
            return Err(self.hooks.context().reject(error));
        }

        let created = self.hooks.create(&NewPricing::with_defaults(category)).await?;
        info!(category = %category, pricing_id = created.id, "Tarification créée");
        Ok(created)
    }

    pub async fn update(&self, id: i64, patch: &PricingPatch) -> Result<Pricing> {
        self.hooks.update(id, patch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resource::test_support::harness;
    use serde_json::{json, Value};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pricing(id: i64, category: &str) -> Value {
        json!({
            "id": id, "licenseCategory": category, "baseCourseFee": 30000, "examUnitFee": 2000,
            "stampUnitFee": 300, "active": true, "maxVehicles": 2, "candidatesPerVehicle": 20,
            "billExamOnJustifiedAbsence": false, "billStampOnJustifiedAbsence": false,
            "billExamOnUnjustifiedAbsence": false, "billStampOnUnjustifiedAbsence": true
        })
    }

    #[tokio::test]
    async fn test_create_missing_category_then_list_offers_it_no_more() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Pricing"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([pricing(1, "A"), pricing(2, "B")])),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/Pricing"))
            .and(body_partial_json(json!({
                "licenseCategory": "C",
                "baseCourseFee": 30000,
                "billStampOnUnjustifiedAbsence": true
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(pricing(3, "C")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/Pricing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                pricing(1, "A"),
                pricing(2, "B"),
                pricing(3, "C")
            ])))
            .mount(&server)
            .await;

        let h = harness(&server);
        let service = PricingService::new(h.ctx.clone());

        assert_eq!(
            service.unconfigured_categories().await.unwrap(),
            vec![PricingCategory::C, PricingCategory::D]
        );

        let created = service.create(PricingCategory::C).await.unwrap();
        assert_eq!(created.total_capacity(), 40);

        let listed = service.list().await.unwrap();
        assert_eq!(listed.len(), 3);
        assert!(listed.iter().any(|p| p.license_category == PricingCategory::C));
        assert_eq!(
            service.unconfigured_categories().await.unwrap(),
            vec![PricingCategory::D]
        );
    }

    #[tokio::test]
    async fn test_configured_category_is_rejected_locally() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Pricing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([pricing(2, "B")])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let h = harness(&server);
        let service = PricingService::new(h.ctx.clone());

        let err = service.create(PricingCategory::B).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(h.notifier.errors()[0].code.as_deref(), Some("CONFLICT"));
    }

    #[tokio::test]
    async fn test_update_merges_fee_change() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Pricing/2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(pricing(2, "B")))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/Pricing/2"))
            .and(body_partial_json(json!({"licenseCategory": "B", "examUnitFee": 2500})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server);
        let service = PricingService::new(h.ctx.clone());
        let patch = PricingPatch {
            exam_unit_fee: Some(2500),
            ..Default::default()
        };

        let updated = service.update(2, &patch).await.unwrap();
        assert_eq!(updated.exam_unit_fee, 2500);
        assert_eq!(updated.base_course_fee, 30000);
    }
}
