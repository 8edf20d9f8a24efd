// core/exam_service.rs
use crate::core::resource::{QueryContext, Resource, ResourceHooks};
use crate::models::{ExamSlot, ExamSlotDraft, ExamStudent, ExamStudentDraft, ExamStudentPatch};
use crate::services::cache::ResourceKind;
use crate::utils::error::{ApiError, Result};
use chrono::NaiveDate;
use serde_json::json;
use tracing::debug;

impl Resource for ExamSlot {
    const KIND: ResourceKind = ResourceKind::ExamSlot;
    const ENDPOINT: &'static str = "/ExamSlot";
    const LABEL: &'static str = "le créneau";
    const CREATED: &'static str = "Créneau créé";
    const UPDATED: &'static str = "Créneau modifié";
    const DELETED: &'static str = "Créneau supprimé";

    fn id(&self) -> i64 {
        self.id
    }
}

impl Resource for ExamStudent {
    const KIND: ResourceKind = ResourceKind::ExamStudent;
    const ENDPOINT: &'static str = "/ExamStudent";
    const LABEL: &'static str = "la participation";
    const CREATED: &'static str = "Candidat ajouté au créneau";
    const UPDATED: &'static str = "Résultat mis à jour";
    const DELETED: &'static str = "Candidat retiré du créneau";

    fn id(&self) -> i64 {
        self.id
    }
}

/// Créneaux d'examen
#[derive(Clone)]
pub struct ExamSlotService {
    hooks: ResourceHooks<ExamSlot>,
    default_wilaya: String,
    default_center: String,
}

impl ExamSlotService {
    pub fn new(ctx: QueryContext, default_wilaya: impl Into<String>, default_center: impl Into<String>) -> Self {
        Self {
            hooks: ResourceHooks::new(ctx),
            default_wilaya: default_wilaya.into(),
            default_center: default_center.into(),
        }
    }

    /// Créneaux d'un mois (`YYYY-MM`), ou tous
    pub async fn list(&self, month: Option<&str>) -> Result<Vec<ExamSlot>> {
        let mut params = Vec::new();
        if let Some(month) = month {
            let month = month.trim();
            if NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d").is_err() {
                let error = ApiError::Validation(format!("Mois invalide: {}", month));
                return Err(self.hooks.context().reject(error));
            }
            params.push(("month".to_string(), month.to_string()));
        }
        self.hooks.list(params).await
    }

    pub async fn list_active(&self) -> Result<Vec<ExamSlot>> {
        self.hooks
            .list(vec![("active".to_string(), "true".to_string())])
            .await
    }

    pub async fn get(&self, id: i64) -> Result<ExamSlot> {
        self.hooks.get(id).await
    }

    /// Créer un créneau; wilaya, centre et activité par défaut
    pub async fn create(&self, draft: ExamSlotDraft) -> Result<ExamSlot> {
        let payload = json!({
            "examDate": draft.exam_date.format("%Y-%m-%d").to_string(),
            "wilaya": draft.wilaya.unwrap_or_else(|| self.default_wilaya.clone()),
            "center": draft.center.unwrap_or_else(|| self.default_center.clone()),
            "deadlineList": draft.deadline_list.map(|d| d.format("%Y-%m-%d").to_string()),
            "active": draft.active.unwrap_or(true),
        });
        debug!(payload = %payload, "Création de créneau");
        self.hooks.create(&payload).await
    }
}

/// Participations des candidats aux créneaux
#[derive(Clone)]
pub struct ExamStudentService {
    hooks: ResourceHooks<ExamStudent>,
}

impl ExamStudentService {
    pub fn new(ctx: QueryContext) -> Self {
        Self {
            hooks: ResourceHooks::new(ctx),
        }
    }

    pub async fn list_for_slot(&self, slot_id: i64) -> Result<Vec<ExamStudent>> {
        self.hooks
            .list(vec![("examSlotId".to_string(), slot_id.to_string())])
            .await
    }

    pub async fn list_for_student(&self, student_id: i64) -> Result<Vec<ExamStudent>> {
        self.hooks
            .list(vec![("studentId".to_string(), student_id.to_string())])
            .await
    }

    pub async fn list_all(&self) -> Result<Vec<ExamStudent>> {
        self.hooks.list(Vec::new()).await
    }

    pub async fn create(&self, draft: &ExamStudentDraft) -> Result<ExamStudent> {
        self.hooks.create(draft).await
    }

    pub async fn update(&self, id: i64, patch: &ExamStudentPatch) -> Result<ExamStudent> {
        self.hooks.update(id, patch).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.hooks.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resource::test_support::harness;
    use crate::models::{ExamCategory, ExamResult, ExamStatus};
    use assert_json_diff::assert_json_eq;
    use serde_json::Value;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_create_slot_fills_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ExamSlot"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 8, "examDate": "2026-11-05", "wilaya": "M'Sila", "center": "Magra", "active": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server);
        let service = ExamSlotService::new(
            h.ctx.clone(),
            h.config.default_wilaya.clone(),
            h.config.default_center.clone(),
        );

        let slot = service.create(ExamSlotDraft::on(date(2026, 11, 5))).await.unwrap();
        assert_eq!(slot.exam_date, date(2026, 11, 5));

        let sent = &server.received_requests().await.unwrap()[0];
        let sent: Value = serde_json::from_slice(&sent.body).unwrap();
        assert_json_eq!(
            sent,
            json!({
                "examDate": "2026-11-05",
                "wilaya": "M'Sila",
                "center": "Magra",
                "deadlineList": null,
                "active": true
            })
        );
        assert_eq!(h.notifier.successes(), vec![ExamSlot::CREATED.to_string()]);
    }

    #[tokio::test]
    async fn test_list_by_month_and_active() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ExamSlot"))
            .and(query_param("month", "2026-11"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 8, "examDate": "2026-11-05", "wilaya": "M'Sila", "center": "Magra", "active": true}
            ])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ExamSlot"))
            .and(query_param("active", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [], "totalElements": 0, "totalPages": 0, "page": 0, "size": 20,
                "first": true, "last": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server);
        let service = ExamSlotService::new(h.ctx.clone(), "M'Sila", "Magra");

        assert_eq!(service.list(Some("2026-11")).await.unwrap().len(), 1);
        assert!(service.list_active().await.unwrap().is_empty());
        assert!(matches!(
            service.list(Some("novembre")).await.unwrap_err(),
            ApiError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_participation_mutation_invalidates_dependents() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ExamStudent"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 40, "studentId": 3, "examSlotId": 8, "category": "CODE",
                "status": "PLANNED", "date": "2026-11-05"
            })))
            .mount(&server)
            .await;

        let h = harness(&server);
        let service = ExamStudentService::new(h.ctx.clone());
        let draft = ExamStudentDraft {
            student_id: 3,
            exam_slot_id: 8,
            category: ExamCategory::Code,
            status: ExamStatus::Planned,
            date: date(2026, 11, 5),
        };

        let created = service.create(&draft).await.unwrap();
        assert_eq!(created.exam_slot_id, Some(8));
        for kind in [ResourceKind::ExamStudent, ResourceKind::ExamSlot, ResourceKind::Student] {
            assert_eq!(h.ctx.cache.invalidation_count(kind).await, 1);
        }
        assert_eq!(h.ctx.cache.invalidation_count(ResourceKind::Pricing).await, 0);
    }

    #[tokio::test]
    async fn test_result_update_sends_full_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ExamStudent"))
            .and(query_param("examSlotId", "8"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 40, "studentId": 3, "examSlotId": 8, "category": "CONDUITE",
                "status": "PLANNED", "date": "2026-11-05"
            }])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ExamStudent/40"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 40, "studentId": 3, "examSlotId": 8, "category": "CONDUITE",
                "status": "PLANNED", "date": "2026-11-05"
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/ExamStudent/40"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server);
        let service = ExamStudentService::new(h.ctx.clone());
        assert_eq!(service.list_for_slot(8).await.unwrap().len(), 1);

        let updated = service
            .update(40, &ExamStudentPatch::result(ExamResult::Fail))
            .await
            .unwrap();
        assert_eq!(updated.status, ExamStatus::Passed);
        assert_eq!(updated.result, Some(ExamResult::Fail));
        assert_eq!(updated.category, ExamCategory::Conduite);

        let requests = server.received_requests().await.unwrap();
        let put = requests.iter().find(|r| r.method == wiremock::http::Method::Put).unwrap();
        let sent: Value = serde_json::from_slice(&put.body).unwrap();
        assert_json_eq!(
            sent,
            json!({
                "id": 40, "studentId": 3, "examSlotId": 8, "category": "CONDUITE",
                "status": "PASSED", "result": "FAIL", "date": "2026-11-05"
            })
        );
        assert_eq!(h.notifier.successes(), vec![ExamStudent::UPDATED.to_string()]);
    }
}
