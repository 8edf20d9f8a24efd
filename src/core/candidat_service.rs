// core/candidat_service.rs
use crate::core::filters::ListQuery;
use crate::core::resource::{QueryContext, Resource, ResourceHooks};
use crate::models::{Page, Student, StudentDraft, StudentPatch, StudentStatus};
use crate::services::cache::ResourceKind;
use crate::services::http::ApiRequest;
use crate::utils::error::{ApiError, Result};
use crate::utils::validation::{validate_object, validate_phone, validate_photo_data_uri};
use serde_json::json;
use tracing::info;

impl Resource for Student {
    const KIND: ResourceKind = ResourceKind::Student;
    const ENDPOINT: &'static str = "/Student";
    const LABEL: &'static str = "le candidat";
    const CREATED: &'static str = "Candidat créé avec succès";
    const UPDATED: &'static str = "Candidat mis à jour";
    const DELETED: &'static str = "Candidat supprimé";

    fn id(&self) -> i64 {
        self.id
    }
}

pub const PHOTO_UPLOADED: &str = "Photo uploadée";

#[derive(Clone)]
pub struct CandidatService {
    hooks: ResourceHooks<Student>,
}

impl CandidatService {
    pub fn new(ctx: QueryContext) -> Self {
        Self {
            hooks: ResourceHooks::new(ctx),
        }
    }

    /// Page de candidats pour les filtres courants
    pub async fn list(&self, query: &ListQuery) -> Result<Page<Student>> {
        self.hooks.list_page(query.to_params()?).await
    }

    /// Tous les candidats d'un statut, sans pagination
    pub async fn list_by_status(&self, status: StudentStatus) -> Result<Vec<Student>> {
        self.hooks
            .list(vec![("status".to_string(), status.as_str().to_string())])
            .await
    }

    pub async fn get(&self, id: i64) -> Result<Student> {
        self.hooks.get(id).await
    }

    /// Créer un candidat après nettoyage et validation locale
    pub async fn create(&self, draft: StudentDraft) -> Result<Student> {
        let draft = draft.sanitized();
        if let Err(error) = validate_object(&draft) {
            return Err(self.hooks.context().reject(error));
        }

        let created = self.hooks.create(&draft).await?;
        info!(student_id = created.id, "Candidat créé");
        Ok(created)
    }

    pub async fn update(&self, id: i64, patch: &StudentPatch) -> Result<Student> {
        if let Err(e) = validate_patch(patch) {
            return Err(self.hooks.context().reject(e));
        }
        self.hooks.update(id, patch).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.hooks.delete(id).await
    }

    /// Envoyer la photo (data URI) d'un candidat
    pub async fn upload_photo(&self, id: i64, photo_base64: &str) -> Result<Option<Student>> {
        let ctx = self.hooks.context();
        if let Err(e) = validate_photo_data_uri(photo_base64) {
            return Err(ctx.reject(ApiError::Validation(e.to_string())));
        }

        let request = ApiRequest::post(format!("{}/{}/photo", Student::ENDPOINT, id))
            .body(json!({ "photoBase64": photo_base64 }));

        match ctx.http.request_optional::<Student>(&request).await {
            Ok(student) => {
                ctx.cache.invalidate_key(&ResourceHooks::<Student>::item_key(id)).await;
                ctx.notifier.success(PHOTO_UPLOADED);
                Ok(student)
            }
            Err(e) => Err(ctx.reject(e)),
        }
    }
}

fn validate_patch(patch: &StudentPatch) -> Result<()> {
    if let Some(phone) = &patch.phone_number {
        validate_phone(phone).map_err(|e| ApiError::Validation(format!("phoneNumber: {}", e)))?;
    }
    if let Some(name) = &patch.name {
        validate_object(name)?;
    }
    if let Some(address) = &patch.address {
        let len = address.trim().chars().count();
        if !(5..=200).contains(&len) {
            return Err(ApiError::Validation(
                "address: L'adresse doit contenir entre 5 et 200 caractères".to_string(),
            ));
        }
    }
    Ok(())
}
