// core/instructor_service.rs
use crate::core::resource::{QueryContext, Resource, ResourceHooks};
use crate::models::{Instructor, InstructorDraft, InstructorPatch};
use crate::services::cache::ResourceKind;
use crate::utils::error::{ApiError, Result};
use crate::utils::validation::{validate_object, validate_phone};

impl Resource for Instructor {
    const KIND: ResourceKind = ResourceKind::Instructor;
    const ENDPOINT: &'static str = "/moniteur";
    const LABEL: &'static str = "le moniteur";
    const CREATED: &'static str = "Moniteur ajouté";
    const UPDATED: &'static str = "Moniteur mis à jour";
    const DELETED: &'static str = "Moniteur supprimé";

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Clone)]
pub struct InstructorService {
    hooks: ResourceHooks<Instructor>,
}

impl InstructorService {
    pub fn new(ctx: QueryContext) -> Self {
        Self {
            hooks: ResourceHooks::new(ctx),
        }
    }

    pub async fn list(&self) -> Result<Vec<Instructor>> {
        self.hooks.list(Vec::new()).await
    }

    pub async fn get(&self, id: i64) -> Result<Instructor> {
        self.hooks.get(id).await
    }

    pub async fn create(&self, draft: InstructorDraft) -> Result<Instructor> {
        if let Err(error) = validate_object(&draft) {
            return Err(self.hooks.context().reject(error));
        }
        self.hooks.create(&draft).await
    }

    pub async fn update(&self, id: i64, patch: &InstructorPatch) -> Result<Instructor> {
        if let Some(phone) = &patch.phone {
            if let Err(e) = validate_phone(phone) {
                let error = ApiError::Validation(format!("phone: {}", e));
                return Err(self.hooks.context().reject(error));
            }
        }
        self.hooks.update(id, patch).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.hooks.delete(id).await
    }
}
