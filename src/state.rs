// state.rs
use crate::core::{
    AuthService, CandidatService, ExamAssignmentWorkflow, ExamSlotService, ExamStudentService,
    FilterController, FinanceService, InstructorService, PricingService, QueryContext,
};
use crate::services::{
    CredentialStore, HttpClient, Navigator, Notifier, QueryCache, SessionHandle,
};
use crate::utils::config::ClientConfig;
use crate::utils::error::Result;
use std::sync::Arc;
use tracing::info;

/// État de l'application: une session, un cache et un client HTTP partagés par tous
/// les services.
#[derive(Clone)]
pub struct AppState {
    pub config: ClientConfig,
    pub session: SessionHandle,
    pub cache: QueryCache,
    pub auth: AuthService,
    pub candidats: CandidatService,
    pub exam_slots: ExamSlotService,
    pub exam_students: ExamStudentService,
    pub instructors: InstructorService,
    pub pricing: PricingService,
    pub finance: FinanceService,
    pub assignments: ExamAssignmentWorkflow,
}

impl AppState {
    pub fn new(
        config: ClientConfig,
        store: CredentialStore,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        config.validate()?;

        let session = SessionHandle::new(store);
        let http = HttpClient::new(&config, session.clone(), navigator)?;
        let cache = QueryCache::new(config.stale_time());
        let ctx = QueryContext::new(
            http.clone(),
            cache.clone(),
            notifier,
            config.read_retries,
            config.read_retry_delay(),
        );

        let auth = AuthService::new(http, cache.clone());
        let state = auth.initialize();
        info!(
            api_url = %config.api_url,
            authenticated = state.is_authenticated,
            "État de l'application initialisé"
        );

        let candidats = CandidatService::new(ctx.clone());
        let exam_slots = ExamSlotService::new(
            ctx.clone(),
            config.default_wilaya.clone(),
            config.default_center.clone(),
        );
        let exam_students = ExamStudentService::new(ctx.clone());
        let assignments = ExamAssignmentWorkflow::new(
            candidats.clone(),
            exam_slots.clone(),
            exam_students.clone(),
        );

        Ok(Self {
            session,
            cache,
            auth,
            candidats,
            exam_slots,
            exam_students,
            instructors: InstructorService::new(ctx.clone()),
            pricing: PricingService::new(ctx.clone()),
            finance: FinanceService::new(ctx),
            assignments,
            config,
        })
    }

    /// Stockage des identifiants sur disque (`CREDENTIALS_PATH`)
    pub fn credential_store(config: &ClientConfig) -> CredentialStore {
        CredentialStore::file(&config.credentials_path)
    }

    /// Contrôleur de filtres de la liste des candidats
    pub fn candidate_filters(&self) -> FilterController {
        FilterController::new(self.config.default_page_size, self.config.filter_debounce())
    }
}
