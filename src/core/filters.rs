// core/filters.rs
use crate::models::{LicenseCategory, StudentFilters, StudentStatus};
use crate::utils::error::Result;
use crate::utils::helpers::to_query_pairs;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Filtres, page et taille de page d'une liste de candidats
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListQuery {
    pub filters: StudentFilters,
    pub page: u32,
    pub page_size: u32,
}

impl ListQuery {
    pub fn new(page_size: u32) -> Self {
        Self {
            filters: StudentFilters::default(),
            page: 0,
            page_size,
        }
    }

    /// Paramètres de requête: filtres renseignés, `page` et `size`
    pub fn to_params(&self) -> Result<Vec<(String, String)>> {
        let mut params = to_query_pairs(&self.filters)?;
        params.push(("page".to_string(), self.page.to_string()));
        params.push(("size".to_string(), self.page_size.to_string()));
        params.sort();
        Ok(params)
    }
}

/// Champs texte soumis à l'anti-rebond
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    FirstName,
    LastName,
    PhoneNumber,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    Text(TextField, String),
    Status(Option<StudentStatus>),
    RequestedLicense(Option<LicenseCategory>),
    Page(u32),
    PageSize(u32),
    Reset,
}

fn normalize_text(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Appliquer un changement; `None` si l'état ne change pas.
///
/// Tout changement de filtre (et de taille de page) ramène à la page 0.
pub fn reduce(current: &ListQuery, change: FilterChange) -> Option<ListQuery> {
    let mut next = current.clone();

    match change {
        FilterChange::Text(field, value) => {
            let slot = match field {
                TextField::FirstName => &mut next.filters.first_name,
                TextField::LastName => &mut next.filters.last_name,
                TextField::PhoneNumber => &mut next.filters.phone_number,
            };
            *slot = normalize_text(&value);
        }
        FilterChange::Status(status) => next.filters.status = status,
        FilterChange::RequestedLicense(category) => next.filters.requested_license = category,
        FilterChange::Page(page) => {
            if page == current.page {
                return None;
            }
            next.page = page;
            return Some(next);
        }
        FilterChange::PageSize(size) => {
            if size == 0 || size == current.page_size {
                return None;
            }
            next.page_size = size;
            next.page = 0;
            return Some(next);
        }
        FilterChange::Reset => {
            next.filters = StudentFilters::default();
            next.page = 0;
            return (next != *current).then_some(next);
        }
    }

    if next.filters == current.filters {
        return None;
    }
    next.page = 0;
    Some(next)
}

/// Onglets de la liste des candidats, dérivés du filtre de statut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateTab {
    All,
    Registered,
    InTraining,
    Licensed,
}

impl CandidateTab {
    pub fn status(&self) -> Option<StudentStatus> {
        match self {
            CandidateTab::All => None,
            CandidateTab::Registered => Some(StudentStatus::Registered),
            CandidateTab::InTraining => Some(StudentStatus::InTraining),
            CandidateTab::Licensed => Some(StudentStatus::Licensed),
        }
    }

    /// Les statuts sans onglet dédié s'affichent sous « Tous »
    pub fn from_status(status: Option<StudentStatus>) -> Self {
        match status {
            Some(StudentStatus::Registered) => CandidateTab::Registered,
            Some(StudentStatus::InTraining) => CandidateTab::InTraining,
            Some(StudentStatus::Licensed) => CandidateTab::Licensed,
            _ => CandidateTab::All,
        }
    }
}

struct ControllerInner {
    sender: watch::Sender<ListQuery>,
    /// Saisie en attente par champ, avec le numéro de frappe qui l'a programmée
    pending: Mutex<HashMap<TextField, (u64, JoinHandle<()>)>>,
    debounce: Duration,
    commits: AtomicU64,
    keystrokes: AtomicU64,
}

impl ControllerInner {
    fn commit(&self, changes: Vec<FilterChange>) -> bool {
        let committed = self.sender.send_if_modified(|query| {
            let mut next = query.clone();
            let mut changed = false;
            for change in changes {
                if let Some(reduced) = reduce(&next, change) {
                    next = reduced;
                    changed = true;
                }
            }
            if changed && next != *query {
                *query = next;
                true
            } else {
                false
            }
        });

        if committed {
            let count = self.commits.fetch_add(1, Ordering::SeqCst) + 1;
            debug!(commits = count, query = ?*self.sender.borrow(), "Filtres appliqués");
        }
        committed
    }

    fn cancel(&self, field: Option<TextField>) {
        if let Ok(mut pending) = self.pending.lock() {
            match field {
                Some(field) => {
                    if let Some((_, handle)) = pending.remove(&field) {
                        handle.abort();
                    }
                }
                None => {
                    for (_, (_, handle)) in pending.drain() {
                        handle.abort();
                    }
                }
            }
        }
    }
}

/// État des filtres d'une liste, publié aux consommateurs par un canal `watch`
#[derive(Clone)]
pub struct FilterController {
    inner: Arc<ControllerInner>,
}

impl FilterController {
    pub fn new(page_size: u32, debounce: Duration) -> Self {
        let (sender, _) = watch::channel(ListQuery::new(page_size));
        Self {
            inner: Arc::new(ControllerInner {
                sender,
                pending: Mutex::new(HashMap::new()),
                debounce,
                commits: AtomicU64::new(0),
                keystrokes: AtomicU64::new(0),
            }),
        }
    }

    pub fn current(&self) -> ListQuery {
        self.inner.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListQuery> {
        self.inner.sender.subscribe()
    }

    /// Nombre de changements effectivement publiés
    pub fn commit_count(&self) -> u64 {
        self.inner.commits.load(Ordering::SeqCst)
    }

    /// Appliquer immédiatement un changement; `false` s'il ne modifie rien
    pub fn apply(&self, change: FilterChange) -> bool {
        self.apply_all(vec![change])
    }

    /// Appliquer plusieurs changements en une seule publication
    pub fn apply_all(&self, changes: Vec<FilterChange>) -> bool {
        for change in &changes {
            match change {
                FilterChange::Text(field, _) => self.inner.cancel(Some(*field)),
                FilterChange::Reset => self.inner.cancel(None),
                _ => {}
            }
        }
        self.inner.commit(changes)
    }

    /// Saisie d'un champ texte: publiée après le délai d'anti-rebond,
    /// chaque frappe annule la précédente pour ce champ
    pub fn type_text(&self, field: TextField, value: impl Into<String>) {
        let value = value.into();
        let keystroke = self.inner.keystrokes.fetch_add(1, Ordering::SeqCst);

        // Verrou tenu jusqu'à l'insertion: la tâche ne peut pas se retirer avant d'être enregistrée
        let Ok(mut pending) = self.inner.pending.lock() else {
            return;
        };
        if let Some((_, previous)) = pending.remove(&field) {
            previous.abort();
        }

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(inner.debounce).await;
            {
                let Ok(mut pending) = inner.pending.lock() else {
                    return;
                };
                // Remplacée par une frappe plus récente
                if !matches!(pending.get(&field), Some((owner, _)) if *owner == keystroke) {
                    return;
                }
                pending.remove(&field);
            }
            inner.commit(vec![FilterChange::Text(field, value)]);
        });
        pending.insert(field, (keystroke, handle));
    }

    pub fn has_pending(&self) -> bool {
        self.inner
            .pending
            .lock()
            .map(|p| !p.is_empty())
            .unwrap_or(false)
    }

    pub fn set_page(&self, page: u32) -> bool {
        self.apply(FilterChange::Page(page))
    }

    pub fn select_tab(&self, tab: CandidateTab) -> bool {
        self.apply(FilterChange::Status(tab.status()))
    }

    pub fn active_tab(&self) -> CandidateTab {
        CandidateTab::from_status(self.current().filters.status)
    }

    pub fn reset(&self) -> bool {
        self.apply(FilterChange::Reset)
    }
}
