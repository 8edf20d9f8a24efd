// services/cache.rs
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Type de ressource servant d'espace de clés au cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ResourceKind {
    Student,
    ExamSlot,
    ExamStudent,
    Instructor,
    Pricing,
    Invoice,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Student,
        ResourceKind::ExamSlot,
        ResourceKind::ExamStudent,
        ResourceKind::Instructor,
        ResourceKind::Pricing,
        ResourceKind::Invoice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Student => "student",
            ResourceKind::ExamSlot => "examSlot",
            ResourceKind::ExamStudent => "examStudent",
            ResourceKind::Instructor => "instructor",
            ResourceKind::Pricing => "pricing",
            ResourceKind::Invoice => "invoice",
        }
    }

    /// Lectures à invalider après une écriture sur ce type.
    ///
    /// Une participation modifie le nombre d'inscrits d'un créneau et peut
    /// changer le statut du candidat; un paiement modifie la liste des candidats.
    pub fn invalidation_set(&self) -> &'static [ResourceKind] {
        match self {
            ResourceKind::ExamStudent => &[
                ResourceKind::ExamStudent,
                ResourceKind::ExamSlot,
                ResourceKind::Student,
            ],
            ResourceKind::Invoice => &[ResourceKind::Invoice, ResourceKind::Student],
            ResourceKind::Student => &[ResourceKind::Student],
            ResourceKind::ExamSlot => &[ResourceKind::ExamSlot],
            ResourceKind::Instructor => &[ResourceKind::Instructor],
            ResourceKind::Pricing => &[ResourceKind::Pricing],
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Portée d'une lecture: une liste paramétrée ou un élément
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Paramètres triés, donc deux appels équivalents partagent l'entrée
    List(Vec<(String, String)>),
    Item(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub kind: ResourceKind,
    pub scope: Scope,
}

impl QueryKey {
    pub fn list(kind: ResourceKind, mut params: Vec<(String, String)>) -> Self {
        params.sort();
        Self {
            kind,
            scope: Scope::List(params),
        }
    }

    pub fn item(kind: ResourceKind, id: i64) -> Self {
        Self {
            kind,
            scope: Scope::Item(id),
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Scope::Item(id) => write!(f, "{}:{}", self.kind, id),
            Scope::List(params) => {
                let params: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                write!(f, "{}?{}", self.kind, params.join("&"))
            }
        }
    }
}

/// Résultat d'une consultation du cache
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Dans la fenêtre de fraîcheur
    Fresh(Value),
    /// Trop ancienne: servie, puis rafraîchie en arrière-plan
    Stale(Value),
    /// Trop ancienne, rafraîchissement déjà programmé
    Refreshing(Value),
    /// Invalidée par une écriture: à recharger avant d'être servie
    Invalidated(Value),
    Miss,
}

impl Lookup {
    pub fn value(&self) -> Option<&Value> {
        match self {
            Lookup::Fresh(v)
            | Lookup::Stale(v)
            | Lookup::Refreshing(v)
            | Lookup::Invalidated(v) => Some(v),
            Lookup::Miss => None,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    fetched_at: Instant,
    invalidated: bool,
    refreshing: bool,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<QueryKey, CacheEntry>,
    generations: HashMap<ResourceKind, u64>,
    invalidations: HashMap<ResourceKind, u64>,
    hits: u64,
    misses: u64,
}

/// Cache des lectures de l'API, indexé par type de ressource et paramètres
#[derive(Debug, Clone)]
pub struct QueryCache {
    inner: Arc<RwLock<CacheInner>>,
    stale_time: Duration,
}

impl QueryCache {
    pub fn new(stale_time: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner::default())),
            stale_time,
        }
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    pub async fn lookup(&self, key: &QueryKey) -> Lookup {
        let stale_time = self.stale_time;
        let mut inner = self.inner.write().await;
        let lookup = match inner.entries.get_mut(key) {
            None => Lookup::Miss,
            Some(entry) if entry.invalidated => Lookup::Invalidated(entry.value.clone()),
            Some(entry) if entry.fetched_at.elapsed() >= stale_time => {
                // Un seul rafraîchissement en vol par clé
                if entry.refreshing {
                    Lookup::Refreshing(entry.value.clone())
                } else {
                    entry.refreshing = true;
                    Lookup::Stale(entry.value.clone())
                }
            }
            Some(entry) => Lookup::Fresh(entry.value.clone()),
        };

        match lookup {
            Lookup::Fresh(_) | Lookup::Stale(_) | Lookup::Refreshing(_) => inner.hits += 1,
            Lookup::Invalidated(_) | Lookup::Miss => inner.misses += 1,
        }
        lookup
    }

    /// Valeur en cache, quel que soit son état
    pub async fn peek(&self, key: &QueryKey) -> Option<Value> {
        self.inner.read().await.entries.get(key).map(|e| e.value.clone())
    }

    /// Génération courante d'un type, à relever avant d'envoyer une lecture
    pub async fn generation(&self, kind: ResourceKind) -> u64 {
        self.inner
            .read()
            .await
            .generations
            .get(&kind)
            .copied()
            .unwrap_or(0)
    }

    /// Enregistrer une réponse.
    ///
    /// Une réponse à une requête partie avant une invalidation de son type est
    /// conservée mais reste invalidée.
    pub async fn store(&self, key: QueryKey, value: Value, started_at_generation: u64) {
        let mut inner = self.inner.write().await;
        let current = inner.generations.get(&key.kind).copied().unwrap_or(0);
        let invalidated = current != started_at_generation;
        if invalidated {
            debug!(key = %key, "Réponse antérieure à une invalidation");
        }
        inner.entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: Instant::now(),
                invalidated,
                refreshing: false,
            },
        );
    }

    /// Lever le marqueur de rafraîchissement après un échec
    pub async fn release_refresh(&self, key: &QueryKey) {
        if let Some(entry) = self.inner.write().await.entries.get_mut(key) {
            entry.refreshing = false;
        }
    }

    /// Invalider toutes les lectures des types donnés, une fois par type
    pub async fn invalidate(&self, kinds: &[ResourceKind]) {
        let kinds: BTreeSet<ResourceKind> = kinds.iter().copied().collect();
        let mut inner = self.inner.write().await;

        for kind in &kinds {
            *inner.generations.entry(*kind).or_insert(0) += 1;
            *inner.invalidations.entry(*kind).or_insert(0) += 1;
        }
        for (key, entry) in inner.entries.iter_mut() {
            if kinds.contains(&key.kind) {
                entry.invalidated = true;
            }
        }
        debug!(kinds = ?kinds, "Cache invalidé");
    }

    /// Invalider une seule entrée
    pub async fn invalidate_key(&self, key: &QueryKey) {
        if let Some(entry) = self.inner.write().await.entries.get_mut(key) {
            entry.invalidated = true;
        }
    }

    pub async fn remove(&self, key: &QueryKey) -> bool {
        self.inner.write().await.entries.remove(key).is_some()
    }

    /// Vider le cache (changement d'utilisateur)
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.entries.clear();
        for kind in ResourceKind::ALL {
            *inner.generations.entry(kind).or_insert(0) += 1;
        }
    }

    /// Nombre d'invalidations subies par un type
    pub async fn invalidation_count(&self, kind: ResourceKind) -> u64 {
        self.inner
            .read()
            .await
            .invalidations
            .get(&kind)
            .copied()
            .unwrap_or(0)
    }

    pub async fn get_stats(&self) -> CacheStats {
        let inner = self.inner.read().await;
        let mut stats = CacheStats {
            entries: inner.entries.len(),
            hits: inner.hits,
            misses: inner.misses,
            invalidations: inner.invalidations.values().sum(),
            hit_rate: 0.0,
        };
        if stats.hits + stats.misses > 0 {
            stats.hit_rate = stats.hits as f64 / (stats.hits + stats.misses) as f64;
        }
        stats
    }
}

/// Statistiques du cache
#[derive(Debug, Default, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
    pub hit_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_equal_params_share_a_key() {
        let a = QueryKey::list(ResourceKind::Student, params(&[("page", "0"), ("lastName", "Benali")]));
        let b = QueryKey::list(ResourceKind::Student, params(&[("lastName", "Benali"), ("page", "0")]));
        assert_eq!(a, b);
        assert_ne!(a, QueryKey::list(ResourceKind::Student, params(&[("page", "1")])));
    }

    #[test]
    fn test_dependency_graph() {
        assert_eq!(
            ResourceKind::ExamStudent.invalidation_set(),
            &[ResourceKind::ExamStudent, ResourceKind::ExamSlot, ResourceKind::Student]
        );
        assert_eq!(ResourceKind::Student.invalidation_set(), &[ResourceKind::Student]);
        assert!(ResourceKind::Invoice.invalidation_set().contains(&ResourceKind::Student));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_goes_stale_after_window() {
        let cache = QueryCache::new(Duration::from_secs(30));
        let key = QueryKey::item(ResourceKind::Student, 1);

        assert_eq!(cache.lookup(&key).await, Lookup::Miss);
        cache.store(key.clone(), json!({"id": 1}), 0).await;
        assert_eq!(cache.lookup(&key).await, Lookup::Fresh(json!({"id": 1})));

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(cache.lookup(&key).await, Lookup::Stale(json!({"id": 1})));

        let stats = cache.get_stats().await;
        assert_eq!((stats.hits, stats.misses, stats.entries), (2, 1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_entry_schedules_a_single_refresh() {
        let cache = QueryCache::new(Duration::from_secs(30));
        let key = QueryKey::list(ResourceKind::Instructor, vec![]);
        cache.store(key.clone(), json!([]), 0).await;

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(cache.lookup(&key).await, Lookup::Stale(json!([])));
        assert_eq!(cache.lookup(&key).await, Lookup::Refreshing(json!([])));
        assert_eq!(cache.lookup(&key).await, Lookup::Refreshing(json!([])));

        cache.release_refresh(&key).await;
        assert_eq!(cache.lookup(&key).await, Lookup::Stale(json!([])));

        cache.store(key.clone(), json!([1]), 0).await;
        assert_eq!(cache.lookup(&key).await, Lookup::Fresh(json!([1])));
    }

    #[tokio::test]
    async fn test_invalidate_marks_only_listed_kinds() {
        let cache = QueryCache::new(Duration::from_secs(30));
        let students = QueryKey::list(ResourceKind::Student, vec![]);
        let pricing = QueryKey::list(ResourceKind::Pricing, vec![]);
        cache.store(students.clone(), json!([]), 0).await;
        cache.store(pricing.clone(), json!([]), 0).await;

        cache.invalidate(ResourceKind::ExamStudent.invalidation_set()).await;

        assert_eq!(cache.lookup(&students).await, Lookup::Invalidated(json!([])));
        assert_eq!(cache.lookup(&pricing).await, Lookup::Fresh(json!([])));
        assert_eq!(cache.invalidation_count(ResourceKind::Student).await, 1);
        assert_eq!(cache.invalidation_count(ResourceKind::ExamSlot).await, 1);
        assert_eq!(cache.invalidation_count(ResourceKind::Pricing).await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_kinds_count_once() {
        let cache = QueryCache::new(Duration::from_secs(30));
        cache
            .invalidate(&[ResourceKind::Student, ResourceKind::Student])
            .await;
        assert_eq!(cache.invalidation_count(ResourceKind::Student).await, 1);
        assert_eq!(cache.generation(ResourceKind::Student).await, 1);
    }

    #[tokio::test]
    async fn test_response_older_than_invalidation_stays_invalidated() {
        let cache = QueryCache::new(Duration::from_secs(30));
        let key = QueryKey::list(ResourceKind::ExamSlot, params(&[("active", "true")]));

        let started = cache.generation(ResourceKind::ExamSlot).await;
        cache.invalidate(&[ResourceKind::ExamSlot]).await;
        cache.store(key.clone(), json!(["ancien"]), started).await;
        assert_eq!(cache.lookup(&key).await, Lookup::Invalidated(json!(["ancien"])));

        let started = cache.generation(ResourceKind::ExamSlot).await;
        cache.store(key.clone(), json!(["nouveau"]), started).await;
        assert_eq!(cache.lookup(&key).await, Lookup::Fresh(json!(["nouveau"])));
    }

    #[tokio::test]
    async fn test_clear_drops_entries_and_outdates_in_flight_reads() {
        let cache = QueryCache::new(Duration::from_secs(30));
        let key = QueryKey::item(ResourceKind::Invoice, 3);
        cache.store(key.clone(), json!({"id": 3}), 0).await;
        let started = cache.generation(ResourceKind::Invoice).await;

        cache.clear().await;
        assert_eq!(cache.peek(&key).await, None);

        cache.store(key.clone(), json!({"id": 3}), started).await;
        assert!(matches!(cache.lookup(&key).await, Lookup::Invalidated(_)));
    }
}
