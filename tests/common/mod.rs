#![allow(dead_code)]

use async_trait::async_trait;
use axum::{Router, http::HeaderName, routing::get};
use redirect_engine::application::services::RedirectService;
use redirect_engine::domain::conditions::ConditionRegistry;
use redirect_engine::domain::entities::RuleRecord;
use redirect_engine::domain::location::RedirectOptions;
use redirect_engine::domain::match_event::MatchEventBus;
use redirect_engine::domain::repositories::RuleRepository;
use redirect_engine::error::AppError;
use redirect_engine::infrastructure::cache::{CacheService, InMemoryCache};
use redirect_engine::routes::app_router;
use redirect_engine::state::{AppState, PipelineSettings};
use std::sync::{Arc, Mutex};

pub const ADMIN_TOKEN: &str = "test-admin-token";

/// Rule store whose contents tests edit between publishes.
pub struct StaticRules {
    rules: Mutex<Vec<RuleRecord>>,
    unavailable: Mutex<bool>,
}

impl StaticRules {
    pub fn new(rules: Vec<RuleRecord>) -> Arc<Self> {
        Arc::new(Self {
            rules: Mutex::new(rules),
            unavailable: Mutex::new(false),
        })
    }

    pub fn push(&self, rule: RuleRecord) {
        self.rules.lock().unwrap().push(rule);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }
}

#[async_trait]
impl RuleRepository for StaticRules {
    async fn list_rules(&self) -> Result<Vec<RuleRecord>, AppError> {
        if *self.unavailable.lock().unwrap() {
            return Err(AppError::internal("Database error", serde_json::json!({})));
        }
        Ok(self.rules.lock().unwrap().clone())
    }

    async fn health_check(&self) -> bool {
        !*self.unavailable.lock().unwrap()
    }
}

pub fn rule(id: i64, kind: &str, pattern: &str, target: &str) -> RuleRecord {
    RuleRecord::new(id, kind, pattern, target)
}

pub fn rule_with_status(id: i64, kind: &str, pattern: &str, target: &str, status: i32) -> RuleRecord {
    RuleRecord {
        status_code: status,
        ..RuleRecord::new(id, kind, pattern, target)
    }
}

pub struct TestApp {
    pub router: Router,
    pub service: Arc<RedirectService>,
    pub rules: Arc<StaticRules>,
    pub cache: Arc<InMemoryCache>,
}

pub struct TestAppBuilder {
    rules: Vec<RuleRecord>,
    conditions: Vec<String>,
    registry: ConditionRegistry,
    options: RedirectOptions,
    pipeline: PipelineSettings,
    admin_token: Option<String>,
}

impl TestAppBuilder {
    pub fn new(rules: Vec<RuleRecord>) -> Self {
        Self {
            rules,
            conditions: Vec::new(),
            registry: ConditionRegistry::with_builtins(),
            options: RedirectOptions::default(),
            pipeline: PipelineSettings::default(),
            admin_token: Some(ADMIN_TOKEN.to_string()),
        }
    }

    pub fn conditions(mut self, names: &[&str]) -> Self {
        self.conditions = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn registry(mut self, registry: ConditionRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn preserve_query_string(mut self) -> Self {
        self.options.preserve_query_string = true;
        self
    }

    pub fn base_path(mut self, base_path: &str) -> Self {
        self.pipeline.base_path = base_path.to_string();
        self
    }

    pub fn tester_header(mut self, name: &'static str, value: &str) -> Self {
        self.pipeline.tester_header = HeaderName::from_static(name);
        self.pipeline.tester_header_value = value.to_string();
        self
    }

    pub fn without_admin_token(mut self) -> Self {
        self.admin_token = None;
        self
    }

    /// Builds the app and publishes the initial rules.
    pub async fn build(self) -> TestApp {
        let rules = StaticRules::new(self.rules);
        let cache = Arc::new(InMemoryCache::new(1000));

        let service = Arc::new(RedirectService::new(
            rules.clone(),
            cache.clone() as Arc<dyn CacheService>,
            self.registry,
            self.conditions,
            MatchEventBus::new(64),
            self.options,
        ));
        service.publish().await.unwrap();

        let state = AppState::new(service.clone(), self.pipeline, self.admin_token);

        TestApp {
            router: app_router(state, site()),
            service,
            rules,
            cache,
        }
    }
}

/// Stand-in for the application behind the redirect middleware.
pub fn site() -> Router {
    Router::new()
        .route("/landing", get(|| async { "landing" }).post(|| async { "posted" }).put(|| async { "put" }))
        .fallback(|| async { (axum::http::StatusCode::NOT_FOUND, "site 404") })
}
