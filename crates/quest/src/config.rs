use crate::host::{BasicFieldHooks, FieldHooks, HostCallbacks, ValueResolver};
use crate::persist::{MemoryStore, PersistenceStore};
use crate::pipeline::DEFAULT_TRANSFORM_TIMEOUT;
use crate::state::SessionState;
use bus::WorkerFactory;
use chrono::NaiveDate;
use core_types::Lang;
use runtime_transform::ThreadWorkerFactory;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_ROOT_ID: &str = "root";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentSource {
    /// Fetch the markup from this URL.
    Url(String),
    /// Markup already in hand.
    Text(String),
}

/// Called once after the questionnaire is live, before confirmation pairs are
/// normalized.
pub type SoccerHook = Box<dyn FnOnce(&mut SessionState) + Send>;

/// Options for one `render` call.
pub struct RenderConfig {
    pub source: ContentSource,
    pub root_id: String,
    /// Host `retrieve`/`store` callbacks.
    pub host: Option<Arc<dyn HostCallbacks>>,
    /// Prior answers; skips `retrieve` when set.
    pub survey_data_prefetch: Option<Value>,
    /// Serialized navigation queue (JSON text or object); skips the store when set.
    pub tree_json: Option<Value>,
    pub lang: Lang,
    /// Load `ActiveLogic.css` and `Style1.css` next to a URL source.
    pub activate: bool,
    pub soccer: Option<SoccerHook>,
    /// Opaque values handed through to the session.
    pub delayed_parameter_array: Vec<Value>,
    pub transform_timeout: Duration,
    /// Answer keys dropped before restoration. Stand-in for language-specific
    /// answers that cannot be restored yet.
    pub excluded_answer_keys: Vec<String>,
    /// Directory stylesheets are resolved against; defaults to the content URL.
    pub base_url: Option<String>,
    pub value_resolver: Option<Arc<dyn ValueResolver>>,
    pub store: Arc<dyn PersistenceStore>,
    pub field_hooks: Arc<dyn FieldHooks>,
    pub worker_factory: Arc<dyn WorkerFactory>,
    /// Date used for `{#current_date}` tokens; today when unset.
    pub today: Option<NaiveDate>,
}

impl RenderConfig {
    pub fn new(source: ContentSource) -> Self {
        Self {
            source,
            root_id: DEFAULT_ROOT_ID.to_string(),
            host: None,
            survey_data_prefetch: None,
            tree_json: None,
            lang: Lang::En,
            activate: false,
            soccer: None,
            delayed_parameter_array: Vec::new(),
            transform_timeout: DEFAULT_TRANSFORM_TIMEOUT,
            excluded_answer_keys: Vec::new(),
            base_url: None,
            value_resolver: None,
            store: Arc::new(MemoryStore::new()),
            field_hooks: Arc::new(BasicFieldHooks),
            worker_factory: Arc::new(ThreadWorkerFactory),
            today: None,
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(ContentSource::Text(text.into()))
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self::new(ContentSource::Url(url.into()))
    }

    pub fn with_root_id(mut self, root_id: impl Into<String>) -> Self {
        self.root_id = root_id.into();
        self
    }

    pub fn with_host(mut self, host: Arc<dyn HostCallbacks>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn with_survey_data(mut self, answers: Value) -> Self {
        self.survey_data_prefetch = Some(answers);
        self
    }

    pub fn with_tree_json(mut self, tree: Value) -> Self {
        self.tree_json = Some(tree);
        self
    }

    pub fn with_lang(mut self, lang: Lang) -> Self {
        self.lang = lang;
        self
    }

    pub fn with_activate(mut self, activate: bool) -> Self {
        self.activate = activate;
        self
    }

    pub fn with_soccer(mut self, hook: SoccerHook) -> Self {
        self.soccer = Some(hook);
        self
    }

    pub fn with_delayed_parameters(mut self, params: Vec<Value>) -> Self {
        self.delayed_parameter_array = params;
        self
    }

    pub fn with_transform_timeout(mut self, timeout: Duration) -> Self {
        self.transform_timeout = timeout;
        self
    }

    pub fn with_excluded_answer_keys(mut self, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.excluded_answer_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_value_resolver(mut self, resolver: Arc<dyn ValueResolver>) -> Self {
        self.value_resolver = Some(resolver);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn PersistenceStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_field_hooks(mut self, hooks: Arc<dyn FieldHooks>) -> Self {
        self.field_hooks = hooks;
        self
    }

    pub fn with_worker_factory(mut self, factory: Arc<dyn WorkerFactory>) -> Self {
        self.worker_factory = factory;
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }
}
