//! One-shot initialization of a questionnaire session.

use crate::config::{ContentSource, RenderConfig};
use crate::controller::NavigationController;
use crate::error::RenderError;
use crate::host::{HostCallbacks, ValueResolver};
use crate::modals;
use crate::persist::{PersistenceStore, answers_key, tree_key};
use crate::pipeline::TransformPipeline;
use crate::router::EventRouter;
use crate::session::{Session, Stylesheet};
use crate::state::SessionState;
use bus::TransformJob;
use chrono::NaiveDate;
use core_types::{RequestId, ResourceKind};
use dom::{Document, NodeId};
use markup::{Locale, TransformContext};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use url::Url;

/// Optional stylesheets loaded next to a URL source when `activate` is set.
pub const STYLESHEETS: [&str; 2] = ["ActiveLogic.css", "Style1.css"];

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> RequestId {
    NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed)
}

/// Build the transform context up front: date fields for `today` and every
/// `{$u:name}` token of `content` that `resolver` knows about.
pub fn precompute_context(
    content: &str,
    locale: &Locale,
    today: NaiveDate,
    resolver: Option<&dyn ValueResolver>,
) -> TransformContext {
    let mut context = TransformContext::for_date(today, locale);
    for name in markup::user_variables(content) {
        match resolver.and_then(|r| r.resolve(&name)) {
            Some(value) => context = context.with_user_var(name, value),
            None => log::debug!(target: "quest.render", "user variable {name} has no value"),
        }
    }
    context
}

/// Fetch or accept the content, transform it, inject it, restore prior
/// answers and navigation state, and activate the current question.
///
/// Only a failed content fetch or a failed inline transform is fatal; every
/// other problem is logged and the session starts without the missing piece.
pub async fn render(config: RenderConfig) -> Result<Session, RenderError> {
    let RenderConfig {
        source,
        root_id,
        host,
        survey_data_prefetch,
        tree_json,
        lang,
        activate,
        soccer,
        delayed_parameter_array,
        transform_timeout,
        excluded_answer_keys,
        base_url,
        value_resolver,
        store,
        field_hooks,
        worker_factory,
        today,
    } = config;
    let locale = Locale::for_lang(lang);

    let (content, content_url) = match source {
        ContentSource::Text(text) => (text, None),
        ContentSource::Url(url) => {
            let url = net::parse_url(&url)?;
            let fetched = fetch_blocking(url.clone()).await??;
            log::info!(
                target: "quest.render",
                "fetched {:?} {} ({} bytes, {}ms)",
                ResourceKind::Content,
                fetched.url,
                fetched.body.len(),
                fetched.duration_ms
            );
            let final_url = Url::parse(&fetched.url).unwrap_or(url);
            (fetched.body, Some(final_url))
        }
    };

    let today = today.unwrap_or_else(|| chrono::Local::now().date_naive());
    let context = precompute_context(&content, &locale, today, value_resolver.as_deref());
    let job = TransformJob {
        request_id: next_request_id(),
        content: content.clone(),
        context,
        locale: locale.clone(),
    };
    let pipeline = TransformPipeline::new(worker_factory, transform_timeout);

    let retrieve_from = if survey_data_prefetch.is_some() {
        None
    } else {
        host.clone()
    };
    let css_base = if activate {
        stylesheet_base(base_url.as_deref(), content_url.as_ref())
    } else {
        None
    };

    let (transformed, retrieved, stylesheets) = tokio::join!(
        pipeline.run(job),
        retrieve_answers(retrieve_from),
        fetch_stylesheets(css_base),
    );
    let transformed = transformed?;

    let mut doc = Document::new(&root_id);
    let root = doc.root();
    let mut html = transformed.content;
    html.push_str(&modals::all(&locale));
    doc.set_inner_html(root, &html);
    let mut state = SessionState::new(doc, transformed.name);
    let quest = state.quest_name.clone();

    let prior = match survey_data_prefetch.or(retrieved).filter(|v| !v.is_null()) {
        Some(answers) => Some(answers),
        None => load(store.as_ref(), &answers_key(&quest)).await,
    };
    if let Some(prior) = prior {
        restore_answers(&mut state, prior, &excluded_answer_keys);
    }

    let tree = match tree_json.filter(|v| !v.is_null()) {
        Some(tree) => Some(tree),
        None => load(store.as_ref(), &tree_key(&quest)).await,
    };
    if let Some(tree) = tree {
        rehydrate_queue(&mut state, tree);
    }

    let questions = state.questions();
    if let Some(&first) = questions.first() {
        remove_buttons(&mut state.doc, first, "previous");
    }
    if let Some(&last) = questions.last() {
        remove_buttons(&mut state.doc, last, "next");
    }
    for node in state.doc.elements_with_attr("data-hidden") {
        state.doc.push_style(node, "display: none");
    }

    if state.queue.is_empty()
        && let Some(first) = questions.first().and_then(|&q| state.doc.element_id(q))
    {
        let first = first.to_string();
        state.queue.add(first);
    }
    state.activate();

    if let Some(hook) = soccer {
        hook(&mut state);
    }
    state.linkage.normalize_confirmations(&mut state.doc);

    log::info!(
        target: "quest.render",
        "{quest}: {} question(s) ready, current {:?}",
        questions.len(),
        state.queue.current_node().map(|q| q.as_str())
    );

    Ok(Session::new(
        state,
        EventRouter::new(field_hooks),
        NavigationController::new(store, host),
        content,
        stylesheets,
        delayed_parameter_array,
    ))
}

async fn fetch_blocking(
    url: Url,
) -> Result<Result<net::FetchResult, net::FetchError>, tokio::task::JoinError> {
    tokio::task::spawn_blocking(move || net::fetch_text(&url)).await
}

async fn retrieve_answers(host: Option<Arc<dyn HostCallbacks>>) -> Option<Value> {
    let host = host?;
    match host.retrieve().await {
        Ok(answers) => answers.filter(|v| !v.is_null()),
        Err(err) => {
            log::warn!(target: "quest.render", "retrieving prior answers failed: {err}");
            None
        }
    }
}

fn stylesheet_base(base_url: Option<&str>, content_url: Option<&Url>) -> Option<Url> {
    if let Some(base) = base_url {
        let base = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };
        match net::parse_url(&base) {
            Ok(url) => return Some(url),
            Err(err) => log::warn!(target: "quest.render", "ignoring stylesheet base: {err}"),
        }
    }
    content_url.cloned()
}

async fn fetch_stylesheets(base: Option<Url>) -> Vec<Stylesheet> {
    let Some(base) = base else {
        return Vec::new();
    };
    let mut pending = Vec::new();
    for name in STYLESHEETS {
        match net::resolve(&base, name) {
            Ok(url) => {
                let href = url.to_string();
                let fetch = tokio::task::spawn_blocking(move || net::fetch_text(&url));
                pending.push((href, fetch));
            }
            Err(err) => log::warn!(target: "quest.render", "cannot resolve {name}: {err}"),
        }
    }

    let mut sheets = Vec::new();
    for (href, fetch) in pending {
        match fetch.await {
            Ok(Ok(fetched)) => sheets.push(Stylesheet {
                href,
                text: fetched.body,
            }),
            Ok(Err(err)) => log::warn!(
                target: "quest.render",
                "{:?} {href} unavailable: {err}",
                ResourceKind::Stylesheet
            ),
            Err(err) => log::warn!(target: "quest.render", "fetching {href} failed: {err}"),
        }
    }
    sheets
}

async fn load(store: &dyn PersistenceStore, key: &str) -> Option<Value> {
    match store.get(key).await {
        Ok(value) => value.filter(|v| !v.is_null()),
        Err(err) => {
            log::warn!(target: "quest.persist", "reading {key} failed: {err}");
            None
        }
    }
}

fn restore_answers(state: &mut SessionState, prior: Value, excluded: &[String]) {
    let Value::Object(mut answers) = prior else {
        log::warn!(target: "quest.render", "{}: prior answers are not an object", state.quest_name);
        return;
    };
    for key in excluded {
        if answers.remove(key).is_some() {
            log::debug!(target: "quest.render", "not restoring excluded answer {key}");
        }
    }
    state.answers.restore(&mut state.doc, &answers);
    log::debug!(
        target: "quest.render",
        "{}: restored {} answer(s)",
        state.quest_name,
        answers.len()
    );
}

fn rehydrate_queue(state: &mut SessionState, tree: Value) {
    let loaded = match tree {
        Value::String(text) => state.queue.load_from_json(&text),
        other => state.queue.load_from_value(other),
    };
    if let Err(err) = loaded {
        log::warn!(target: "quest.nav", "{}: discarding stored tree: {err}", state.quest_name);
        state.queue.clear();
        return;
    }
    if state.queue.current_node().is_some() && state.current_question().is_none() {
        log::warn!(
            target: "quest.nav",
            "{}: stored tree points at a missing question; starting over",
            state.quest_name
        );
        state.queue.clear();
    }
}

fn remove_buttons(doc: &mut Document, question: NodeId, class: &str) {
    let buttons: Vec<NodeId> = doc
        .descendants(question)
        .into_iter()
        .filter(|&n| doc.is_element_named(n, "button") && doc.has_class(n, class))
        .collect();
    for button in buttons {
        doc.remove(button);
    }
}
