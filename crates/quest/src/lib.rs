//! Questionnaire session engine: navigation queue, transform pipeline,
//! delegated event routing, field linkage and persistence.

pub mod answers;
pub mod config;
pub mod controller;
pub mod error;
pub mod host;
pub mod linkage;
pub mod modals;
pub mod nav_queue;
pub mod persist;
pub mod pipeline;
pub mod router;
pub mod session;
pub mod state;

mod render;

pub use answers::Answers;
pub use config::{ContentSource, RenderConfig, SoccerHook};
pub use controller::NavigationController;
pub use error::{FetchError, HostError, NavError, RenderError, StoreError, TransformError, WorkerError};
pub use host::{BasicFieldHooks, FieldHooks, FieldSnapshot, HostCallbacks, NoFieldHooks, ValueResolver};
pub use linkage::FieldLinkageEngine;
pub use nav_queue::{NavigationQueue, QueueSnapshot};
pub use persist::{MemoryStore, PersistenceStore, answers_key, tree_key};
pub use pipeline::{TransformPath, TransformPipeline};
pub use render::{STYLESHEETS, precompute_context, render};
pub use router::{Action, EventRouter, RouteOutcome, SubmitIntent};
pub use session::{Session, Stylesheet};
pub use state::SessionState;

pub use core_types::{Lang, QuestionId};
pub use dom::{Document, DomEvent, EventType, NodeId};
