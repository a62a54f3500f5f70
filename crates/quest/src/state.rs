use crate::answers::Answers;
use crate::linkage::FieldLinkageEngine;
use crate::nav_queue::NavigationQueue;
use core_types::QuestionId;
use dom::{Document, NodeId};

pub const ACTIVE_CLASS: &str = "active";

/// Everything one rendered questionnaire mutates while the user works on it.
#[derive(Clone, Debug)]
pub struct SessionState {
    pub doc: Document,
    pub queue: NavigationQueue,
    pub answers: Answers,
    pub linkage: FieldLinkageEngine,
    pub quest_name: String,
}

impl SessionState {
    pub fn new(doc: Document, quest_name: impl Into<String>) -> Self {
        Self {
            doc,
            queue: NavigationQueue::new(),
            answers: Answers::new(),
            linkage: FieldLinkageEngine::new(),
            quest_name: quest_name.into(),
        }
    }

    /// Question containers in document order.
    pub fn questions(&self) -> Vec<NodeId> {
        self.doc.elements_by_class("question")
    }

    pub fn question(&self, id: &QuestionId) -> Option<NodeId> {
        self.doc
            .get_element_by_id(id.as_str())
            .filter(|&n| self.doc.has_class(n, "question"))
    }

    /// The question the user is on, per the navigation queue.
    pub fn current_question(&self) -> Option<NodeId> {
        self.queue.current_node().and_then(|id| self.question(id))
    }

    /// Make the queue's current question the only active one.
    pub fn activate(&mut self) -> Option<NodeId> {
        let current = self.current_question();
        for node in self.doc.elements_by_class(ACTIVE_CLASS) {
            self.doc.remove_class(node, ACTIVE_CLASS);
        }
        match current {
            Some(node) => {
                self.doc.add_class(node, ACTIVE_CLASS);
                log::info!(
                    target: "quest.nav",
                    "{}: question {} active",
                    self.quest_name,
                    self.doc.element_id(node).unwrap_or("?")
                );
            }
            None => {
                if let Some(id) = self.queue.current_node() {
                    log::warn!(target: "quest.nav", "{}: no question with id {id}", self.quest_name);
                }
            }
        }
        current
    }

    pub fn active_question(&self) -> Option<NodeId> {
        self.questions()
            .into_iter()
            .find(|&q| self.doc.has_class(q, ACTIVE_CLASS))
    }
}
