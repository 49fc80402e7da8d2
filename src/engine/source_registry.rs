//! One source node per media element, created at most once.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use super::audio_graph::AudioGraphState;
use super::error::EngineError;
use super::host::{AudioGraphBackend, SourceNode, WidgetId};

/// Maps each bound widget's media element to its graph source node.
///
/// Entries are write-once: the only way to obtain a node is
/// [`get_or_create_source`](Self::get_or_create_source), which consults the map
/// before asking the graph to connect anything. Entries leave only through
/// [`dispose`](Self::dispose), called when the widget's DOM is discarded.
pub struct SourceBindingRegistry<S> {
    bindings: RefCell<HashMap<WidgetId, Rc<S>>>,
}

impl<S: SourceNode> SourceBindingRegistry<S> {
    pub fn new() -> Self {
        Self {
            bindings: RefCell::new(HashMap::new()),
        }
    }

    pub fn get_or_create_source<G>(
        &self,
        id: WidgetId,
        media: &G::Media,
        graph: &AudioGraphState<G>,
    ) -> Result<Rc<S>, EngineError>
    where
        G: AudioGraphBackend<Source = S>,
    {
        if let Some(existing) = self.bindings.borrow().get(&id) {
            return Ok(Rc::clone(existing));
        }

        let source = Rc::new(graph.backend().connect_source(media)?);
        let previous = self.bindings.borrow_mut().insert(id, Rc::clone(&source));
        debug_assert!(previous.is_none(), "source created twice for {id}");
        debug!(%id, "media source connected to analyzer");
        Ok(source)
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.bindings.borrow().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.bindings.borrow().len()
    }

    /// Drop the binding of a widget whose media element is being discarded.
    pub fn dispose(&self, id: WidgetId) -> bool {
        let removed = self.bindings.borrow_mut().remove(&id);
        match removed {
            Some(source) => {
                source.disconnect();
                true
            }
            None => false,
        }
    }
}

impl<S: SourceNode> Default for SourceBindingRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}
