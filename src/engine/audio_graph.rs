//! Lazily created, process-wide audio context and analyzer.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info};

use super::error::EngineError;
use super::host::{AudioGraphBackend, Host};

/// The shared context/analyzer pair plus its reusable frequency buffer.
pub struct AudioGraphState<G> {
    backend: G,
    frequency: RefCell<Vec<u8>>,
}

impl<G: AudioGraphBackend> AudioGraphState<G> {
    pub fn new(backend: G) -> Self {
        let bins = backend.bin_count();
        Self {
            backend,
            frequency: RefCell::new(vec![0; bins]),
        }
    }

    pub fn backend(&self) -> &G {
        &self.backend
    }

    pub fn bin_count(&self) -> usize {
        self.frequency.borrow().len()
    }

    /// Refill the shared buffer in place from the analyzer and hand it to `read`.
    pub fn with_frequency_data<R>(&self, read: impl FnOnce(&[u8]) -> R) -> R {
        let mut buffer = self.frequency.borrow_mut();
        self.backend.fill_frequency_data(&mut buffer);
        read(&buffer)
    }
}

/// Owns the singleton [`AudioGraphState`]; constructs it on first use.
pub struct AudioGraphManager<H: Host> {
    fft_size: u32,
    state: RefCell<Option<Rc<AudioGraphState<H::Graph>>>>,
}

impl<H: Host> AudioGraphManager<H> {
    pub fn new(fft_size: u32) -> Self {
        Self {
            fft_size,
            state: RefCell::new(None),
        }
    }

    /// Return the graph, building it on the first call.
    ///
    /// A failed construction is not cached, so a later user gesture may retry.
    pub fn ensure_graph(&self, host: &H) -> Result<Rc<AudioGraphState<H::Graph>>, EngineError> {
        if let Some(existing) = self.state.borrow().as_ref() {
            return Ok(Rc::clone(existing));
        }

        let backend = host.create_graph(self.fft_size)?;
        let state = Rc::new(AudioGraphState::new(backend));
        info!(
            fft_size = self.fft_size,
            bins = state.bin_count(),
            "audio graph created"
        );
        *self.state.borrow_mut() = Some(Rc::clone(&state));
        Ok(state)
    }

    /// Resume a context the platform created suspended. No-op before `ensure_graph`.
    pub async fn resume_if_suspended(&self) -> Result<(), EngineError> {
        let Some(state) = self.current() else {
            return Ok(());
        };
        if !state.backend().is_suspended() {
            return Ok(());
        }
        debug!("resuming suspended audio context");
        state.backend().resume().await
    }

    pub fn current(&self) -> Option<Rc<AudioGraphState<H::Graph>>> {
        self.state.borrow().as_ref().map(Rc::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::FakeHost;
    use futures::executor::block_on;

    #[test]
    fn ensure_graph_builds_once_and_sizes_buffer() {
        let host = FakeHost::new();
        let manager = AudioGraphManager::<FakeHost>::new(512);

        let first = manager.ensure_graph(&host).unwrap();
        let second = manager.ensure_graph(&host).unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(host.graphs_created(), 1);
        assert_eq!(host.last_fft_size(), Some(512));
        assert_eq!(first.bin_count(), 256);
    }

    #[test]
    fn failed_construction_is_retried_later() {
        let host = FakeHost::new();
        host.fail_graph(true);
        let manager = AudioGraphManager::<FakeHost>::new(1024);

        assert!(matches!(
            manager.ensure_graph(&host),
            Err(EngineError::GraphUnavailable(_))
        ));
        assert!(manager.current().is_none());

        host.fail_graph(false);
        assert!(manager.ensure_graph(&host).is_ok());
        assert_eq!(host.graphs_created(), 1);
    }

    #[test]
    fn resume_only_touches_suspended_contexts() {
        let host = FakeHost::new();
        let manager = AudioGraphManager::<FakeHost>::new(512);
        block_on(manager.resume_if_suspended()).unwrap();

        let graph = manager.ensure_graph(&host).unwrap();
        graph.backend().set_suspended(false);
        block_on(manager.resume_if_suspended()).unwrap();
        assert_eq!(graph.backend().resume_calls(), 0);

        graph.backend().set_suspended(true);
        block_on(manager.resume_if_suspended()).unwrap();
        assert_eq!(graph.backend().resume_calls(), 1);
        assert!(!graph.backend().is_suspended());
    }

    #[test]
    fn frequency_buffer_is_reused_between_reads() {
        let host = FakeHost::new();
        let manager = AudioGraphManager::<FakeHost>::new(64);
        let graph = manager.ensure_graph(&host).unwrap();
        graph.backend().set_magnitudes(vec![7; 32]);

        let first_ptr = graph.with_frequency_data(|data| data.as_ptr());
        let second_ptr = graph.with_frequency_data(|data| {
            assert!(data.iter().all(|&m| m == 7));
            data.as_ptr()
        });

        assert_eq!(first_ptr, second_ptr);
    }
}
