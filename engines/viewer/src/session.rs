//! Model cycling and the lazy-load cache.
//!
//! The session only changes state on the thread that owns it. Fetches are delegated to a
//! [`ModelLoader`] and their results are fed back through [`ViewerSession::complete`].

use std::{path::PathBuf, sync::Arc};

use log::{debug, error, info, warn};

use crate::{
    catalog::{normalize, ModelCatalog, Slot},
    loader::{LoadCompletion, LoadRequest, LoadTicket, ModelLoader},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    #[must_use]
    pub fn step(self) -> isize {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

/// Outcome of selecting a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The model was cached and is now displayed.
    Attached { index: usize },
    /// The model was already displayed.
    AlreadyAttached { index: usize },
    /// A fetch has been issued.
    Loading { index: usize },
    /// A fetch for this model is still outstanding.
    AlreadyLoading { index: usize },
    /// The catalog is empty.
    NoModels,
}

/// Outcome of applying a [`LoadCompletion`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The model was stored and is now displayed.
    Attached { index: usize },
    /// The model was stored, but the selection moved elsewhere in the meantime.
    Stored { index: usize },
    /// The fetch failed; `notify` is set if a selection asked for the model.
    Failed {
        index: usize,
        error: String,
        notify: bool,
    },
    /// The completion didn't belong to the outstanding fetch and was ignored.
    Stale { index: usize },
}

/// The model attached to the scene.
#[derive(Debug)]
pub struct ActiveModel<Model> {
    pub index: usize,
    pub model: Arc<Model>,
}

/// Owns the model slots, the current selection and the displayed model.
#[derive(Debug)]
pub struct ViewerSession<Model> {
    catalog: ModelCatalog<Model>,
    selection: usize,
    active: Option<ActiveModel<Model>>,
    next_serial: u64,
}

impl<Model> ViewerSession<Model> {
    #[must_use]
    pub fn new(models_folder: impl Into<PathBuf>, catalog_size: usize) -> Self {
        Self {
            catalog: ModelCatalog::new(models_folder, catalog_size),
            selection: 0,
            active: None,
            next_serial: 0,
        }
    }

    #[must_use]
    pub fn selection(&self) -> usize {
        self.selection
    }

    #[must_use]
    pub fn active(&self) -> Option<&ActiveModel<Model>> {
        self.active.as_ref()
    }

    #[must_use]
    pub fn catalog(&self) -> &ModelCatalog<Model> {
        &self.catalog
    }

    /// Displays the model at `index`, wrapping around at both ends of the catalog.
    ///
    /// Cached models are attached immediately, all others are fetched through `loader`.
    /// The currently displayed model stays attached until the fetch succeeds.
    pub fn select_model(&mut self, index: isize, loader: &impl ModelLoader) -> Selection {
        match normalize(index, self.catalog.len()) {
            Some(index) => self.select_index(index, loader),
            None => {
                error!("No models found.");
                Selection::NoModels
            }
        }
    }

    /// Selects the neighbour of the current selection.
    pub fn advance(&mut self, direction: Direction, loader: &impl ModelLoader) -> Selection {
        // the selection is an index into a `Vec` and therefore fits
        let current = isize::try_from(self.selection).unwrap_or(isize::MAX);
        self.select_model(current.saturating_add(direction.step()), loader)
    }

    /// Starts fetching every model that is neither cached nor loading.
    ///
    /// Returns the number of fetches issued.
    pub fn preload_all(&mut self, loader: &impl ModelLoader) -> usize {
        if self.catalog.is_empty() {
            warn!("No models to preload.");
            return 0;
        }
        let pending: Vec<usize> = (0..self.catalog.len())
            .filter(|&index| {
                matches!(
                    self.catalog.slot(index),
                    Some(Slot::Empty | Slot::Failed { .. })
                )
            })
            .collect();
        for &index in &pending {
            self.request(index, false, loader);
        }
        pending.len()
    }

    /// Applies the result of a fetch.
    ///
    /// Only the completion matching the slot's outstanding ticket has any effect.
    pub fn complete(&mut self, completion: LoadCompletion<Model>) -> Completion {
        let LoadCompletion { ticket, result } = completion;
        let index = ticket.index();

        let Some(slot) = self.catalog.slot_mut(index) else {
            debug!("ignoring completion for unknown model {index}");
            return Completion::Stale { index };
        };
        let requested = match slot {
            Slot::Loading {
                ticket: pending,
                requested,
            } if *pending == ticket => *requested,
            _ => {
                debug!("ignoring stale completion for model {index}");
                return Completion::Stale { index };
            }
        };

        match result {
            Ok(model) => {
                let model = Arc::new(model);
                *slot = Slot::Populated {
                    model: Arc::clone(&model),
                };
                info!("Loaded model{index}.glb successfully");

                if index == self.selection {
                    self.attach(index, model);
                    Completion::Attached { index }
                } else {
                    debug!("model {index} is no longer selected, keeping it for later");
                    Completion::Stored { index }
                }
            }
            Err(message) => {
                error!("Error loading model{index}.glb: {message}");
                *slot = Slot::Failed {
                    error: message.clone(),
                };
                Completion::Failed {
                    index,
                    error: message,
                    notify: requested,
                }
            }
        }
    }

    fn select_index(&mut self, index: usize, loader: &impl ModelLoader) -> Selection {
        self.selection = index;

        let cached = match self.catalog.slot(index) {
            Some(Slot::Populated { model }) => Arc::clone(model),
            Some(Slot::Loading { .. }) => {
                debug!("model {index} is still loading");
                if let Some(Slot::Loading { requested, .. }) = self.catalog.slot_mut(index) {
                    *requested = true;
                }
                return Selection::AlreadyLoading { index };
            }
            Some(Slot::Empty | Slot::Failed { .. }) | None => {
                self.request(index, true, loader);
                return Selection::Loading { index };
            }
        };

        if self.active.as_ref().is_some_and(|active| active.index == index) {
            return Selection::AlreadyAttached { index };
        }
        info!("Adding previously loaded model {index}");
        self.attach(index, cached);
        Selection::Attached { index }
    }

    fn request(&mut self, index: usize, requested: bool, loader: &impl ModelLoader) {
        let ticket = LoadTicket::new(index, self.next_serial);
        self.next_serial += 1;

        let Some(slot) = self.catalog.slot_mut(index) else {
            return;
        };
        *slot = Slot::Loading { ticket, requested };

        info!("Loading model {index}");
        loader.fetch(LoadRequest {
            ticket,
            path: self.catalog.path(index),
        });
    }

    fn attach(&mut self, index: usize, model: Arc<Model>) {
        if let Some(previous) = self.active.replace(ActiveModel { index, model }) {
            debug!("detached model {}", previous.index);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, path::Path};

    use super::*;

    #[derive(Default)]
    struct RecordingLoader {
        requests: RefCell<Vec<LoadRequest>>,
    }

    impl RecordingLoader {
        fn take(&self) -> Vec<LoadRequest> {
            self.requests.take()
        }
    }

    impl ModelLoader for RecordingLoader {
        fn fetch(&self, request: LoadRequest) {
            self.requests.borrow_mut().push(request);
        }
    }

    fn success(request: &LoadRequest) -> LoadCompletion<String> {
        LoadCompletion {
            ticket: request.ticket,
            result: Ok(format!("model {}", request.ticket.index())),
        }
    }

    fn failure(request: &LoadRequest) -> LoadCompletion<String> {
        LoadCompletion {
            ticket: request.ticket,
            result: Err("broken".to_owned()),
        }
    }

    /// A session with every model cached and model 0 attached.
    fn loaded_session(size: usize) -> (ViewerSession<String>, RecordingLoader) {
        let loader = RecordingLoader::default();
        let mut session = ViewerSession::new("models", size);
        session.preload_all(&loader);
        for request in loader.take() {
            session.complete(success(&request));
        }
        (session, loader)
    }

    fn active_index<Model>(session: &ViewerSession<Model>) -> Option<usize> {
        session.active().map(|active| active.index)
    }

    #[test]
    fn preloading_fetches_every_model_and_attaches_the_first() {
        let loader = RecordingLoader::default();
        let mut session = ViewerSession::new("models", 5);

        assert_eq!(session.preload_all(&loader), 5);
        let requests = loader.take();
        let indices: Vec<usize> = requests.iter().map(|request| request.ticket.index()).collect();
        assert_eq!(indices, [0, 1, 2, 3, 4]);
        assert_eq!(requests[2].path, Path::new("models/model2.glb"));

        for request in requests[1..].iter().rev() {
            assert_eq!(
                session.complete(success(request)),
                Completion::Stored {
                    index: request.ticket.index()
                }
            );
            assert!(session.active().is_none());
        }

        assert_eq!(
            session.complete(success(&requests[0])),
            Completion::Attached { index: 0 }
        );
        assert_eq!(active_index(&session), Some(0));
        assert!((0..5).all(|index| session.catalog().slot(index).unwrap().is_populated()));
    }

    #[test]
    fn preloading_skips_cached_and_loading_models() {
        let loader = RecordingLoader::default();
        let mut session = ViewerSession::<String>::new("models", 3);
        session.select_model(1, &loader);
        assert_eq!(loader.take().len(), 1);

        assert_eq!(session.preload_all(&loader), 2);
        let indices: Vec<usize> = loader
            .take()
            .iter()
            .map(|request| request.ticket.index())
            .collect();
        assert_eq!(indices, [0, 2]);
    }

    #[test]
    fn advancing_forward_cycles_back_to_the_start() {
        let (mut session, loader) = loaded_session(5);
        let mut visited = Vec::new();
        for _ in 0..5 {
            match session.advance(Direction::Forward, &loader) {
                Selection::Attached { index } => visited.push(index),
                other => panic!("unexpected selection {other:?}"),
            }
        }
        assert_eq!(visited, [1, 2, 3, 4, 0]);
        assert_eq!(session.selection(), 0);
        assert!(loader.take().is_empty());
    }

    #[test]
    fn advancing_backward_from_the_first_model_wraps_to_the_last() {
        let (mut session, loader) = loaded_session(5);
        assert_eq!(
            session.advance(Direction::Backward, &loader),
            Selection::Attached { index: 4 }
        );
        assert_eq!(session.selection(), 4);
        assert_eq!(active_index(&session), Some(4));
    }

    #[test]
    fn selecting_normalizes_out_of_range_indices() {
        let (mut session, loader) = loaded_session(5);
        assert_eq!(session.select_model(-1, &loader), Selection::Attached { index: 4 });
        assert_eq!(session.select_model(7, &loader), Selection::Attached { index: 2 });
        assert_eq!(session.select_model(-10, &loader), Selection::Attached { index: 0 });
    }

    #[test]
    fn reselecting_a_cached_model_reuses_it_without_fetching() {
        let (mut session, loader) = loaded_session(3);
        session.select_model(2, &loader);
        let first = Arc::clone(&session.active().unwrap().model);

        session.select_model(0, &loader);
        assert_eq!(session.select_model(2, &loader), Selection::Attached { index: 2 });
        assert!(Arc::ptr_eq(&first, &session.active().unwrap().model));
        assert_eq!(
            session.select_model(2, &loader),
            Selection::AlreadyAttached { index: 2 }
        );
        assert!(loader.take().is_empty());
    }

    #[test]
    fn the_attached_model_always_follows_the_selection() {
        let (mut session, loader) = loaded_session(4);
        let steps = [
            Direction::Forward,
            Direction::Forward,
            Direction::Backward,
            Direction::Backward,
            Direction::Backward,
            Direction::Forward,
        ];
        for direction in steps {
            session.advance(direction, &loader);
            assert_eq!(active_index(&session), Some(session.selection()));
        }
    }

    #[test]
    fn selecting_a_loading_model_does_not_fetch_twice() {
        let loader = RecordingLoader::default();
        let mut session = ViewerSession::<String>::new("models", 3);

        assert_eq!(session.select_model(1, &loader), Selection::Loading { index: 1 });
        assert_eq!(
            session.select_model(1, &loader),
            Selection::AlreadyLoading { index: 1 }
        );
        session.advance(Direction::Forward, &loader);
        session.advance(Direction::Backward, &loader);

        let requests = loader.take();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].ticket.index(), 1);
        assert_eq!(requests[1].ticket.index(), 2);
    }

    #[test]
    fn the_previous_model_stays_attached_while_loading() {
        let loader = RecordingLoader::default();
        let mut session = ViewerSession::<String>::new("models", 3);
        session.select_model(0, &loader);
        session.complete(success(&loader.take()[0]));

        session.advance(Direction::Forward, &loader);
        assert_eq!(session.selection(), 1);
        assert_eq!(active_index(&session), Some(0));

        assert_eq!(
            session.complete(success(&loader.take()[0])),
            Completion::Attached { index: 1 }
        );
        assert_eq!(active_index(&session), Some(1));
    }

    #[test]
    fn superseded_completions_are_stored_without_attaching() {
        let loader = RecordingLoader::default();
        let mut session = ViewerSession::<String>::new("models", 3);
        session.select_model(1, &loader);
        session.select_model(2, &loader);
        let requests = loader.take();

        assert_eq!(
            session.complete(success(&requests[0])),
            Completion::Stored { index: 1 }
        );
        assert!(session.active().is_none());

        assert_eq!(session.select_model(1, &loader), Selection::Attached { index: 1 });
        assert!(loader.take().is_empty());
    }

    #[test]
    fn failed_models_are_retried_on_the_next_selection() {
        let loader = RecordingLoader::default();
        let mut session = ViewerSession::<String>::new("models", 5);
        session.select_model(2, &loader);
        let first_attempt = loader.take();

        assert_eq!(
            session.complete(failure(&first_attempt[0])),
            Completion::Failed {
                index: 2,
                error: "broken".to_owned(),
                notify: true,
            }
        );
        assert!(matches!(
            session.catalog().slot(2),
            Some(Slot::Failed { error }) if error == "broken"
        ));
        assert!(session.active().is_none());

        assert_eq!(session.select_model(2, &loader), Selection::Loading { index: 2 });
        let retry = loader.take();
        assert_eq!(retry.len(), 1);
        assert_ne!(retry[0].ticket, first_attempt[0].ticket);
    }

    #[test]
    fn failures_keep_the_displayed_model() {
        let loader = RecordingLoader::default();
        let mut session = ViewerSession::<String>::new("models", 2);
        session.select_model(0, &loader);
        session.complete(success(&loader.take()[0]));
        session.advance(Direction::Forward, &loader);

        let completion = session.complete(failure(&loader.take()[0]));
        assert!(matches!(
            completion,
            Completion::Failed {
                index: 1,
                notify: true,
                ..
            }
        ));
        assert_eq!(session.selection(), 1);
        assert_eq!(active_index(&session), Some(0));
    }

    #[test]
    fn background_failures_do_not_notify() {
        let loader = RecordingLoader::default();
        let mut session = ViewerSession::<String>::new("models", 3);
        session.preload_all(&loader);
        let requests = loader.take();

        assert!(matches!(
            session.complete(failure(&requests[2])),
            Completion::Failed { index: 2, notify: false, .. }
        ));
    }

    #[test]
    fn failed_selections_notify_after_the_user_moved_on() {
        let loader = RecordingLoader::default();
        let mut session = ViewerSession::<String>::new("models", 3);
        session.select_model(1, &loader);
        session.select_model(2, &loader);
        let requests = loader.take();

        assert_eq!(
            session.complete(failure(&requests[0])),
            Completion::Failed {
                index: 1,
                error: "broken".to_owned(),
                notify: true,
            }
        );
        assert_eq!(session.selection(), 2);
    }

    #[test]
    fn a_failed_preload_of_the_selected_model_does_not_notify() {
        let loader = RecordingLoader::default();
        let mut session = ViewerSession::<String>::new("models", 3);
        session.preload_all(&loader);
        let requests = loader.take();

        assert_eq!(session.selection(), 0);
        assert!(matches!(
            session.complete(failure(&requests[0])),
            Completion::Failed { index: 0, notify: false, .. }
        ));
    }

    #[test]
    fn selecting_a_preloading_model_reports_its_failure() {
        let loader = RecordingLoader::default();
        let mut session = ViewerSession::<String>::new("models", 3);
        session.preload_all(&loader);
        let requests = loader.take();

        assert_eq!(
            session.select_model(1, &loader),
            Selection::AlreadyLoading { index: 1 }
        );
        session.select_model(0, &loader);

        assert!(matches!(
            session.complete(failure(&requests[1])),
            Completion::Failed { index: 1, notify: true, .. }
        ));
        assert!(matches!(
            session.complete(failure(&requests[2])),
            Completion::Failed { index: 2, notify: false, .. }
        ));
    }

    #[test]
    fn duplicate_and_outdated_completions_are_ignored() {
        let loader = RecordingLoader::default();
        let mut session = ViewerSession::<String>::new("models", 3);
        session.select_model(2, &loader);
        let first_attempt = loader.take();
        session.complete(failure(&first_attempt[0]));

        session.select_model(2, &loader);
        let retry = loader.take();

        assert_eq!(
            session.complete(success(&first_attempt[0])),
            Completion::Stale { index: 2 }
        );
        assert!(session.catalog().slot(2).unwrap().is_loading());

        assert_eq!(
            session.complete(success(&retry[0])),
            Completion::Attached { index: 2 }
        );
        let attached = Arc::clone(&session.active().unwrap().model);

        assert_eq!(
            session.complete(success(&retry[0])),
            Completion::Stale { index: 2 }
        );
        assert!(Arc::ptr_eq(&attached, &session.active().unwrap().model));
    }

    #[test]
    fn completions_for_unknown_models_are_ignored() {
        let mut session = ViewerSession::<String>::new("models", 2);
        let completion = LoadCompletion {
            ticket: LoadTicket::new(9, 0),
            result: Ok("ghost".to_owned()),
        };
        assert_eq!(session.complete(completion), Completion::Stale { index: 9 });
        assert!(session.active().is_none());
    }

    #[test]
    fn an_empty_catalog_ignores_navigation() {
        let loader = RecordingLoader::default();
        let mut session = ViewerSession::<String>::new("models", 0);

        assert_eq!(session.preload_all(&loader), 0);
        assert_eq!(session.advance(Direction::Forward, &loader), Selection::NoModels);
        assert_eq!(session.advance(Direction::Backward, &loader), Selection::NoModels);
        assert_eq!(session.select_model(3, &loader), Selection::NoModels);
        assert_eq!(session.selection(), 0);
        assert!(session.active().is_none());
        assert!(loader.take().is_empty());
    }

    #[test]
    fn advancing_matches_selecting_the_neighbouring_index() {
        for size in 1..5 {
            for start in 0..size {
                for direction in [Direction::Forward, Direction::Backward] {
                    let (mut session, loader) = loaded_session(size);
                    let start_index = isize::try_from(start).unwrap();
                    session.select_model(start_index, &loader);

                    session.advance(direction, &loader);
                    let expected = normalize(start_index + direction.step(), size).unwrap();
                    assert_eq!(session.selection(), expected);
                    assert_eq!(active_index(&session), Some(expected));
                }
            }
        }
    }
}
