use std::{
    fmt,
    marker::PhantomData,
    path::{Path, PathBuf},
    sync::Arc,
    thread,
};

use lib_file_storage::FileStorage;
use log::{debug, error};

/// Identifies one fetch of one catalog entry.
///
/// Completions carrying a ticket that no longer matches the entry's pending fetch are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    index: usize,
    serial: u64,
}

impl LoadTicket {
    pub(crate) fn new(index: usize, serial: u64) -> Self {
        Self { index, serial }
    }

    #[must_use]
    pub fn index(self) -> usize {
        self.index
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub ticket: LoadTicket,
    pub path: PathBuf,
}

/// Result of a fetch, delivered back to the event loop.
#[derive(Debug)]
pub struct LoadCompletion<Model> {
    pub ticket: LoadTicket,
    pub result: Result<Model, String>,
}

/// Starts fetching models without blocking the caller.
///
/// Implementations must eventually deliver exactly one [`LoadCompletion`] per request.
pub trait ModelLoader {
    fn fetch(&self, request: LoadRequest);
}

type ParseFn<Model> = fn(&dyn FileStorage, &Path) -> anyhow::Result<Model>;

/// Loads every request on its own background thread and hands the result to `sink`.
pub struct ThreadedLoader<Model, Sink> {
    storage: Arc<dyn FileStorage>,
    parse: ParseFn<Model>,
    sink: Sink,
    _model: PhantomData<fn() -> Model>,
}

impl<Model, Sink> ThreadedLoader<Model, Sink>
where
    Model: Send + 'static,
    Sink: Fn(LoadCompletion<Model>) + Clone + Send + 'static,
{
    pub fn new(storage: Arc<dyn FileStorage>, parse: ParseFn<Model>, sink: Sink) -> Self {
        Self {
            storage,
            parse,
            sink,
            _model: PhantomData,
        }
    }
}

impl<Model, Sink> ModelLoader for ThreadedLoader<Model, Sink>
where
    Model: Send + 'static,
    Sink: Fn(LoadCompletion<Model>) + Clone + Send + 'static,
{
    fn fetch(&self, request: LoadRequest) {
        let LoadRequest { ticket, path } = request;
        debug!("fetching {}", path.display());

        let storage = Arc::clone(&self.storage);
        let parse = self.parse;
        let sink = self.sink.clone();

        let spawned = thread::Builder::new()
            .name(format!("model-loader-{}", ticket.index()))
            .spawn(move || {
                let result = parse(storage.as_ref(), &path).map_err(|error| format!("{error:#}"));
                sink(LoadCompletion { ticket, result });
            });

        if let Err(spawn_error) = spawned {
            error!("failed to spawn loader thread: {spawn_error}");
            (self.sink)(LoadCompletion {
                ticket,
                result: Err(format!("failed to spawn loader thread: {spawn_error}")),
            });
        }
    }
}

impl<Model, Sink> fmt::Debug for ThreadedLoader<Model, Sink> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("ThreadedLoader").finish_non_exhaustive()
    }
}
