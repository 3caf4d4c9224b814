use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::loader::LoadTicket;

/// Maps any (possibly negative or too large) index onto `0..len`, wrapping around at both ends.
///
/// Returns `None` for an empty collection.
#[must_use]
pub fn normalize(index: isize, len: usize) -> Option<usize> {
    let len = isize::try_from(len).ok().filter(|&len| len > 0)?;
    usize::try_from(index.rem_euclid(len)).ok()
}

/// Location of the model with the given index: `<models_folder>/model<index>.glb`
#[must_use]
pub fn model_path(models_folder: &Path, index: usize) -> PathBuf {
    models_folder.join(format!("model{index}.glb"))
}

/// Load state of a single catalog entry.
#[derive(Debug)]
pub enum Slot<Model> {
    /// never requested
    Empty,
    /// a fetch identified by `ticket` is in flight; `requested` once a selection waits for it
    Loading { ticket: LoadTicket, requested: bool },
    /// loaded; never replaced afterwards
    Populated { model: Arc<Model> },
    /// the last fetch failed; the next request retries
    Failed { error: String },
}

impl<Model> Slot<Model> {
    #[must_use]
    pub fn is_populated(&self) -> bool {
        matches!(self, Slot::Populated { .. })
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Slot::Loading { .. })
    }
}

/// Fixed-size collection of model slots.
#[derive(Debug)]
pub struct ModelCatalog<Model> {
    models_folder: PathBuf,
    slots: Vec<Slot<Model>>,
}

impl<Model> ModelCatalog<Model> {
    #[must_use]
    pub fn new(models_folder: impl Into<PathBuf>, size: usize) -> Self {
        Self {
            models_folder: models_folder.into(),
            slots: (0..size).map(|_| Slot::Empty).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&Slot<Model>> {
        self.slots.get(index)
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut Slot<Model>> {
        self.slots.get_mut(index)
    }

    #[must_use]
    pub fn path(&self, index: usize) -> PathBuf {
        model_path(&self.models_folder, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_matches_double_modulo_for_all_indices() {
        for len in 1..8_usize {
            let signed_len = isize::try_from(len).unwrap();
            for index in -50..50 {
                let expected = usize::try_from(((index % signed_len) + signed_len) % signed_len).unwrap();
                let normalized = normalize(index, len).unwrap();
                assert_eq!(normalized, expected, "index {index}, len {len}");
                assert!(normalized < len);
            }
        }
    }

    #[test]
    fn normalize_wraps_at_both_ends() {
        assert_eq!(normalize(-1, 5), Some(4));
        assert_eq!(normalize(5, 5), Some(0));
        assert_eq!(normalize(-6, 5), Some(4));
        assert_eq!(normalize(12, 5), Some(2));
    }

    #[test]
    fn normalize_rejects_empty_collections() {
        assert_eq!(normalize(0, 0), None);
        assert_eq!(normalize(-1, 0), None);
    }

    #[test]
    fn model_paths_follow_the_naming_scheme() {
        assert_eq!(
            model_path(Path::new("./models"), 3),
            Path::new("./models/model3.glb")
        );

        let catalog = ModelCatalog::<()>::new("assets/cars", 2);
        assert_eq!(catalog.path(0), Path::new("assets/cars/model0.glb"));
        assert_eq!(catalog.path(1), Path::new("assets/cars/model1.glb"));
    }

    #[test]
    fn new_catalogs_start_empty() {
        let catalog = ModelCatalog::<()>::new("models", 3);
        assert_eq!(catalog.len(), 3);
        assert!(!catalog.is_empty());
        assert!((0..3).all(|index| matches!(catalog.slot(index), Some(Slot::Empty))));
        assert!(catalog.slot(3).is_none());

        assert!(ModelCatalog::<()>::new("models", 0).is_empty());
    }
}
