use log::{debug, trace};
use rfd::{MessageButtons, MessageDialog, MessageLevel};

use crate::session::Completion;

/// Tells the user about problems that need their attention.
pub trait Notifier {
    fn alert(&self, message: &str);
}

/// Alerts the user about failed fetches a selection asked for.
pub fn report_completion(notifier: &dyn Notifier, completion: &Completion) {
    match completion {
        Completion::Failed {
            index,
            notify: true,
            ..
        } => {
            notifier.alert(&format!("Error loading model {index}"));
        }
        completion => trace!("{completion:?}"),
    }
}

/// Shows a blocking native message box.
#[derive(Debug, Clone)]
pub struct DialogNotifier {
    title: String,
}

impl DialogNotifier {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl Notifier for DialogNotifier {
    fn alert(&self, message: &str) {
        let result = MessageDialog::new()
            .set_level(MessageLevel::Error)
            .set_title(self.title.as_str())
            .set_description(message)
            .set_buttons(MessageButtons::Ok)
            .show();
        debug!("message box closed: {result:?}");
    }
}
