/// Events injected into the window event loop from other threads.
#[derive(Debug)]
pub enum FrameworkEvent<Custom> {
    Application { event: ApplicationEvent },
    Custom { event: Custom },
}

#[derive(Clone, Debug)]
pub enum ApplicationEvent {
    Exit,
}

impl<Custom> From<ApplicationEvent> for FrameworkEvent<Custom> {
    fn from(event: ApplicationEvent) -> Self {
        Self::Application { event }
    }
}
