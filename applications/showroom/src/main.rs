#![allow(missing_docs, reason = "TODO remove before release")]

mod error;

use std::{
    env, fs,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
};

use engine_viewer::{DialogNotifier, LoadCompletion, RendererBuilder, ThreadedLoader, ViewerConfig};
use error::{ApplicationError, ApplicationResult};
use lib_file_storage::DirectoryStorage;
use lib_gltf_model::{load_model, ModelData};
use log::{debug, error, info, warn};
use showroom_framework::{
    application::Application, event::FrameworkEvent, logging::init_logger, register_ctrlc,
};
use winit::event_loop::{ControlFlow, EventLoop};

/// Read from the working directory unless a path is given on the command line.
const DEFAULT_CONFIG_PATH: &str = "showroom.json";

type ViewerEvent = FrameworkEvent<LoadCompletion<ModelData>>;

fn main() -> ExitCode {
    init_logger();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!("{error}");
            error.into()
        }
    }
}

fn run() -> ApplicationResult<()> {
    let config_path = env::args_os().nth(1).map(PathBuf::from);
    let config = load_config(config_path.as_deref(), Path::new(DEFAULT_CONFIG_PATH))?;

    let window_event_loop = EventLoop::<ViewerEvent>::with_user_event()
        .build()
        .map_err(ApplicationError::EventLoop)?;
    window_event_loop.set_control_flow(ControlFlow::Poll);
    let window_proxy = window_event_loop.create_proxy();

    if let Err(error) = register_ctrlc(window_proxy.clone()) {
        warn!("Ctrl+C will not shut down cleanly: {error}");
    }

    let loader = ThreadedLoader::new(
        Arc::new(DirectoryStorage::default()),
        load_model,
        move |completion| {
            if window_proxy
                .send_event(FrameworkEvent::Custom { event: completion })
                .is_err()
            {
                debug!("window event loop is gone, dropping loaded model");
            }
        },
    );

    let notifier = Box::new(DialogNotifier::new(config.title.clone()));
    let mut application = Application::new(
        config.title.clone(),
        RendererBuilder::new(config, loader, notifier),
    );

    info!("main: Entering event loop...");
    window_event_loop
        .run_app(&mut application)
        .map_err(ApplicationError::EventLoop)?;
    debug!("main: window event loop exited");

    match application.take_error() {
        Some(error) => Err(ApplicationError::Graphics(error)),
        None => Ok(()),
    }
}

/// Reads the configuration from `explicit` or, if absent, from `fallback` if that exists.
fn load_config(explicit: Option<&Path>, fallback: &Path) -> ApplicationResult<ViewerConfig> {
    let path = match explicit {
        Some(path) => path,
        None if fallback.exists() => fallback,
        None => {
            info!(
                "no {} found, using the built-in configuration",
                fallback.display()
            );
            return Ok(ViewerConfig::default());
        }
    };

    info!("reading configuration from {}", path.display());
    let json = fs::read_to_string(path).map_err(|source| ApplicationError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    ViewerConfig::from_json(&json).map_err(|source| ApplicationError::ParseConfig {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("showroom-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_fallback_uses_the_defaults() {
        let dir = temp_dir("defaults");
        let config = load_config(None, &dir.join("showroom.json")).unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn existing_fallback_is_read() {
        let dir = temp_dir("fallback");
        let path = dir.join("showroom.json");
        fs::write(&path, r#"{ "catalog_size": 2 }"#).unwrap();

        let config = load_config(None, &path).unwrap();
        assert_eq!(config.catalog_size, 2);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = temp_dir("explicit");
        let error = load_config(Some(&dir.join("missing.json")), &dir.join("showroom.json"))
            .unwrap_err();
        assert!(matches!(error, ApplicationError::ReadConfig { .. }));
        assert!(error.to_string().contains("missing.json"), "{error}");
    }

    #[test]
    fn invalid_configuration_names_the_file() {
        let dir = temp_dir("invalid");
        let path = dir.join("broken.json");
        fs::write(&path, r#"{ "catalog_size": "many" }"#).unwrap();

        let error = load_config(Some(&path), Path::new("unused.json")).unwrap_err();
        assert!(matches!(error, ApplicationError::ParseConfig { .. }));
        assert!(error.to_string().contains("broken.json"), "{error}");

        fs::remove_dir_all(dir).unwrap();
    }
}
