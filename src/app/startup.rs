//! Asset startup: environment first, then the model.

use super::viewer::Viewer;
use crate::loaders::{AssetSource, GltfLoader, HdrLoader, LoadError, LoadProgress};
use crate::scene::SceneError;
use std::cell::RefCell;
use thiserror::Error;

/// Why startup stopped early.
#[derive(Error, Debug)]
pub enum StartupError {
    /// The environment map failed; the model was never requested.
    #[error("environment failed to load: {0}")]
    Environment(#[source] LoadError),

    /// The model failed after the environment was installed.
    #[error("model failed to load: {0}")]
    Model(#[source] LoadError),

    /// The scene refused the environment or the model.
    #[error(transparent)]
    Scene(#[from] SceneError),
}

fn report_progress(viewer: &RefCell<Viewer>, progress: &LoadProgress) {
    let Some(percent) = progress.percentage() else {
        return;
    };
    log::info!("{}% loaded", percent);
    viewer.borrow_mut().loading_mut().item_progress(&progress.url, percent);
}

/// Load the environment, install it, then load and attach the model.
///
/// The viewer is only borrowed between awaits, so input and frame callbacks
/// keep running while assets stream in.
pub async fn load_assets<S: AssetSource>(viewer: &RefCell<Viewer>, source: &S) -> Result<(), StartupError> {
    let (env_url, model_url) = {
        let v = viewer.borrow();
        let assets = &v.config().assets;
        (assets.environment_url.clone(), assets.model_url.clone())
    };

    viewer.borrow_mut().loading_mut().item_start(env_url.as_str());
    let mut on_progress = |progress: &LoadProgress| report_progress(viewer, progress);
    let environment = match HdrLoader::new().load(source, &env_url, &mut on_progress).await {
        Ok(environment) => environment,
        Err(err) => {
            log::error!("An error happened: {err}");
            viewer.borrow_mut().loading_mut().item_error(&env_url, &err);
            log::warn!("skipping {model_url}: no environment to light it");
            return Err(StartupError::Environment(err));
        }
    };
    {
        let mut v = viewer.borrow_mut();
        if let Err(err) = v.set_environment(environment) {
            v.loading_mut().item_error(&env_url, &err);
            return Err(err.into());
        }
        v.loading_mut().item_end(&env_url);
    }

    viewer.borrow_mut().loading_mut().item_start(model_url.as_str());
    match GltfLoader::new().load(source, &model_url, &mut on_progress).await {
        Ok(scene) => {
            let mut v = viewer.borrow_mut();
            if let Err(err) = v.attach_model(scene) {
                v.loading_mut().item_error(&model_url, &err);
                return Err(err.into());
            }
            v.loading_mut().item_end(&model_url);
            Ok(())
        }
        Err(err) => {
            log::error!("An error happened: {err}");
            viewer.borrow_mut().loading_mut().item_error(&model_url, &err);
            Err(StartupError::Model(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewerConfig;
    use crate::loaders::fixtures::{encode_hdr, triangle_gltf};
    use crate::loaders::{LoadState, LoadedScene, MemorySource};

    fn config() -> ViewerConfig {
        let mut config = ViewerConfig::default();
        config.assets.environment_url = "env.hdr".into();
        config.assets.model_url = "./helmet.gltf".into();
        config
    }

    fn viewer() -> RefCell<Viewer> {
        RefCell::new(Viewer::new(config(), 800, 600, 1.0))
    }

    #[test]
    fn test_environment_loads_before_model() {
        let source = MemorySource::new()
            .with("env.hdr", encode_hdr(8, 4, 2.0))
            .with("./helmet.gltf", triangle_gltf(None));
        let viewer = viewer();

        pollster::block_on(load_assets(&viewer, &source)).unwrap();

        assert_eq!(source.requests(), vec!["env.hdr".to_string(), "./helmet.gltf".to_string()]);
        let v = viewer.borrow();
        assert!(v.scene().environment().is_some());
        assert_eq!(v.scene().model_count(), 1);
        assert!(v.model().is_some());
        assert_eq!(v.loading().state(), LoadState::Loaded);
        assert_eq!(v.loading().item_percent("env.hdr"), Some(100.0));
        assert_eq!(v.loading().item_percent("./helmet.gltf"), Some(100.0));
    }

    #[test]
    fn test_environment_failure_skips_model() {
        let source = MemorySource::new().with("./helmet.gltf", triangle_gltf(None));
        let viewer = viewer();

        let err = pollster::block_on(load_assets(&viewer, &source)).unwrap_err();

        assert!(matches!(err, StartupError::Environment(LoadError::Http { status: 404, .. })));
        assert_eq!(source.requests(), vec!["env.hdr".to_string()]);
        let v = viewer.borrow();
        assert_eq!(v.scene().model_count(), 0);
        assert!(v.scene().environment().is_none());
        assert_eq!(v.loading().item_state("env.hdr"), LoadState::Failed);
        assert!(v.model().is_none());
    }

    #[test]
    fn test_model_failure_keeps_environment() {
        let source = MemorySource::new()
            .with("env.hdr", encode_hdr(8, 4, 2.0))
            .with("./helmet.gltf", b"not gltf".to_vec());
        let viewer = viewer();

        let err = pollster::block_on(load_assets(&viewer, &source)).unwrap_err();

        assert!(matches!(err, StartupError::Model(LoadError::Decode { .. })));
        let v = viewer.borrow();
        assert!(v.scene().environment().is_some());
        assert_eq!(v.scene().model_count(), 0);
        assert_eq!(v.loading().item_state("./helmet.gltf"), LoadState::Failed);
    }

    #[test]
    fn test_second_startup_rejects_environment() {
        let source = MemorySource::new()
            .with("env.hdr", encode_hdr(8, 4, 2.0))
            .with("./helmet.gltf", triangle_gltf(None));
        let viewer = viewer();

        pollster::block_on(load_assets(&viewer, &source)).unwrap();
        let err = pollster::block_on(load_assets(&viewer, &source)).unwrap_err();
        assert!(matches!(err, StartupError::Scene(_)));
        assert_eq!(viewer.borrow().scene().model_count(), 1);
    }

    #[test]
    fn test_startup_rejects_second_model() {
        let source = MemorySource::new()
            .with("env.hdr", encode_hdr(8, 4, 2.0))
            .with("./helmet.gltf", triangle_gltf(None));
        let viewer = viewer();
        viewer.borrow_mut().attach_model(LoadedScene::new("preloaded")).unwrap();

        let err = pollster::block_on(load_assets(&viewer, &source)).unwrap_err();

        assert!(matches!(err, StartupError::Scene(SceneError::ModelAlreadyAttached { .. })));
        let v = viewer.borrow();
        assert_eq!(v.scene().model_count(), 1);
        assert_eq!(v.loading().item_state("./helmet.gltf"), LoadState::Failed);
    }

    #[test]
    fn test_pointer_input_after_startup() {
        let source = MemorySource::new()
            .with("env.hdr", encode_hdr(8, 4, 2.0))
            .with("./helmet.gltf", triangle_gltf(None));
        let viewer = viewer();
        assert!(viewer.borrow_mut().on_pointer_move(0.0, 0.0).is_none());

        pollster::block_on(load_assets(&viewer, &source)).unwrap();
        let target = viewer.borrow_mut().on_pointer_move(400.0, 300.0).unwrap();
        assert_eq!(target.to_array(), [0.0, 0.0]);
    }
}
