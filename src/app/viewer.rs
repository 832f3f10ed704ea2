//! The viewer: one struct owning everything the event handlers touch.

use super::frame_loop::FrameTarget;
use crate::animation::Tween;
use crate::camera::PerspectiveCamera;
use crate::config::ViewerConfig;
use crate::controls::{PointerTilt, TiltTarget};
use crate::core::{Context, Renderer};
use crate::loaders::{LoadedScene, LoadingManager};
use crate::math::Vector3;
use crate::postprocessing::EffectComposer;
use crate::scene::{Object3D, Scene, SceneError};
use crate::texture::EnvironmentMap;
use std::sync::{Arc, RwLock};

fn aspect(width: u32, height: u32) -> f32 {
    if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

/// Scene, camera, renderer, post-processing chain and input state.
///
/// Input and resize handlers are methods; the frame loop calls
/// [`FrameTarget::frame`]. Nothing here needs a GPU until a [`Context`] is
/// attached, so all state transitions can be exercised headless.
pub struct Viewer {
    config: ViewerConfig,
    scene: Scene,
    camera: PerspectiveCamera,
    renderer: Renderer,
    composer: EffectComposer,
    controls: PointerTilt,
    rotation: Option<Tween<[f32; 2]>>,
    model: Option<Arc<RwLock<Object3D>>>,
    viewport: (u32, u32),
    loading: LoadingManager,
}

impl Viewer {
    /// Create a viewer for a `width` x `height` viewport at `pixel_ratio`.
    pub fn new(config: ViewerConfig, width: u32, height: u32, pixel_ratio: f32) -> Self {
        let mut camera = PerspectiveCamera::new(
            config.camera.fov,
            aspect(width, height),
            config.camera.near,
            config.camera.far,
        );
        camera.set_position(Vector3::from_array(config.camera.position));
        camera.look_at(Vector3::ZERO);
        camera.update_projection_matrix();

        let mut renderer = Renderer::new(config.renderer.render_config(), width, height);
        renderer.set_pixel_ratio(config.renderer.effective_pixel_ratio(pixel_ratio));

        let composer = EffectComposer::new(width, height, config.post);
        let controls = config.input.pointer_tilt();

        Self {
            config,
            scene: Scene::new(),
            camera,
            renderer,
            composer,
            controls,
            rotation: None,
            model: None,
            viewport: (width, height),
            loading: LoadingManager::new(),
        }
    }

    /// Hand the renderer its GPU context.
    pub fn attach_context(&mut self, context: Context) {
        self.renderer.bind(context);
    }

    /// Configuration the viewer was built with.
    #[inline]
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// The scene.
    #[inline]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The camera.
    #[inline]
    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    /// The renderer.
    #[inline]
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// The post-processing chain.
    #[inline]
    pub fn composer(&self) -> &EffectComposer {
        &self.composer
    }

    /// Viewport size in CSS pixels.
    #[inline]
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// The attached model node, if loading finished.
    pub fn model(&self) -> Option<&Arc<RwLock<Object3D>>> {
        self.model.as_ref()
    }

    /// Load bookkeeping.
    #[inline]
    pub fn loading(&self) -> &LoadingManager {
        &self.loading
    }

    /// Mutable load bookkeeping.
    #[inline]
    pub fn loading_mut(&mut self) -> &mut LoadingManager {
        &mut self.loading
    }

    /// Target of the running rotation tween, as `[x, y]`.
    pub fn rotation_target(&self) -> Option<[f32; 2]> {
        self.rotation.as_ref().map(|t| t.target())
    }

    /// Current model rotation about X and Y.
    pub fn model_rotation(&self) -> Option<[f32; 2]> {
        let model = self.model.as_ref()?;
        let model = model.read().ok()?;
        let rotation = model.rotation();
        Some([rotation.x, rotation.y])
    }

    /// Install the scene environment. Only the first call succeeds.
    pub fn set_environment(&mut self, environment: EnvironmentMap) -> Result<(), SceneError> {
        self.scene.set_environment(Arc::new(environment))
    }

    /// Add a loaded model at the origin with unit scale and keep a handle for input.
    ///
    /// The scene holds at most one model; a second call is rejected.
    pub fn attach_model(&mut self, loaded: LoadedScene) -> Result<Arc<RwLock<Object3D>>, SceneError> {
        if let Some(existing) = &self.model {
            let existing = match existing.read() {
                Ok(node) => node.id(),
                Err(poisoned) => poisoned.into_inner().id(),
            };
            return Err(SceneError::ModelAlreadyAttached { existing });
        }

        let mut object = Object3D::from_model(Arc::new(loaded));
        object.set_position(0.0, 0.0, 0.0);
        object.set_scale(1.0, 1.0, 1.0);

        let object = Arc::new(RwLock::new(object));
        self.scene.add(Arc::clone(&object));
        self.model = Some(Arc::clone(&object));
        Ok(object)
    }

    /// Pointer moved to (`client_x`, `client_y`).
    ///
    /// Returns the new rotation target, or `None` when no model is loaded.
    pub fn on_pointer_move(&mut self, client_x: f32, client_y: f32) -> Option<TiltTarget> {
        let current = self.model_rotation()?;
        let (width, height) = self.viewport;
        let target = self.controls.target(client_x, client_y, width as f32, height as f32);

        match self.rotation.as_mut() {
            Some(tween) => tween.retarget(target.to_array()),
            None => {
                let tween = Tween::new(current, target.to_array(), self.config.input.tween_duration)
                    .with_easing(self.config.input.easing);
                self.rotation = Some(tween);
            }
        }
        Some(target)
    }

    /// Viewport resized to `width` x `height` CSS pixels at `pixel_ratio`.
    pub fn on_resize(&mut self, width: u32, height: u32, pixel_ratio: f32) {
        self.viewport = (width, height);
        self.camera.set_aspect(aspect(width, height));
        self.camera.update_projection_matrix();
        self.renderer.set_size(width, height);
        self.composer.set_size(width, height);
        self.renderer
            .set_pixel_ratio(self.config.renderer.effective_pixel_ratio(pixel_ratio));
    }

    /// Advance animation state by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        let (Some(tween), Some(model)) = (self.rotation.as_mut(), self.model.as_ref()) else {
            return;
        };
        let [x, y] = tween.advance(dt);
        let finished = tween.is_finished();

        match model.write() {
            Ok(mut model) => {
                let z = model.rotation().z;
                model.set_rotation(x, y, z);
            }
            Err(_) => log::error!("model lock poisoned; rotation skipped"),
        }

        if finished {
            self.rotation = None;
        }
    }

    /// Render one frame through the composer, recovering from surface loss.
    pub fn render_frame(&mut self) {
        match self.composer.render(&mut self.renderer, &mut self.scene, &mut self.camera) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost or outdated, reconfiguring");
                self.renderer.reconfigure();
            }
            Err(wgpu::SurfaceError::Timeout) => log::warn!("surface timeout, skipping frame"),
            Err(e) => log::error!("render failed: {e}"),
        }
    }
}

impl FrameTarget for Viewer {
    fn frame(&mut self, delta: f64) {
        self.update(delta as f32);
        self.render_frame();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::frame_loop::{FrameDriver, StopAfter};
    use crate::loaders::LoadedScene;
    use crate::math::consts::PI;

    fn viewer() -> Viewer {
        Viewer::new(ViewerConfig::default(), 800, 600, 1.0)
    }

    #[test]
    fn test_initial_camera() {
        let v = viewer();
        assert_eq!(v.camera().fov, 40.0);
        assert_eq!(v.camera().aspect, 800.0 / 600.0);
        assert_eq!(v.camera().position, Vector3::new(0.0, 0.0, 3.5));
        assert_eq!(v.renderer().tone_mapping_exposure(), 1.0);
    }

    #[test]
    fn test_pointer_without_model_is_noop() {
        let mut v = viewer();
        assert!(v.on_pointer_move(10.0, 10.0).is_none());
        assert!(v.rotation_target().is_none());
        v.update(1.0);
        assert!(v.model_rotation().is_none());
    }

    #[test]
    fn test_center_pointer_targets_zero() {
        let mut v = viewer();
        v.attach_model(LoadedScene::new("helmet")).unwrap();
        let target = v.on_pointer_move(400.0, 300.0).unwrap();
        assert_eq!(target, TiltTarget { x: 0.0, y: 0.0 });
        assert_eq!(v.rotation_target(), Some([0.0, 0.0]));
    }

    #[test]
    fn test_corner_pointer_targets_negative_extreme() {
        let mut v = viewer();
        v.attach_model(LoadedScene::new("helmet")).unwrap();
        let target = v.on_pointer_move(0.0, 0.0).unwrap();
        assert!((target.x + PI * 0.045).abs() < 1e-6);
        assert!((target.y + PI * 0.045).abs() < 1e-6);
    }

    #[test]
    fn test_tween_reaches_target_in_duration() {
        let mut v = viewer();
        v.attach_model(LoadedScene::new("helmet")).unwrap();
        let target = v.on_pointer_move(800.0, 0.0).unwrap();

        v.update(0.15);
        let [x, y] = v.model_rotation().unwrap();
        assert!(x < 0.0 && x > target.x);
        assert!(y > 0.0 && y < target.y);

        v.update(0.2);
        let [x, y] = v.model_rotation().unwrap();
        assert!((x - target.x).abs() < 1e-6);
        assert!((y - target.y).abs() < 1e-6);
        assert!(v.rotation_target().is_none());
    }

    #[test]
    fn test_new_pointer_event_retargets() {
        let mut v = viewer();
        v.attach_model(LoadedScene::new("helmet")).unwrap();
        v.on_pointer_move(0.0, 0.0);
        v.update(0.1);
        let mid = v.model_rotation().unwrap();
        v.on_pointer_move(400.0, 300.0);
        assert_eq!(v.rotation_target(), Some([0.0, 0.0]));
        // Retargeting does not jump.
        assert_eq!(v.model_rotation().unwrap(), mid);
    }

    #[test]
    fn test_resize_keeps_everything_in_step() {
        let mut v = viewer();
        v.on_resize(1600, 900, 1.0);
        assert_eq!(v.camera().aspect, 1600.0 / 900.0);
        assert!(!v.camera().needs_update());
        assert_eq!(v.renderer().size(), (1600, 900));
        assert_eq!(v.renderer().drawing_buffer_size(), (1600, 900));
        assert_eq!(v.composer().size(), (1600, 900));
        assert_eq!(v.viewport(), (1600, 900));
    }

    #[test]
    fn test_aspect_exact_after_many_resizes() {
        let mut v = viewer();
        for (w, h) in [(1024, 768), (333, 777), (1920, 1080), (641, 479)] {
            v.on_resize(w, h, 2.0);
            assert_eq!(v.camera().aspect, w as f32 / h as f32);
            assert_eq!(v.renderer().drawing_buffer_size(), (w * 2, h * 2));
        }
    }

    #[test]
    fn test_pixel_ratio_cap_from_config() {
        let mut config = ViewerConfig::default();
        config.renderer.max_pixel_ratio = Some(1.5);
        let mut v = Viewer::new(config, 100, 100, 3.0);
        assert_eq!(v.renderer().pixel_ratio(), 1.5);
        v.on_resize(100, 100, 1.0);
        assert_eq!(v.renderer().pixel_ratio(), 1.0);
    }

    #[test]
    fn test_model_attached_at_identity() {
        let mut v = viewer();
        let model = v.attach_model(LoadedScene::new("helmet")).unwrap();
        let model = model.read().unwrap();
        assert_eq!(*model.position(), Vector3::ZERO);
        assert_eq!(*model.scale(), Vector3::ONE);
        assert_eq!(v.scene().model_count(), 1);
    }

    #[test]
    fn test_second_model_is_rejected() {
        let mut v = viewer();
        let first = v.attach_model(LoadedScene::new("a")).unwrap();
        let first_id = first.read().unwrap().id();

        let err = v.attach_model(LoadedScene::new("b")).unwrap_err();
        assert!(matches!(err, SceneError::ModelAlreadyAttached { existing } if existing == first_id));
        assert_eq!(v.scene().model_count(), 1);
        assert!(Arc::ptr_eq(v.model().unwrap(), &first));
    }

    #[test]
    fn test_frames_run_headless() {
        let mut v = viewer();
        v.attach_model(LoadedScene::new("helmet")).unwrap();
        v.on_pointer_move(0.0, 600.0);
        let mut driver = FrameDriver::new(StopAfter(3));
        assert_eq!(driver.run(&mut v), 3);
        assert_eq!(v.renderer().info().frame, 0);
    }
}
