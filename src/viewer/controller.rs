//! Viewer controller
//!
//! Owns the scene, camera and every manager. Asset loading is the only
//! asynchronous step: both requests run in one spawned task and the joined
//! result is picked up by the host thread, either from [`Viewer::frame`] or
//! [`Viewer::wait_for_assets`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join;
use glam::Vec3;
use tokio::runtime::Handle;
use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::animation::{handle_object_click, AnimationManager, AudioCues, ClickDispatch, ClickRoutes};
use crate::assets::{AssetLoader, LoadedModel, ModelOptions};
use crate::materials::{
    CustomOverride, MaterialLibrary, MaterialSnapshot, PartKey, PartRegistry, DEFAULT_PRESET,
};
use crate::raycast::{PointerEvent, RaycastManager};
use crate::scene::{
    Color, EnvironmentMap, MaterialHandle, NodeId, OrbitControls, PerspectiveCamera, PointLight, Scene,
};

use super::overrides::OverrideSet;
use super::surface::{LayoutBox, RenderSurface};

const FOV_Y_DEGREES: f32 = 60.0;
const NEAR: f32 = 0.1;
const FAR: f32 = 1000.0;

/// Errors raised while constructing a viewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerError {
    /// No render surface was supplied
    MissingRenderTarget,
}

impl std::fmt::Display for ViewerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewerError::MissingRenderTarget => write!(f, "Viewer needs a render target"),
        }
    }
}

impl std::error::Error for ViewerError {}

/// Construction parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerOptions {
    /// Preset applied once the model is in
    pub initial_preset: String,
    pub model_id: String,
    pub environment_id: String,
    /// Directory library textures, thumbnails and sounds are resolved under
    pub texture_root: PathBuf,
    pub model_scale: f32,
    pub camera_position: Vec3,
    pub damping_factor: f32,
    pub audio_muted: bool,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            initial_preset: DEFAULT_PRESET.to_string(),
            model_id: "models/Final.glb".to_string(),
            environment_id: "textures/hdr/studio_small_09_4k.hdr".to_string(),
            texture_root: PathBuf::from("assets"),
            model_scale: 12.0,
            camera_position: Vec3::new(12.0, 8.0, 0.0),
            damping_factor: 0.08,
            audio_muted: false,
        }
    }
}

impl ViewerOptions {
    pub fn with_initial_preset(mut self, preset: impl Into<String>) -> Self {
        self.initial_preset = preset.into();
        self
    }

    pub fn with_model_id(mut self, id: impl Into<String>) -> Self {
        self.model_id = id.into();
        self
    }

    pub fn with_environment_id(mut self, id: impl Into<String>) -> Self {
        self.environment_id = id.into();
        self
    }

    pub fn with_texture_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.texture_root = root.into();
        self
    }

    pub fn with_model_scale(mut self, scale: f32) -> Self {
        self.model_scale = scale;
        self
    }

    pub fn with_audio_muted(mut self, muted: bool) -> Self {
        self.audio_muted = muted;
        self
    }
}

/// Joined outcome of the two asset loads; a failed load is `None`
#[derive(Debug, Default)]
struct LoadedAssets {
    environment: Option<EnvironmentMap>,
    model: Option<LoadedModel>,
}

/// Interactive turntable viewer
pub struct Viewer<S: RenderSurface> {
    surface: S,
    container: LayoutBox,
    scene: Scene,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    library: MaterialLibrary,
    raycast: RaycastManager,
    animation: Option<AnimationManager>,
    routes: ClickRoutes,
    parts: PartRegistry,
    snapshot: MaterialSnapshot,
    overrides: OverrideSet,
    current_preset: String,
    audio_muted: bool,
    audio_state_handler: Option<Box<dyn FnMut(bool)>>,
    /// Builds the cues for each installed model
    audio_cues: Box<dyn FnMut() -> AudioCues>,
    pending: Option<oneshot::Receiver<LoadedAssets>>,
    loaded: bool,
    listening_for_resize: bool,
    last_frame: Option<Instant>,
    disposed: bool,
}

impl<S: RenderSurface> std::fmt::Debug for Viewer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewer")
            .field("container", &self.container)
            .field("current_preset", &self.current_preset)
            .field("parts", &self.parts.len())
            .field("overrides", &self.overrides.len())
            .field("audio_muted", &self.audio_muted)
            .field("loaded", &self.loaded)
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl<S: RenderSurface> Viewer<S> {
    /// Build the viewer and start loading its assets on `runtime`
    pub fn new(
        surface: Option<S>,
        container: LayoutBox,
        options: ViewerOptions,
        loader: Arc<dyn AssetLoader>,
        runtime: &Handle,
    ) -> Result<Self, ViewerError> {
        let surface = surface.ok_or(ViewerError::MissingRenderTarget)?;

        let mut camera = PerspectiveCamera::new(FOV_Y_DEGREES, 1.0, NEAR, FAR);
        camera.position = options.camera_position;
        camera.look_at(Vec3::ZERO);

        let mut scene = Scene::new();
        scene.add_light(PointLight::new(Color::WHITE, 3.0, Vec3::new(4.0, 4.0, 4.0)));

        let library = MaterialLibrary::builtin(options.texture_root.clone());
        let asset_root = options.texture_root.clone();
        let current_preset = if library.preset(&options.initial_preset).is_some() {
            options.initial_preset.clone()
        } else {
            tracing::warn!(
                "Unknown initial preset {}, using {}",
                options.initial_preset,
                DEFAULT_PRESET
            );
            DEFAULT_PRESET.to_string()
        };

        let mut viewer = Self {
            surface,
            container,
            scene,
            camera,
            controls: OrbitControls::new(Vec3::ZERO, options.damping_factor),
            library,
            raycast: RaycastManager::new(),
            animation: None,
            routes: ClickRoutes::default(),
            parts: PartRegistry::default(),
            snapshot: MaterialSnapshot::default(),
            overrides: OverrideSet::new(),
            current_preset,
            audio_muted: options.audio_muted,
            audio_state_handler: None,
            audio_cues: Box::new(move || AudioCues::builtin(&asset_root)),
            pending: None,
            loaded: false,
            listening_for_resize: true,
            last_frame: None,
            disposed: false,
        };
        viewer.resize(container);
        viewer.pending = Some(Self::spawn_loads(&options, loader, runtime));
        Ok(viewer)
    }

    /// Replace the source of audio cues used when a model is installed
    pub fn with_audio_cues(mut self, cues: impl FnMut() -> AudioCues + 'static) -> Self {
        self.audio_cues = Box::new(cues);
        self
    }

    fn spawn_loads(
        options: &ViewerOptions,
        loader: Arc<dyn AssetLoader>,
        runtime: &Handle,
    ) -> oneshot::Receiver<LoadedAssets> {
        let (tx, rx) = oneshot::channel();
        let environment = loader.load_environment(&options.environment_id);
        let model = loader.load_model(
            &options.model_id,
            ModelOptions::default()
                .with_scale(options.model_scale)
                .with_position(Vec3::ZERO)
                .with_animations(true),
        );
        let environment_id = options.environment_id.clone();
        let model_id = options.model_id.clone();

        runtime.spawn(async move {
            let (environment, model) = join(environment, model).await;
            let environment = environment
                .map_err(|e| tracing::warn!("Failed to load environment {}: {}", environment_id, e))
                .ok();
            let model = model
                .map_err(|e| tracing::warn!("Failed to load model {}: {}", model_id, e))
                .ok();
            if tx.send(LoadedAssets { environment, model }).is_err() {
                tracing::debug!("Viewer dropped before assets loaded, discarding them");
            }
        });
        rx
    }

    /// Pick up the load result if it has arrived; returns whether loading has settled
    pub fn poll_assets(&mut self) -> bool {
        let Some(rx) = self.pending.as_mut() else {
            return self.loaded;
        };
        let assets = match rx.try_recv() {
            Ok(assets) => assets,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Closed) => {
                tracing::warn!("Asset load task ended without a result");
                LoadedAssets::default()
            }
        };
        self.pending = None;
        self.apply_loaded(assets);
        self.loaded
    }

    /// Wait for the load result and apply it
    pub async fn wait_for_assets(&mut self) {
        let Some(rx) = self.pending.take() else {
            return;
        };
        let assets = match rx.await {
            Ok(assets) => assets,
            Err(_) => {
                tracing::warn!("Asset load task ended without a result");
                LoadedAssets::default()
            }
        };
        self.apply_loaded(assets);
    }

    fn apply_loaded(&mut self, assets: LoadedAssets) {
        if self.disposed {
            tracing::debug!("Viewer disposed before assets arrived, dropping them");
            return;
        }

        if let Some(environment) = assets.environment {
            self.scene.environment = Some(Arc::new(environment));
            self.scene.background = Some(Color::WHITE);
        }

        if let Some(model) = assets.model {
            self.install_model(model);
        }

        self.loaded = true;
        tracing::info!(
            "Viewer ready ({} meshes, environment: {})",
            self.scene.mesh_count(),
            self.scene.environment.is_some()
        );
    }

    fn install_model(&mut self, model: LoadedModel) {
        let LoadedModel { graph, mut clips } = model;
        let Some(model_root) = graph.roots().next() else {
            tracing::warn!("Loaded model is empty");
            return;
        };
        let offset = self.scene.add_model(graph);
        let root = model_root.offset(offset);
        for clip in &mut clips {
            clip.retarget(offset);
        }

        let mut animation = AnimationManager::new(clips, (self.audio_cues)());
        animation.set_audio_muted(self.audio_muted);
        self.animation = Some(animation);

        self.parts = PartRegistry::resolve(&self.scene.graph, root);
        self.snapshot = MaterialSnapshot::capture(&self.scene.graph, &self.parts);

        self.raycast.add_clickable_object(&self.scene.graph, root);
        self.routes = ClickRoutes::resolve(&self.scene.graph, root);

        self.apply_material_preset();
    }

    /// Advance one frame by `dt` seconds and draw it
    ///
    /// Returns `false` without drawing while disposed or still loading.
    pub fn frame(&mut self, dt: f32) -> bool {
        if self.disposed {
            return false;
        }
        if !self.poll_assets() {
            return false;
        }
        self.controls.update(&mut self.camera);
        if let Some(animation) = self.animation.as_mut() {
            animation.update(dt, &mut self.scene.graph);
        }
        self.surface.render(&self.scene, &self.camera);
        true
    }

    /// [`Viewer::frame`] with the wall-clock time since the previous call
    pub fn frame_now(&mut self) -> bool {
        let now = Instant::now();
        let dt = self
            .last_frame
            .map(|last| now.duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last_frame = Some(now);
        self.frame(dt)
    }

    /// Route a pointer-down through picking and click handling
    pub fn pointer_down(&mut self, event: &PointerEvent) -> Option<ClickDispatch> {
        if self.disposed {
            return None;
        }
        let bounds = self.surface.bounds();
        let graph = &self.scene.graph;
        let routes = &self.routes;
        let animation = &mut self.animation;
        let mut dispatch = None;
        self.raycast
            .handle_pointer_down(event, bounds, &self.camera, graph, &mut |hit: NodeId| {
                if let Some(manager) = animation.as_mut() {
                    dispatch = handle_object_click(hit, routes, graph, manager);
                }
            });
        dispatch
    }

    /// Orbit by a pointer drag in pixels
    pub fn orbit_drag(&mut self, dx: f32, dy: f32) {
        let height = self.surface.bounds().height;
        self.controls.rotate_by_pixels(dx, dy, height);
    }

    /// Zoom by wheel steps; positive moves closer
    pub fn zoom(&mut self, steps: f32) {
        self.controls.zoom(steps);
    }

    /// Follow a container size change
    ///
    /// A container without height gets a square surface.
    pub fn resize(&mut self, container: LayoutBox) {
        if !self.listening_for_resize {
            return;
        }
        self.container = container;
        let width = container.width;
        let height = if container.height == 0 {
            width
        } else {
            container.height
        };
        self.surface.set_size(width, height);
        if height > 0 {
            self.camera.set_aspect(width as f32 / height as f32);
        }
    }

    /// Switch presets, dropping every override
    ///
    /// Unknown names change nothing and return `false`. Before the model is in,
    /// the preset is remembered and applied on load.
    pub fn set_preset(&mut self, name: &str) -> bool {
        if self.disposed {
            return false;
        }
        if self.library.preset(name).is_none() {
            tracing::warn!("Unknown preset {}", name);
            return false;
        }
        self.current_preset = name.to_string();
        self.overrides.clear();
        self.apply_material_preset();
        tracing::info!("Preset {} selected", name);
        true
    }

    /// Reassign every part from the active preset, then reapply overrides
    fn apply_material_preset(&mut self) {
        let Some(preset) = self.library.preset(&self.current_preset) else {
            return;
        };
        let use_snapshot = preset.uses_snapshot();
        for (part, _) in self.parts.iter() {
            let source = if use_snapshot {
                self.snapshot.get(part)
            } else {
                preset.material(part)
            };
            if let Some(material) = source {
                self.parts.assign(&mut self.scene.graph, part, material.clone());
            }
        }
        for (part, material) in self.overrides.resolved(&self.snapshot) {
            self.parts.assign(&mut self.scene.graph, part, material);
        }
    }

    /// Store and immediately apply an override for one part
    pub fn set_custom_material(&mut self, part: PartKey, choice: CustomOverride) {
        if self.disposed {
            return;
        }
        if let Some(material) = OverrideSet::resolve(&choice, part, &self.snapshot) {
            self.parts.assign(&mut self.scene.graph, part, material);
        }
        self.overrides.set(part, choice);
    }

    /// Drop one part's override; the part follows the active preset again
    pub fn clear_custom_material(&mut self, part: PartKey) {
        if self.disposed {
            return;
        }
        self.overrides.remove(part);
        self.apply_material_preset();
    }

    pub fn clear_all_custom_materials(&mut self) {
        if self.disposed {
            return;
        }
        self.overrides.clear();
        self.apply_material_preset();
    }

    pub fn current_preset(&self) -> &str {
        &self.current_preset
    }

    pub fn custom_material(&self, part: PartKey) -> Option<&CustomOverride> {
        self.overrides.get(part)
    }

    /// Material currently in a part's slot
    pub fn part_material(&self, part: PartKey) -> Option<&MaterialHandle> {
        self.parts.material(&self.scene.graph, part)
    }

    /// Set the mute flag and notify the state handler; returns the new state
    pub fn set_audio_muted(&mut self, muted: bool) -> bool {
        self.audio_muted = muted;
        if let Some(animation) = self.animation.as_mut() {
            animation.set_audio_muted(muted);
        }
        self.notify_audio_state();
        self.audio_muted
    }

    pub fn toggle_audio_muted(&mut self) -> bool {
        self.set_audio_muted(!self.audio_muted)
    }

    pub fn is_audio_muted(&self) -> bool {
        self.audio_muted
    }

    /// Register the mute-state listener; it is called right away with the current state
    pub fn set_audio_state_handler(&mut self, handler: impl FnMut(bool) + 'static) {
        self.audio_state_handler = Some(Box::new(handler));
        self.notify_audio_state();
    }

    fn notify_audio_state(&mut self) {
        let muted = self.audio_muted;
        if let Some(handler) = self.audio_state_handler.as_mut() {
            handler(muted);
        }
    }

    /// Tear everything down; safe to call more than once
    ///
    /// A load that is still in flight is dropped when it arrives.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.listening_for_resize = false;
        self.raycast.dispose();
        if let Some(animation) = self.animation.as_mut() {
            animation.dispose();
        }
        self.controls.dispose();
        self.surface.dispose();
        tracing::info!("Viewer disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Whether the joined asset load has been applied
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn animation_manager(&self) -> Option<&AnimationManager> {
        self.animation.as_ref()
    }

    pub fn raycast_manager(&self) -> &RaycastManager {
        &self.raycast
    }

    pub fn library(&self) -> &MaterialLibrary {
        &self.library
    }

    pub fn parts(&self) -> &PartRegistry {
        &self.parts
    }

    pub fn snapshot(&self) -> &MaterialSnapshot {
        &self.snapshot
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use futures_util::future::BoxFuture;
    use glam::Quat;
    use tokio::sync::Notify;

    use super::*;
    use crate::animation::{
        AnimationClip, AudioTrack, InteractivePart, Interpolation, Track, TrackValues, MUSIC_CLIP,
    };
    use crate::assets::AssetError;
    use crate::scene::{EnvironmentMapping, Material, Mesh, MeshGeometry, SceneGraph};
    use crate::viewer::HeadlessSurface;

    /// Serves fixed assets; `None` fails that load
    struct TestLoader {
        model: Option<LoadedModel>,
        environment: Option<EnvironmentMap>,
        gate: Option<Arc<Notify>>,
    }

    fn not_found(what: &str) -> AssetError {
        AssetError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, what.to_string()))
    }

    impl AssetLoader for TestLoader {
        fn load_environment(&self, _id: &str) -> BoxFuture<'static, Result<EnvironmentMap, AssetError>> {
            let environment = self.environment.clone();
            Box::pin(async move { environment.ok_or_else(|| not_found("environment")) })
        }

        fn load_model(
            &self,
            _id: &str,
            _options: ModelOptions,
        ) -> BoxFuture<'static, Result<LoadedModel, AssetError>> {
            let model = self.model.clone();
            let gate = self.gate.clone();
            Box::pin(async move {
                if let Some(gate) = gate {
                    gate.notified().await;
                }
                model.ok_or_else(|| not_found("model"))
            })
        }
    }

    fn cube(material: &str) -> Mesh {
        Mesh::new(
            Arc::new(MeshGeometry::cuboid(Vec3::ONE)),
            Arc::new(Material::standard(material)),
        )
    }

    /// Record player stand-in: the dust cover sits at the origin, every other
    /// part is parked out of the camera's line of sight
    fn test_model() -> LoadedModel {
        let mut graph = SceneGraph::new();
        let root = graph.add_node("Scene", None);
        let cover = graph.add_mesh("DustCover", Some(root), cube("acrylic"));
        for (i, name) in ["Base", "Feet", "Cylinder004", "VinylBase", "Gaveta", "Pickup"]
            .into_iter()
            .enumerate()
        {
            let id = graph.add_mesh(name, Some(root), cube(&format!("{name}_shipped")));
            if let Some(node) = graph.node_mut(id) {
                node.transform.translation = Vec3::new(0.0, -50.0 - 5.0 * i as f32, 0.0);
            }
        }

        let open = AnimationClip::new(
            "Open.001",
            vec![Track {
                node: cover,
                times: vec![0.0, 1.0],
                values: TrackValues::Rotation(vec![Quat::IDENTITY, Quat::from_rotation_x(-1.0)]),
                interpolation: Interpolation::Linear,
            }],
        );
        let music = AnimationClip::new(
            MUSIC_CLIP,
            vec![Track {
                node: root,
                times: vec![0.0, 2.0],
                values: TrackValues::Scale(vec![Vec3::ONE, Vec3::ONE]),
                interpolation: Interpolation::Step,
            }],
        );
        LoadedModel {
            graph,
            clips: vec![open, music],
        }
    }

    fn test_environment() -> EnvironmentMap {
        EnvironmentMap {
            width: 1,
            height: 1,
            texels: vec![[1.0, 1.0, 1.0, 1.0]],
            mapping: EnvironmentMapping::Equirectangular,
        }
    }

    fn viewer_with(loader: TestLoader, options: ViewerOptions) -> Viewer<HeadlessSurface> {
        Viewer::new(
            Some(HeadlessSurface::new()),
            LayoutBox::new(400, 300),
            options,
            Arc::new(loader),
            &Handle::current(),
        )
        .unwrap()
        .with_audio_cues(AudioCues::cue_music)
    }

    async fn loaded_viewer(options: ViewerOptions) -> Viewer<HeadlessSurface> {
        let mut viewer = viewer_with(
            TestLoader {
                model: Some(test_model()),
                environment: Some(test_environment()),
                gate: None,
            },
            options,
        );
        viewer.wait_for_assets().await;
        viewer
    }

    fn assert_parts_use(viewer: &Viewer<HeadlessSurface>, expected: impl Fn(PartKey) -> MaterialHandle) {
        for part in PartKey::ALL {
            let current = viewer.part_material(part).unwrap();
            assert!(
                Arc::ptr_eq(current, &expected(part)),
                "{part:?} shows {}",
                current.name
            );
        }
    }

    #[tokio::test]
    async fn test_missing_render_target() {
        let result = Viewer::<HeadlessSurface>::new(
            None,
            LayoutBox::new(400, 300),
            ViewerOptions::default(),
            Arc::new(TestLoader {
                model: None,
                environment: None,
                gate: None,
            }),
            &Handle::current(),
        );
        assert_eq!(result.unwrap_err(), ViewerError::MissingRenderTarget);
    }

    #[tokio::test]
    async fn test_luxo_with_failed_environment() {
        let mut viewer = viewer_with(
            TestLoader {
                model: Some(test_model()),
                environment: None,
                gate: None,
            },
            ViewerOptions::default().with_initial_preset("luxo"),
        );
        viewer.wait_for_assets().await;

        assert!(viewer.is_loaded());
        assert!(viewer.scene().environment.is_none());
        assert!(viewer.scene().background.is_none());
        assert_eq!(viewer.parts().len(), 4);

        let luxo = viewer.library().preset("luxo").unwrap().clone();
        assert_parts_use(&viewer, |part| luxo.material(part).unwrap().clone());

        assert!(viewer.frame(0.016));
        assert!(viewer.frame(0.016));
        assert_eq!(viewer.surface().frames(), 2);
        assert_eq!(viewer.surface().last_frame().unwrap().mesh_count, 7);
    }

    #[tokio::test]
    async fn test_environment_sets_white_background() {
        let viewer = loaded_viewer(ViewerOptions::default()).await;
        assert!(viewer.scene().environment.is_some());
        assert_eq!(viewer.scene().background, Some(Color::WHITE));
        assert_eq!(viewer.scene().lights.len(), 1);
        assert_eq!(viewer.scene().lights[0].intensity, 3.0);
    }

    #[tokio::test]
    async fn test_render_loop_runs_when_both_loads_fail() {
        let mut viewer = viewer_with(
            TestLoader {
                model: None,
                environment: None,
                gate: None,
            },
            ViewerOptions::default(),
        );
        viewer.wait_for_assets().await;
        assert!(viewer.is_loaded());
        assert!(viewer.animation_manager().is_none());
        assert!(viewer.parts().is_empty());
        assert!(viewer.frame(0.016));
        assert_eq!(viewer.surface().last_frame().unwrap().mesh_count, 0);
        assert!(!viewer.set_preset("festa"));
        assert!(viewer.set_preset("luxo"));
    }

    #[tokio::test]
    async fn test_no_frames_before_load_settles() {
        let gate = Arc::new(Notify::new());
        let mut viewer = viewer_with(
            TestLoader {
                model: Some(test_model()),
                environment: None,
                gate: Some(gate.clone()),
            },
            ViewerOptions::default(),
        );
        assert!(!viewer.frame(0.016));
        assert_eq!(viewer.surface().frames(), 0);

        gate.notify_one();
        viewer.wait_for_assets().await;
        assert!(viewer.frame(0.016));
    }

    #[tokio::test]
    async fn test_default_restores_snapshot_instances() {
        let mut viewer = loaded_viewer(ViewerOptions::default()).await;
        let shipped: Vec<_> = PartKey::ALL
            .iter()
            .map(|p| viewer.part_material(*p).unwrap().name.clone())
            .collect();

        assert!(viewer.set_preset("moderno"));
        assert_eq!(viewer.part_material(PartKey::Base).unwrap().name, "plastic");

        assert!(viewer.set_preset(DEFAULT_PRESET));
        let snapshot = viewer.snapshot().clone();
        assert_parts_use(&viewer, |part| snapshot.get(part).unwrap().clone());
        let restored: Vec<_> = PartKey::ALL
            .iter()
            .map(|p| viewer.part_material(*p).unwrap().name.clone())
            .collect();
        assert_eq!(restored, shipped);
    }

    #[tokio::test]
    async fn test_unknown_preset_changes_nothing() {
        let mut viewer = loaded_viewer(ViewerOptions::default().with_initial_preset("vintage")).await;
        let copper = viewer.library().material("copper").unwrap().clone();
        let marble = viewer.library().material("marble").unwrap().clone();
        viewer.set_custom_material(PartKey::Base, CustomOverride::Material(marble.clone()));

        assert!(!viewer.set_preset("festa"));
        assert_eq!(viewer.current_preset(), "vintage");
        assert!(viewer.custom_material(PartKey::Base).is_some());
        assert!(Arc::ptr_eq(viewer.part_material(PartKey::Base).unwrap(), &marble));
        assert!(Arc::ptr_eq(viewer.part_material(PartKey::Feet).unwrap(), &copper));
    }

    #[tokio::test]
    async fn test_preset_switch_clears_overrides() {
        let mut viewer = loaded_viewer(ViewerOptions::default()).await;
        let copper = viewer.library().material("copper").unwrap().clone();
        viewer.set_custom_material(PartKey::Feet, CustomOverride::Material(copper));
        viewer.set_custom_material(PartKey::Base, CustomOverride::Original);

        assert!(viewer.set_preset("luxo"));
        assert!(viewer.custom_material(PartKey::Feet).is_none());
        assert!(viewer.custom_material(PartKey::Base).is_none());
        let luxo = viewer.library().preset("luxo").unwrap().clone();
        assert_parts_use(&viewer, |part| luxo.material(part).unwrap().clone());
    }

    #[tokio::test]
    async fn test_clearing_override_returns_to_active_preset() {
        let mut viewer = loaded_viewer(ViewerOptions::default().with_initial_preset("moderno")).await;
        let plastic = viewer.library().material("plastic").unwrap().clone();
        let marble = viewer.library().material("marble").unwrap().clone();

        viewer.set_custom_material(PartKey::Base, CustomOverride::Material(marble.clone()));
        assert!(Arc::ptr_eq(viewer.part_material(PartKey::Base).unwrap(), &marble));

        viewer.clear_custom_material(PartKey::Base);
        assert!(Arc::ptr_eq(viewer.part_material(PartKey::Base).unwrap(), &plastic));
        assert!(!Arc::ptr_eq(
            viewer.part_material(PartKey::Base).unwrap(),
            viewer.snapshot().get(PartKey::Base).unwrap()
        ));
    }

    #[tokio::test]
    async fn test_original_override_and_clear_all() {
        let mut viewer = loaded_viewer(ViewerOptions::default().with_initial_preset("luxo")).await;
        viewer.set_custom_material(PartKey::Needle, CustomOverride::Original);
        assert!(Arc::ptr_eq(
            viewer.part_material(PartKey::Needle).unwrap(),
            viewer.snapshot().get(PartKey::Needle).unwrap()
        ));

        // Overrides survive preset reapplication until cleared
        let chrome = viewer.library().material("chrome").unwrap().clone();
        viewer.set_custom_material(PartKey::Feet, CustomOverride::Material(chrome.clone()));
        viewer.clear_custom_material(PartKey::Base);
        assert!(Arc::ptr_eq(viewer.part_material(PartKey::Feet).unwrap(), &chrome));

        viewer.clear_all_custom_materials();
        let gold = viewer.library().material("gold").unwrap().clone();
        assert!(Arc::ptr_eq(viewer.part_material(PartKey::Needle).unwrap(), &gold));
        assert!(Arc::ptr_eq(viewer.part_material(PartKey::Feet).unwrap(), &gold));
    }

    #[tokio::test]
    async fn test_preset_requested_before_load_is_applied_on_load() {
        let gate = Arc::new(Notify::new());
        let mut viewer = viewer_with(
            TestLoader {
                model: Some(test_model()),
                environment: None,
                gate: Some(gate.clone()),
            },
            ViewerOptions::default(),
        );
        assert!(viewer.set_preset("vintage"));
        assert_eq!(viewer.current_preset(), "vintage");

        gate.notify_one();
        viewer.wait_for_assets().await;
        let wood = viewer.library().material("wood").unwrap().clone();
        assert!(Arc::ptr_eq(viewer.part_material(PartKey::Base).unwrap(), &wood));
    }

    #[tokio::test]
    async fn test_unknown_initial_preset_falls_back_to_default() {
        let viewer = loaded_viewer(ViewerOptions::default().with_initial_preset("festa")).await;
        assert_eq!(viewer.current_preset(), DEFAULT_PRESET);
        assert_eq!(viewer.part_material(PartKey::Base).unwrap().name, "Base_shipped");
    }

    #[tokio::test]
    async fn test_dispose_before_load_drops_assets() {
        let gate = Arc::new(Notify::new());
        let mut viewer = viewer_with(
            TestLoader {
                model: Some(test_model()),
                environment: Some(test_environment()),
                gate: Some(gate.clone()),
            },
            ViewerOptions::default(),
        );
        viewer.dispose();
        viewer.dispose();

        gate.notify_one();
        viewer.wait_for_assets().await;
        assert!(!viewer.is_loaded());
        assert_eq!(viewer.scene().mesh_count(), 0);
        assert!(viewer.scene().environment.is_none());
        assert!(!viewer.frame(0.016));
        assert!(viewer.surface().is_disposed());
    }

    #[tokio::test]
    async fn test_load_task_finishes_after_viewer_is_dropped() {
        let gate = Arc::new(Notify::new());
        let viewer = viewer_with(
            TestLoader {
                model: Some(test_model()),
                environment: None,
                gate: Some(gate.clone()),
            },
            ViewerOptions::default(),
        );
        drop(viewer);

        // The pending load holds the other gate handle until it completes
        gate.notify_one();
        for _ in 0..16 {
            if Arc::strong_count(&gate) == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(Arc::strong_count(&gate), 1);
    }

    #[tokio::test]
    async fn test_dispose_tears_down_managers() {
        let mut viewer = loaded_viewer(ViewerOptions::default()).await;
        viewer.dispose();
        assert!(viewer.is_disposed());
        assert!(viewer.raycast_manager().is_disposed());
        assert!(viewer.animation_manager().unwrap().is_disposed());
        assert!(!viewer.controls().is_enabled());
        assert!(viewer.surface().is_disposed());

        viewer.resize(LayoutBox::new(10, 10));
        assert_eq!(viewer.surface().size(), (400, 300));
        assert!(viewer.pointer_down(&PointerEvent::primary(200.0, 150.0)).is_none());
    }

    #[tokio::test]
    async fn test_resize_uses_width_when_height_missing() {
        let mut viewer = loaded_viewer(ViewerOptions::default()).await;
        assert_eq!(viewer.surface().size(), (400, 300));
        assert!((viewer.camera().aspect - 4.0 / 3.0).abs() < 1e-6);

        viewer.resize(LayoutBox::new(500, 0));
        assert_eq!(viewer.surface().size(), (500, 500));
        assert_eq!(viewer.camera().aspect, 1.0);
    }

    #[tokio::test]
    async fn test_click_on_dust_cover_plays_open() {
        let mut viewer = loaded_viewer(ViewerOptions::default()).await;
        let dispatch = viewer.pointer_down(&PointerEvent::primary(200.0, 150.0)).unwrap();
        assert_eq!(dispatch.part, InteractivePart::DustCover);
        assert_eq!(dispatch.clip, "Open.001");
        assert!(!dispatch.reversed);
        assert!(dispatch.action.is_some());
        assert!(viewer.animation_manager().unwrap().is_playing("Open.001"));

        let again = viewer.pointer_down(&PointerEvent::primary(200.0, 150.0)).unwrap();
        assert!(again.reversed);

        // Empty corner of the surface
        assert!(viewer.pointer_down(&PointerEvent::primary(1.0, 1.0)).is_none());
    }

    /// [`test_model`] with the pickup moved into view next to the cover and a
    /// one-second "Play" clip on it
    fn model_with_pickup_in_view() -> LoadedModel {
        let mut model = test_model();
        let pickup = model.graph.find_by_name("Pickup").unwrap();
        if let Some(node) = model.graph.node_mut(pickup) {
            node.transform.translation = PICKUP_IN_VIEW;
        }
        model.clips.push(AnimationClip::new(
            "Play",
            vec![Track {
                node: pickup,
                times: vec![0.0, 1.0],
                values: TrackValues::Translation(vec![PICKUP_IN_VIEW, PICKUP_IN_VIEW]),
                interpolation: Interpolation::Linear,
            }],
        ));
        model
    }

    const PICKUP_IN_VIEW: Vec3 = Vec3::new(0.0, 0.0, 6.0);

    /// Primary press over the projection of `world` on the 400x300 surface
    fn press_at(viewer: &Viewer<HeadlessSurface>, world: Vec3) -> PointerEvent {
        let ndc = viewer.camera().view_projection_matrix().project_point3(world);
        PointerEvent::primary((ndc.x + 1.0) * 0.5 * 400.0, (1.0 - ndc.y) * 0.5 * 300.0)
    }

    #[tokio::test]
    async fn test_click_on_pickup_drives_music() {
        let mut viewer = viewer_with(
            TestLoader {
                model: Some(model_with_pickup_in_view()),
                environment: Some(test_environment()),
                gate: None,
            },
            ViewerOptions::default(),
        );
        viewer.wait_for_assets().await;

        let press = press_at(&viewer, PICKUP_IN_VIEW);
        let dispatch = viewer.pointer_down(&press).unwrap();
        assert_eq!(dispatch.part, InteractivePart::Pickup);
        assert_eq!(dispatch.clip, "Play");
        assert!(!dispatch.reversed);

        // Music follows once the arm has swung in
        assert!(!viewer.animation_manager().unwrap().is_playing(MUSIC_CLIP));
        assert!(viewer.frame(1.5));
        let manager = viewer.animation_manager().unwrap();
        assert!(manager.is_playing(MUSIC_CLIP));
        let music = manager.audio().get(MUSIC_CLIP).unwrap();
        assert!(!music.is_paused());
        assert!(!music.is_muted());

        viewer.set_audio_muted(true);
        let music = viewer.animation_manager().unwrap().audio().get(MUSIC_CLIP).unwrap();
        assert!(music.is_muted());
        assert!(!music.is_paused());

        // Reverse swing pauses the music when it lands
        let press = press_at(&viewer, PICKUP_IN_VIEW);
        let dispatch = viewer.pointer_down(&press).unwrap();
        assert_eq!(dispatch.part, InteractivePart::Pickup);
        assert!(dispatch.reversed);
        assert!(viewer.frame(1.5));
        let manager = viewer.animation_manager().unwrap();
        assert!(!manager.is_playing(MUSIC_CLIP));
        let music = manager.audio().get(MUSIC_CLIP).unwrap();
        assert!(music.is_paused());
        assert!(music.is_muted());
    }

    #[tokio::test]
    async fn test_builtin_cues_without_music_file_play_silently() {
        let mut viewer = Viewer::new(
            Some(HeadlessSurface::new()),
            LayoutBox::new(400, 300),
            ViewerOptions::default().with_texture_root("/nonexistent/assets"),
            Arc::new(TestLoader {
                model: Some(test_model()),
                environment: None,
                gate: None,
            }),
            &Handle::current(),
        )
        .unwrap();
        viewer.wait_for_assets().await;

        let manager = viewer.animation_manager().unwrap();
        assert!(manager.audio().get(MUSIC_CLIP).is_none());
        assert!(!viewer.set_audio_muted(false));
    }

    #[tokio::test]
    async fn test_mute_handler_sees_every_change() {
        let mut viewer = loaded_viewer(ViewerOptions::default()).await;
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        viewer.set_audio_state_handler(move |muted| sink.borrow_mut().push(muted));
        assert_eq!(*seen.borrow(), vec![false]);

        assert!(viewer.set_audio_muted(true));
        assert!(viewer.is_audio_muted());
        assert!(viewer.animation_manager().unwrap().is_audio_muted());
        assert!(!viewer.toggle_audio_muted());
        assert_eq!(*seen.borrow(), vec![false, true, false]);

        let music = viewer.animation_manager().unwrap().audio().get(MUSIC_CLIP).unwrap();
        assert!(!music.is_muted());
    }

    #[tokio::test]
    async fn test_initial_mute_reaches_animation_manager() {
        let viewer = loaded_viewer(ViewerOptions::default().with_audio_muted(true)).await;
        assert!(viewer.animation_manager().unwrap().is_audio_muted());
    }
}
