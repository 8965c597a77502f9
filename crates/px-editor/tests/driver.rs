//! Integration tests: async session driver (px-editor).
//!
//! Runs `SessionDriver` against in-memory store and pipeline doubles to
//! check that network results and failures land in the session correctly.

use pretty_assertions::assert_eq;
use px_core::presets::RetouchPreset;
use px_editor::*;
use std::cell::{Cell, RefCell};

const ORIGINAL: &str = "https://ik.imagekit.io/px/beach.png";

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Default)]
struct MemoryStore {
    project: RefCell<Option<Project>>,
    saves: RefCell<Vec<ProjectPatch>>,
    fail_saves: Cell<bool>,
}

impl MemoryStore {
    fn with(project: Project) -> Self {
        Self {
            project: RefCell::new(Some(project)),
            ..Self::default()
        }
    }
}

impl ProjectStore for MemoryStore {
    async fn load(&self, project_id: &str) -> Result<Project, ServiceError> {
        self.project
            .borrow()
            .clone()
            .filter(|p| p.id == project_id)
            .ok_or_else(|| ServiceError::new(format!("project {project_id} not found")))
    }

    async fn save(&self, _project_id: &str, patch: &ProjectPatch) -> Result<(), ServiceError> {
        if self.fail_saves.get() {
            return Err(ServiceError::new("store unavailable"));
        }
        if let Some(project) = self.project.borrow_mut().as_mut() {
            project.apply_patch(patch);
        }
        self.saves.borrow_mut().push(patch.clone());
        Ok(())
    }
}

struct FakePipeline {
    size: (u32, u32),
    fail_transforms: bool,
    requested: RefCell<Vec<String>>,
}

impl FakePipeline {
    fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            fail_transforms: false,
            requested: RefCell::new(Vec::new()),
        }
    }
}

impl AssetPipeline for FakePipeline {
    async fn load(&self, url: &str) -> Result<AssetInfo, ServiceError> {
        Ok(AssetInfo::new(url, self.size.0, self.size.1))
    }

    async fn transform(&self, url: &str) -> Result<AssetInfo, ServiceError> {
        self.requested.borrow_mut().push(url.to_string());
        if self.fail_transforms {
            return Err(ServiceError::new("pipeline timed out"));
        }
        Ok(AssetInfo::new(url, self.size.0, self.size.1))
    }

    async fn upload(&self, file_name: &str, _bytes: &[u8]) -> Result<UploadedAsset, ServiceError> {
        Ok(UploadedAsset {
            url: format!("https://ik.imagekit.io/px/{file_name}"),
            thumbnail_url: format!("https://ik.imagekit.io/px/{file_name}?tr=w-300"),
        })
    }
}

fn project() -> Project {
    Project {
        id: "proj_9".into(),
        title: "Beach".into(),
        width: 1000,
        height: 500,
        original_image_url: Some(ORIGINAL.into()),
        current_image_url: None,
        thumbnail_url: None,
        canvas_state: None,
        folder_id: None,
        active_transformations: None,
        background_removed: false,
    }
}

async fn open(tier: PlanTier, pipeline: FakePipeline) -> SessionDriver<MemoryStore, FakePipeline> {
    init_logs();
    SessionDriver::open(
        MemoryStore::with(project()),
        pipeline,
        "proj_9",
        EditorConfig::default(),
        PlanEntitlements::new(tier),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn open_places_the_project_image() {
    let driver = open(PlanTier::Free, FakePipeline::new(2000, 500)).await;
    let scene = driver.session().scene();
    assert_eq!(scene.objects.len(), 1);
    let image = &scene.objects[0];
    assert_eq!(image.as_image().unwrap().src, ORIGINAL);
    assert_eq!(image.geometry.scale_x, 0.5);
}

#[tokio::test]
async fn open_unknown_project_is_a_service_error() {
    init_logs();
    let result = SessionDriver::open(
        MemoryStore::with(project()),
        FakePipeline::new(10, 10),
        "missing",
        EditorConfig::default(),
        PlanEntitlements::default(),
    )
    .await;
    assert!(matches!(result, Err(EditorError::Service { .. })));
}

#[tokio::test]
async fn autosave_reaches_the_store() {
    let mut driver = open(PlanTier::Free, FakePipeline::new(1000, 500)).await;
    driver.session_mut().add_text("Hello").unwrap();
    driver.tick(1_999).await.unwrap();
    assert!(driver.store().saves.borrow().is_empty());

    driver.tick(2_000).await.unwrap();
    assert_eq!(driver.store().saves.borrow().len(), 1);
    let persisted = driver.session().autosave().last_persisted().map(str::to_string);
    let stored = driver.store().project.borrow().as_ref().unwrap().canvas_state.clone();
    assert_eq!(persisted, stored.map(|v| v.to_string()));
}

#[tokio::test]
async fn retouch_persists_provenance() {
    let mut driver = open(PlanTier::Pro, FakePipeline::new(1000, 500)).await;
    let new_id = driver
        .transform(TransformOp::Retouch(RetouchPreset::AiRetouch))
        .await
        .unwrap()
        .unwrap();

    let expected = format!("{ORIGINAL}?tr=e-retouch");
    assert_eq!(*driver.pipeline().requested.borrow(), vec![expected.clone()]);
    let session = driver.session();
    assert_eq!(session.selected(), Some(new_id));
    assert_eq!(session.project().current_image_url.as_deref(), Some(expected.as_str()));
    assert_eq!(session.project().active_transformations.as_deref(), Some("e-retouch"));
    assert!(!session.is_processing());

    let saves = driver.store().saves.borrow();
    assert_eq!(saves.len(), 1);
    assert!(saves[0].canvas_state.is_some());
}

#[tokio::test]
async fn failed_transform_keeps_the_scene() {
    let mut pipeline = FakePipeline::new(1000, 500);
    pipeline.fail_transforms = true;
    let mut driver = open(PlanTier::Pro, pipeline).await;
    let before = driver.session().canvas().serialize().unwrap();

    let result = driver.transform(TransformOp::RemoveBackground).await;
    assert!(matches!(result, Err(EditorError::Service { .. })));
    assert_eq!(driver.session().canvas().serialize().unwrap(), before);
    assert!(!driver.session().is_processing());
    assert!(driver.store().saves.borrow().is_empty());
    assert_eq!(
        driver.session_mut().take_notices(),
        vec![Notice::Error("Failed to remove background. Please try again.".into())]
    );
}

#[tokio::test]
async fn denied_transform_never_calls_the_pipeline() {
    let mut driver = open(PlanTier::Free, FakePipeline::new(1000, 500)).await;
    let result = driver
        .transform(TransformOp::Extend {
            direction: ExtendDirection::Right,
            amount: ExtendAmount::default(),
        })
        .await
        .unwrap();
    assert_eq!(result, None);
    assert!(driver.pipeline().requested.borrow().is_empty());
}

#[tokio::test]
async fn background_image_covers_the_canvas() {
    let mut driver = open(PlanTier::Pro, FakePipeline::new(500, 500)).await;
    let url = "https://images.example/dunes.jpg".to_string();
    let result = driver
        .transform(TransformOp::BackgroundImage { url: url.clone() })
        .await
        .unwrap();
    assert_eq!(result, None);

    let px_core::Background::Image(bg) = &driver.session().scene().background else {
        panic!("expected an image background");
    };
    assert_eq!(bg.src, url);
    assert_eq!(bg.geometry.scale_x, 2.0);
}

#[tokio::test]
async fn reset_rewrites_the_baseline() {
    let mut driver = open(PlanTier::Pro, FakePipeline::new(1000, 500)).await;
    driver
        .transform(TransformOp::Retouch(RetouchPreset::AiUpscale))
        .await
        .unwrap();
    driver.session_mut().add_text("note").unwrap();

    driver.reset_to_original().await.unwrap().unwrap();
    let session = driver.session();
    assert_eq!(session.scene().objects.len(), 1);
    assert_eq!(session.history().undo_depth(), 1);
    assert_eq!(session.project().current_image_url.as_deref(), Some(ORIGINAL));
    assert_eq!(session.project().active_transformations, None);
    assert!(!session.project().background_removed);

    let stored = driver.store().project.borrow();
    assert_eq!(stored.as_ref().unwrap().current_image_url.as_deref(), Some(ORIGINAL));
}

#[tokio::test]
async fn import_uploads_then_adds() {
    let mut driver = open(PlanTier::Free, FakePipeline::new(200, 100)).await;
    let id = driver.import_image("logo.png", b"\x89PNG").await.unwrap();
    let obj = driver.session().canvas().get(id).unwrap();
    assert_eq!(obj.as_image().unwrap().src, "https://ik.imagekit.io/px/logo.png");
    assert_eq!(driver.session().scene().objects.len(), 2);
}

#[tokio::test]
async fn store_failures_become_notices() {
    let mut driver = open(PlanTier::Free, FakePipeline::new(1000, 500)).await;
    driver.store().fail_saves.set(true);
    driver.save_now().await.unwrap();
    assert_eq!(
        driver.session_mut().take_notices(),
        vec![Notice::Error("Failed to save project. Please try again.".into())]
    );

    driver.store().fail_saves.set(false);
    driver.save_now().await.unwrap();
    assert_eq!(driver.store().saves.borrow().len(), 1);
}

#[tokio::test]
async fn close_flushes_pending_saves() {
    let mut driver = open(PlanTier::Free, FakePipeline::new(1000, 500)).await;
    driver.session_mut().resize_canvas(1200, 500).unwrap();
    let session = driver.close().await.unwrap();
    assert!(session.is_closed());
    assert_eq!(session.project().width, 1200);
}

#[tokio::test]
async fn save_during_crop_stores_an_editable_image() {
    let mut driver = open(PlanTier::Free, FakePipeline::new(1000, 500)).await;
    let image = driver.session().scene().objects[0].id;
    driver.session_mut().enter_crop(None).unwrap();
    driver.save_now().await.unwrap();

    let stored = driver.store().project.borrow().clone().unwrap();
    let reopened =
        EditorSession::open(stored, EditorConfig::default(), PlanEntitlements::default()).unwrap();
    let restored = reopened.canvas().get(image).unwrap();
    assert!(restored.selectable && restored.evented);
    assert_eq!(reopened.scene().objects.len(), 1);
}
