pub mod autosave;
pub mod canvas;
pub mod config;
pub mod driver;
pub mod error;
pub mod history;
pub mod services;
pub mod session;
pub mod shortcuts;
pub mod timer;
pub mod tools;
pub mod transform;

pub use canvas::{Canvas, ChangeEvent, ChangeKind, ChangeOrigin, SceneMutation, TextEdit};
pub use config::EditorConfig;
pub use driver::SessionDriver;
pub use error::{EditorError, EditorResult};
pub use services::{
    AssetInfo, AssetPipeline, Entitlements, PlanEntitlements, PlanTier, Project, ProjectPatch,
    ProjectStore, ServiceError, UploadedAsset,
};
pub use session::{EditorSession, Notice, SaveReason, SaveRequest, Ticket};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use timer::Millis;
pub use tools::{ToolId, ToolMode};
pub use transform::{ExtendAmount, ExtendDirection, TransformOp, TransformRequest};
