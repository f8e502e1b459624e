pub mod acquisition;
pub mod camera;
pub mod draft;
pub mod feed;
pub mod sell_flow;
pub mod session;

pub use crate::domain::model::{
    AIAnalysisResult, Condition, ImagePayload, Listing, Theme, User,
};
pub use crate::domain::ports::{
    CameraConstraints, CameraDevice, CameraFrame, CameraStream, ConfigProvider, FacingMode,
    ImageAnalyzer, PreferenceStore,
};
pub use crate::utils::error::Result;
