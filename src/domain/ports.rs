use crate::domain::model::{AIAnalysisResult, ImagePayload};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// 本機偏好設定的 key-value 存放處 (目前只存 theme)
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> impl std::future::Future<Output = Result<Option<String>>> + Send;
    fn set(&self, key: &str, value: &str)
        -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn ai_endpoint(&self) -> &str;
    fn model(&self) -> &str;
    fn api_key(&self) -> Option<&str>;
    fn instruction(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn max_upload_bytes(&self) -> usize;
    fn state_dir(&self) -> &str;
}

#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    async fn analyze(&self, image: &ImagePayload) -> Result<AIAnalysisResult>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacingMode {
    User,
    #[default]
    Environment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraConstraints {
    pub facing: FacingMode,
    pub audio: bool,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
            audio: false,
        }
    }
}

/// 一張 RGB8 的畫面
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

pub trait CameraStream: Send {
    fn capture_frame(&mut self) -> Result<CameraFrame>;
    fn stop(&mut self);
    fn is_active(&self) -> bool;
}

#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// 平台拒絕時回傳 `MarketError::PermissionDenied`
    async fn open(&self, constraints: CameraConstraints) -> Result<Box<dyn CameraStream>>;
}
