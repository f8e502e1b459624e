use crate::core::{CameraConstraints, CameraDevice, CameraStream};
use crate::utils::error::{MarketError, Result};
use async_trait::async_trait;

/// 沒有可用相機的主機 (例如終端機)；一律回報 PermissionDenied，讓呼叫端改用檔案
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableCamera;

#[async_trait]
impl CameraDevice for UnavailableCamera {
    async fn open(&self, constraints: CameraConstraints) -> Result<Box<dyn CameraStream>> {
        tracing::debug!("Camera requested with {:?}", constraints);
        Err(MarketError::PermissionDenied {
            message: "no camera device is available on this host".to_string(),
        })
    }
}
