use crate::core::acquisition::encode_frame_as_jpeg;
use crate::core::{CameraConstraints, CameraDevice, CameraStream, ImagePayload};
use crate::utils::error::{MarketError, Result};

/// 持有至多一個相機串流；結束、取消或被丟棄時一定會停止串流
pub struct CameraSession {
    constraints: CameraConstraints,
    active: Option<Box<dyn CameraStream>>,
}

impl Default for CameraSession {
    fn default() -> Self {
        Self::new(CameraConstraints::default())
    }
}

impl CameraSession {
    pub fn new(constraints: CameraConstraints) -> Self {
        Self {
            constraints,
            active: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.active.as_ref().is_some_and(|s| s.is_active())
    }

    /// 開啟新串流；已有串流時先停止舊的
    pub async fn start<D: CameraDevice + ?Sized>(&mut self, device: &D) -> Result<()> {
        if self.active.is_some() {
            tracing::debug!("Stopping previous camera stream before starting a new one");
            self.stop_active();
        }

        match device.open(self.constraints).await {
            Ok(stream) => {
                tracing::debug!("Camera stream opened ({:?})", self.constraints.facing);
                self.active = Some(stream);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Camera access failed: {}", e);
                Err(e)
            }
        }
    }

    /// 擷取目前畫面並釋放串流
    pub fn capture(&mut self) -> Result<ImagePayload> {
        let mut stream = self
            .active
            .take()
            .ok_or_else(|| MarketError::validation("camera", "no camera stream is open"))?;

        let frame = stream.capture_frame();
        stream.stop();
        encode_frame_as_jpeg(&frame?)
    }

    pub fn cancel(&mut self) {
        self.stop_active();
    }

    fn stop_active(&mut self) {
        if let Some(mut stream) = self.active.take() {
            stream.stop();
            tracing::debug!("Camera stream stopped");
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.stop_active();
    }
}
