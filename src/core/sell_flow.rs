use crate::core::acquisition::ImageAcquirer;
use crate::core::camera::CameraSession;
use crate::core::draft::{EnrichmentOutcome, ListingDraft, RequestToken};
use crate::core::feed::ListingFeed;
use crate::core::session::Session;
use crate::core::{AIAnalysisResult, CameraDevice, ImageAnalyzer, ImagePayload};
use crate::utils::error::{MarketError, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use uuid::Uuid;

type Completion = (RequestToken, Result<AIAnalysisResult>);

/// 刊登流程：取得照片 → 背景 AI 分析 → 合併進草稿 → 發佈到 feed
pub struct SellFlow<A: ImageAnalyzer + 'static> {
    analyzer: Arc<A>,
    draft: ListingDraft,
    camera: CameraSession,
    in_flight: Option<JoinHandle<()>>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl<A: ImageAnalyzer + 'static> SellFlow<A> {
    pub fn new(analyzer: Arc<A>) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            analyzer,
            draft: ListingDraft::new(),
            camera: CameraSession::default(),
            in_flight: None,
            completions_tx,
            completions_rx,
        }
    }

    pub fn draft(&self) -> &ListingDraft {
        &self.draft
    }

    /// 手動編輯欄位用
    pub fn draft_mut(&mut self) -> &mut ListingDraft {
        &mut self.draft
    }

    pub fn is_submittable(&self) -> bool {
        self.draft.is_submittable()
    }

    pub async fn attach_file<P: AsRef<Path>>(
        &mut self,
        acquirer: &ImageAcquirer,
        path: P,
    ) -> Result<RequestToken> {
        let image = acquirer.from_file(path).await?;
        Ok(self.submit_image(image))
    }

    pub async fn open_camera<D: CameraDevice + ?Sized>(&mut self, device: &D) -> Result<()> {
        self.camera.start(device).await
    }

    pub fn camera_is_open(&self) -> bool {
        self.camera.is_open()
    }

    pub fn close_camera(&mut self) {
        self.camera.cancel();
    }

    /// 擷取畫面 (同時關閉相機) 並送出分析
    pub fn capture_photo(&mut self) -> Result<RequestToken> {
        let image = self.camera.capture()?;
        Ok(self.submit_image(image))
    }

    /// 換上新照片並開始分析；仍在進行的舊請求會被中止，其結果也不會被套用
    pub fn submit_image(&mut self, image: ImagePayload) -> RequestToken {
        self.draft.set_image(image.clone());
        let token = self.draft.begin_enrichment();

        if let Some(handle) = self.in_flight.take() {
            if !handle.is_finished() {
                tracing::debug!("Aborting superseded analysis before #{}", token.generation());
            }
            handle.abort();
        }

        let analyzer = Arc::clone(&self.analyzer);
        let tx = self.completions_tx.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let result = analyzer.analyze(&image).await;
            // 接收端不在代表流程已結束
            let _ = tx.send((token, result));
        }));

        tracing::info!("🤖 AI analysis #{} started", token.generation());
        token
    }

    /// 等待下一個分析結果並合併；沒有進行中的請求時回傳 None
    pub async fn next_completion(&mut self) -> Option<EnrichmentOutcome> {
        if !self.draft.is_pending() {
            return None;
        }
        let completion = tokio::select! {
            biased;
            received = self.completions_rx.recv() => received,
            joined = join_in_flight(&mut self.in_flight) => {
                self.in_flight = None;
                match joined {
                    // 任務正常結束時結果已經在 channel 裡
                    Ok(()) => self.completions_rx.recv().await,
                    Err(e) => {
                        tracing::warn!("AI analysis task ended without a result: {}", e);
                        self.draft.pending_token().map(|token| {
                            let reason = format!("analysis task ended unexpectedly: {}", e);
                            (token, Err(MarketError::enrichment(reason)))
                        })
                    }
                }
            }
        };
        let (token, result) = completion?;
        let outcome = self.draft.complete_enrichment(token, result);
        tracing::debug!("Analysis #{} completed: {:?}", token.generation(), outcome);
        Some(outcome)
    }

    /// 等到目前的請求結束，略過過期的結果
    pub async fn settle(&mut self) -> Option<EnrichmentOutcome> {
        let mut last = None;
        while let Some(outcome) = self.next_completion().await {
            if outcome != EnrichmentOutcome::Stale {
                last = Some(outcome);
            }
        }
        last
    }

    pub fn publish(&mut self, feed: &mut ListingFeed, session: &Session) -> Result<Uuid> {
        self.draft.validate_for_publish()?;
        let listing = self.draft.to_listing(session.current_user())?;
        let id = listing.id;

        tracing::info!(
            "📦 Published '{}' for ₹{} by {}",
            listing.title,
            listing.price,
            listing.seller_name
        );
        feed.publish(listing);
        self.reset();
        Ok(id)
    }

    pub fn cancel(&mut self) {
        tracing::debug!("Sell flow cancelled, draft discarded");
        self.reset();
    }

    fn reset(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
        self.camera.cancel();
        self.draft.clear();
        while self.completions_rx.try_recv().is_ok() {}
    }
}

/// 等待目前的分析任務結束；沒有任務時永遠不會完成
async fn join_in_flight(handle: &mut Option<JoinHandle<()>>) -> std::result::Result<(), JoinError> {
    match handle {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

impl<A: ImageAnalyzer + 'static> Drop for SellFlow<A> {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}
