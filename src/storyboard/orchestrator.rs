// Storyboard orchestrator - script -> scenes -> concurrent image fan-out -> keyed merge
use crate::error::ProviderError;
use crate::provider::GenerativeProvider;
use crate::storyboard::state::{
    reduce, Rejection, StoryboardEvent, StoryboardState, EXTRACTION_FAILED_MESSAGE,
};
use crate::types::{ImageUrl, Scene, SceneImage};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::{oneshot, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("{0}")]
    Rejected(#[from] Rejection),

    /// Script-level failure; the storyboard stays empty and `error` is set
    #[error("{message}")]
    Extraction {
        message: String,
        #[source]
        source: ProviderError,
    },
}

// Scenes of a run whose placeholders are stored and whose images are not yet requested
struct PendingRun {
    run_id: Uuid,
    scenes: Vec<Scene>,
}

/// A launched run whose placeholders are already visible
#[derive(Debug)]
pub struct StartedRun {
    pub run_id: Uuid,
    pub placeholders: StoryboardState,
    /// Final state once every image call has settled
    pub completion: JoinHandle<StoryboardState>,
}

/// Owns the storyboard state and drives generation runs against a provider
#[derive(Clone)]
pub struct StoryboardOrchestrator {
    provider: Arc<dyn GenerativeProvider>,
    state: Arc<RwLock<StoryboardState>>,
}

impl StoryboardOrchestrator {
    pub fn new(provider: Arc<dyn GenerativeProvider>) -> Self {
        Self {
            provider,
            state: Arc::new(RwLock::new(StoryboardState::default())),
        }
    }

    pub async fn snapshot(&self) -> StoryboardState {
        self.state.read().await.clone()
    }

    // Transitions are applied under the write lock, never across an external call
    async fn apply(&self, event: StoryboardEvent) -> Result<StoryboardState, Rejection> {
        let mut guard = self.state.write().await;
        let previous = std::mem::take(&mut *guard);
        match reduce(previous, event) {
            Ok(next) => {
                *guard = next.clone();
                Ok(next)
            }
            Err((unchanged, rejection)) => {
                *guard = unchanged;
                Err(rejection)
            }
        }
    }

    /// Replace the current script; clears any previous storyboard and error
    pub async fn load_script(&self, script: String) -> Result<StoryboardState, Rejection> {
        tracing::info!(chars = script.chars().count(), "📄 Script loaded");
        self.apply(StoryboardEvent::ScriptLoaded(script)).await
    }

    /// Validate and launch a run.
    ///
    /// Extraction and the image fan-out run on a spawned task, so dropping the
    /// caller never strands the run. Resolves once placeholders are stored (or
    /// extraction has failed); `completion` resolves when every image settled.
    pub async fn start(&self) -> Result<StartedRun, GenerateError> {
        let run_id = Uuid::new_v4();
        let state = self
            .apply(StoryboardEvent::GenerationRequested {
                run_id,
                at: Utc::now(),
            })
            .await
            .map_err(|rejection| {
                tracing::warn!(run_id = %run_id, "Generation refused: {}", rejection);
                rejection
            })?;

        tracing::info!(run_id = %run_id, "🎬 Starting storyboard generation");

        let (report_tx, report_rx) = oneshot::channel();
        let completion = tokio::spawn(self.clone().run(run_id, state.script, report_tx));

        match report_rx.await {
            Ok(Ok(placeholders)) => Ok(StartedRun {
                run_id,
                placeholders,
                completion,
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                // The run task died before reporting; release the loading flag
                tracing::error!(run_id = %run_id, "❌ Storyboard run task ended unexpectedly");
                self.apply(StoryboardEvent::ExtractionFailed {
                    run_id,
                    message: EXTRACTION_FAILED_MESSAGE.to_string(),
                })
                .await?;
                Err(GenerateError::Extraction {
                    message: EXTRACTION_FAILED_MESSAGE.to_string(),
                    source: ProviderError::Malformed("run task ended before extraction finished".to_string()),
                })
            }
        }
    }

    // Whole run: extract, report placeholders (or the failure), then fan out images
    async fn run(
        self,
        run_id: Uuid,
        script: String,
        report: oneshot::Sender<Result<StoryboardState, GenerateError>>,
    ) -> StoryboardState {
        match self.provider.extract_scenes(&script).await {
            Ok(scenes) => {
                tracing::info!(run_id = %run_id, scenes = scenes.len(), "Scenes extracted");
                let placeholders = match self
                    .apply(StoryboardEvent::ScenesExtracted {
                        run_id,
                        scenes: scenes.clone(),
                    })
                    .await
                {
                    Ok(state) => state,
                    Err(_) => self.snapshot().await,
                };
                // The caller may be gone; the run still finishes
                let _ = report.send(Ok(placeholders));
                self.render_images(PendingRun { run_id, scenes }).await
            }
            Err(source) => {
                tracing::error!(run_id = %run_id, error = %source, "❌ Scene extraction failed");
                let state = match self
                    .apply(StoryboardEvent::ExtractionFailed {
                        run_id,
                        message: EXTRACTION_FAILED_MESSAGE.to_string(),
                    })
                    .await
                {
                    Ok(state) => state,
                    Err(_) => self.snapshot().await,
                };
                let _ = report.send(Err(GenerateError::Extraction {
                    message: EXTRACTION_FAILED_MESSAGE.to_string(),
                    source,
                }));
                state
            }
        }
    }

    /// Request every scene's image at once, wait for all to settle, then merge
    async fn render_images(&self, run: PendingRun) -> StoryboardState {
        let started = Instant::now();
        let results = settle_images(self.provider.as_ref(), &run.scenes).await;
        let failed = results
            .iter()
            .filter(|r| r.image_url == ImageUrl::Failed)
            .count();

        let state = match self
            .apply(StoryboardEvent::ImagesSettled {
                run_id: run.run_id,
                results,
                at: Utc::now(),
            })
            .await
        {
            Ok(state) => state,
            // Settlement events are never rejected; keep whatever is current
            Err(_) => self.snapshot().await,
        };

        tracing::info!(
            run_id = %run.run_id,
            scenes = run.scenes.len(),
            failed,
            duration_ms = %started.elapsed().as_millis(),
            "✅ Storyboard generation finished"
        );
        state
    }

    /// Run a whole generation to completion
    pub async fn generate(&self) -> Result<StoryboardState, GenerateError> {
        let run = self.start().await?;
        match run.completion.await {
            Ok(state) => Ok(state),
            Err(e) => {
                tracing::error!(run_id = %run.run_id, "Storyboard run task failed: {}", e);
                Ok(self.snapshot().await)
            }
        }
    }
}

/// Issue one image call per scene concurrently and wait for every one to settle.
///
/// A failed call becomes the error sentinel for that scene only.
pub async fn settle_images(provider: &dyn GenerativeProvider, scenes: &[Scene]) -> Vec<SceneImage> {
    let calls = scenes.iter().map(|scene| async move {
        let image_url = match provider.generate_image(&scene.image_prompt).await {
            Ok(uri) => ImageUrl::Ready(uri),
            Err(e) => {
                tracing::warn!(
                    scene_number = scene.scene_number,
                    error = %e,
                    "Failed to generate image for scene"
                );
                ImageUrl::Failed
            }
        };
        SceneImage {
            scene_number: scene.scene_number,
            image_url,
        }
    });
    join_all(calls).await
}
