// StoryboardState - Explicit state transitions for script intake and storyboard generation
use crate::types::{ImageUrl, Scene, SceneImage, StoryboardItem};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub const EMPTY_SCRIPT_MESSAGE: &str = "Please upload a script first.";
pub const EXTRACTION_FAILED_MESSAGE: &str = "Failed to process the script. Please try again.";

/// Reasons a transition is refused. The state is left untouched except where noted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Rejection {
    /// Generation requested without a script; the validation message is recorded in `error`
    #[error("{}", EMPTY_SCRIPT_MESSAGE)]
    EmptyScript,

    #[error("A storyboard is already being generated. Please wait for it to finish.")]
    Busy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryboardState {
    pub script: String,
    pub storyboard: Vec<StoryboardItem>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub run_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub enum StoryboardEvent {
    ScriptLoaded(String),
    GenerationRequested {
        run_id: Uuid,
        at: DateTime<Utc>,
    },
    ScenesExtracted {
        run_id: Uuid,
        scenes: Vec<Scene>,
    },
    ExtractionFailed {
        run_id: Uuid,
        message: String,
    },
    ImagesSettled {
        run_id: Uuid,
        results: Vec<SceneImage>,
        at: DateTime<Utc>,
    },
}

impl StoryboardState {
    fn is_current(&self, run_id: Uuid) -> bool {
        self.is_loading && self.run_id == Some(run_id)
    }

    /// Number of items still waiting on their image
    pub fn pending_count(&self) -> usize {
        self.storyboard.iter().filter(|item| item.is_loading).count()
    }
}

/// Apply one event to the previous state and return the next state.
///
/// Completion events for a run other than the current in-flight one are ignored.
pub fn reduce(
    state: StoryboardState,
    event: StoryboardEvent,
) -> Result<StoryboardState, (StoryboardState, Rejection)> {
    let mut next = state;
    match event {
        StoryboardEvent::ScriptLoaded(script) => {
            if next.is_loading {
                return Err((next, Rejection::Busy));
            }
            next.script = script;
            next.storyboard.clear();
            next.error = None;
            next.run_id = None;
            next.started_at = None;
            next.completed_at = None;
        }
        StoryboardEvent::GenerationRequested { run_id, at } => {
            if next.is_loading {
                return Err((next, Rejection::Busy));
            }
            if next.script.trim().is_empty() {
                next.error = Some(EMPTY_SCRIPT_MESSAGE.to_string());
                return Err((next, Rejection::EmptyScript));
            }
            next.is_loading = true;
            next.error = None;
            next.storyboard.clear();
            next.run_id = Some(run_id);
            next.started_at = Some(at);
            next.completed_at = None;
        }
        StoryboardEvent::ScenesExtracted { run_id, scenes } => {
            if next.is_current(run_id) {
                next.storyboard = scenes.into_iter().map(StoryboardItem::placeholder).collect();
            }
        }
        StoryboardEvent::ExtractionFailed { run_id, message } => {
            if next.is_current(run_id) {
                next.storyboard.clear();
                next.error = Some(message);
                next.is_loading = false;
            }
        }
        StoryboardEvent::ImagesSettled { run_id, results, at } => {
            if next.is_current(run_id) {
                merge_images(&mut next.storyboard, results);
                // A scene the barrier reported nothing for counts as failed
                for item in next.storyboard.iter_mut().filter(|item| item.is_loading) {
                    item.image_url = ImageUrl::Failed;
                    item.is_loading = false;
                }
                next.is_loading = false;
                next.completed_at = Some(at);
            }
        }
    }
    Ok(next)
}

/// Fill settled images into the ordered list by scene number.
///
/// Only entries still loading are touched, so each flips at most once; results
/// with no matching entry are dropped.
pub fn merge_images(storyboard: &mut [StoryboardItem], results: Vec<SceneImage>) {
    for result in results {
        if let Some(item) = storyboard
            .iter_mut()
            .find(|item| item.scene.scene_number == result.scene_number && item.is_loading)
        {
            item.image_url = result.image_url;
            item.is_loading = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenes(n: i64) -> Vec<Scene> {
        (1..=n)
            .map(|i| Scene {
                scene_number: i,
                description: format!("Scene {}", i),
                image_prompt: format!("prompt {}", i),
            })
            .collect()
    }

    fn loaded(script: &str) -> StoryboardState {
        reduce(StoryboardState::default(), StoryboardEvent::ScriptLoaded(script.to_string()))
            .unwrap()
    }

    fn started(script: &str) -> (StoryboardState, Uuid) {
        let run_id = Uuid::new_v4();
        let state = reduce(
            loaded(script),
            StoryboardEvent::GenerationRequested { run_id, at: Utc::now() },
        )
        .unwrap();
        (state, run_id)
    }

    #[test]
    fn test_empty_script_is_refused_with_message() {
        let (state, rejection) = reduce(
            loaded("   \n"),
            StoryboardEvent::GenerationRequested { run_id: Uuid::new_v4(), at: Utc::now() },
        )
        .unwrap_err();
        assert_eq!(rejection, Rejection::EmptyScript);
        assert_eq!(state.error.as_deref(), Some(EMPTY_SCRIPT_MESSAGE));
        assert!(!state.is_loading);
        assert!(state.storyboard.is_empty());
    }

    #[test]
    fn test_extraction_materializes_placeholders_in_order() {
        let (state, run_id) = started("script");
        let state = reduce(state, StoryboardEvent::ScenesExtracted { run_id, scenes: scenes(3) })
            .unwrap();
        assert!(state.is_loading);
        assert_eq!(state.storyboard.len(), 3);
        let numbers: Vec<i64> = state.storyboard.iter().map(|i| i.scene.scene_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(state
            .storyboard
            .iter()
            .all(|i| i.is_loading && i.image_url == ImageUrl::Pending));
        assert_eq!(state.pending_count(), 3);
    }

    #[test]
    fn test_extraction_failure_clears_loading_and_sets_error() {
        let (state, run_id) = started("script");
        let state = reduce(
            state,
            StoryboardEvent::ExtractionFailed {
                run_id,
                message: EXTRACTION_FAILED_MESSAGE.to_string(),
            },
        )
        .unwrap();
        assert!(state.storyboard.is_empty());
        assert!(!state.is_loading);
        assert_eq!(state.error.as_deref(), Some(EXTRACTION_FAILED_MESSAGE));
    }

    #[test]
    fn test_settled_images_merge_by_scene_number() {
        let (state, run_id) = started("script");
        let state = reduce(state, StoryboardEvent::ScenesExtracted { run_id, scenes: scenes(3) })
            .unwrap();
        // Results arrive out of order and include an unknown scene
        let results = vec![
            SceneImage { scene_number: 3, image_url: ImageUrl::Ready("data:c".into()) },
            SceneImage { scene_number: 2, image_url: ImageUrl::Failed },
            SceneImage { scene_number: 9, image_url: ImageUrl::Ready("data:x".into()) },
            SceneImage { scene_number: 1, image_url: ImageUrl::Ready("data:a".into()) },
        ];
        let state = reduce(
            state,
            StoryboardEvent::ImagesSettled { run_id, results, at: Utc::now() },
        )
        .unwrap();

        assert!(!state.is_loading);
        assert!(state.completed_at.is_some());
        assert_eq!(state.storyboard.len(), 3);
        assert_eq!(state.storyboard[0].image_url, ImageUrl::Ready("data:a".into()));
        assert_eq!(state.storyboard[1].image_url, ImageUrl::Failed);
        assert_eq!(state.storyboard[2].image_url, ImageUrl::Ready("data:c".into()));
        assert_eq!(state.pending_count(), 0);
    }

    #[test]
    fn test_item_never_flips_back_to_loading() {
        let mut items: Vec<StoryboardItem> =
            scenes(1).into_iter().map(StoryboardItem::placeholder).collect();
        merge_images(
            &mut items,
            vec![SceneImage { scene_number: 1, image_url: ImageUrl::Failed }],
        );
        merge_images(
            &mut items,
            vec![SceneImage { scene_number: 1, image_url: ImageUrl::Ready("data:late".into()) }],
        );
        assert!(!items[0].is_loading);
        assert_eq!(items[0].image_url, ImageUrl::Failed);
    }

    #[test]
    fn test_busy_rejects_second_generation_and_script_reload() {
        let (state, run_id) = started("script");
        let (state, rejection) = reduce(
            state,
            StoryboardEvent::GenerationRequested { run_id: Uuid::new_v4(), at: Utc::now() },
        )
        .unwrap_err();
        assert_eq!(rejection, Rejection::Busy);
        assert_eq!(state.run_id, Some(run_id));

        let (state, rejection) =
            reduce(state, StoryboardEvent::ScriptLoaded("other".into())).unwrap_err();
        assert_eq!(rejection, Rejection::Busy);
        assert_eq!(state.script, "script");
    }

    #[test]
    fn test_stale_run_events_are_ignored() {
        let (state, run_id) = started("script");
        let state = reduce(state, StoryboardEvent::ScenesExtracted { run_id, scenes: scenes(2) })
            .unwrap();
        let before = state.clone();
        let state = reduce(
            state,
            StoryboardEvent::ImagesSettled {
                run_id: Uuid::new_v4(),
                results: vec![SceneImage { scene_number: 1, image_url: ImageUrl::Failed }],
                at: Utc::now(),
            },
        )
        .unwrap();
        assert_eq!(state, before);
    }

    #[test]
    fn test_unreported_scene_fails_and_reload_resets() {
        let (state, run_id) = started("script");
        let state = reduce(state, StoryboardEvent::ScenesExtracted { run_id, scenes: scenes(1) })
            .unwrap();
        let state = reduce(
            state,
            StoryboardEvent::ImagesSettled { run_id, results: vec![], at: Utc::now() },
        )
        .unwrap();
        assert_eq!(state.storyboard[0].image_url, ImageUrl::Failed);
        assert!(!state.storyboard[0].is_loading);

        let state = reduce(state, StoryboardEvent::ScriptLoaded("new script".into())).unwrap();
        assert_eq!(state.script, "new script");
        assert!(state.storyboard.is_empty());
        assert!(state.error.is_none());
        assert!(state.run_id.is_none());
    }
}
