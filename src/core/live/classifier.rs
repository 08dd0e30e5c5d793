//! Response classification for Live sessions.
//!
//! Turns raw upstream events, whose shape depends on what the provider chose
//! to include, into a normalized [`ClassifiedEvent`] while tracking whether
//! the model is currently speaking.
//!
//! Rules are checked independently and several may fire for one event:
//!
//! 1. input transcription fragment -> `input_transcript`
//! 2. output transcription fragment -> `output_transcript`
//! 3. model turn content -> `speaking` on the first content of a turn; text
//!    parts overwrite `output_transcript`, inline audio parts set `audio`
//! 4. turn complete -> `turn_complete`, `listening`, turn counter incremented
//! 5. interrupted -> `interrupted`, `listening`
//! 6. grounding metadata -> `thinking`, only when no other rule set a state

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::base::RawLiveEvent;

/// Coarse indicator of the remote session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelState {
    Speaking,
    Thinking,
    Listening,
}

impl ModelState {
    /// Wire value sent to browsers.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Speaking => "speaking",
            Self::Thinking => "thinking",
            Self::Listening => "listening",
        }
    }
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-session classifier state.
///
/// `is_speaking` is only true between a model turn with content and the
/// next turn-complete or interruption.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelStateTracker {
    pub is_speaking: bool,
    pub turn_count: u64,
}

/// Normalized result of classifying one raw event.
///
/// One record may carry several populated fields. Forwarding fans them out
/// in field declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedEvent {
    pub model_state: Option<ModelState>,
    pub input_transcript: Option<String>,
    pub output_transcript: Option<String>,
    pub audio: Option<Bytes>,
    pub turn_complete: bool,
    pub interrupted: bool,
}

impl ClassifiedEvent {
    /// True when no field is populated and nothing should be forwarded.
    pub fn is_empty(&self) -> bool {
        self.model_state.is_none()
            && self.input_transcript.is_none()
            && self.output_transcript.is_none()
            && self.audio.is_none()
            && !self.turn_complete
            && !self.interrupted
    }
}

/// Classify one raw event against the prior tracker state.
///
/// Deterministic: the same `(tracker, event)` pair always yields the same
/// `(ClassifiedEvent, ModelStateTracker)`.
pub fn classify_event(
    tracker: &ModelStateTracker,
    event: &RawLiveEvent,
) -> (ClassifiedEvent, ModelStateTracker) {
    let mut next = *tracker;
    let mut out = ClassifiedEvent {
        input_transcript: event.input_transcription.clone(),
        output_transcript: event.output_transcription.clone(),
        ..Default::default()
    };

    if let Some(turn) = &event.model_turn {
        if !next.is_speaking {
            next.is_speaking = true;
            out.model_state = Some(ModelState::Speaking);
        }

        for part in &turn.parts {
            if let Some(text) = part.text.as_deref()
                && !text.is_empty()
            {
                out.output_transcript = Some(text.to_string());
            }
            // Multiple audio parts overwrite one another.
            if let Some(data) = &part.inline_data {
                out.audio = Some(data.clone());
            }
        }
    }

    if event.turn_complete {
        next.turn_count += 1;
        next.is_speaking = false;
        out.turn_complete = true;
        out.model_state = Some(ModelState::Listening);
    }

    if event.interrupted {
        next.is_speaking = false;
        out.interrupted = true;
        out.model_state = Some(ModelState::Listening);
    }

    if event.grounding_metadata.is_some() && out.model_state.is_none() {
        out.model_state = Some(ModelState::Thinking);
    }

    (out, next)
}

impl ModelStateTracker {
    /// Classify `event` and advance this tracker in place.
    pub fn observe(&mut self, event: &RawLiveEvent) -> ClassifiedEvent {
        let (classified, next) = classify_event(self, event);
        if classified.turn_complete {
            tracing::info!(turn = next.turn_count, "Model turn completed");
        }
        *self = next;
        classified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::live::base::{ModelTurn, TurnPart};
    use serde_json::json;

    fn speaking() -> ModelStateTracker {
        ModelStateTracker {
            is_speaking: true,
            turn_count: 0,
        }
    }

    fn audio_turn(data: &'static [u8]) -> RawLiveEvent {
        RawLiveEvent {
            model_turn: Some(ModelTurn {
                parts: vec![TurnPart::audio(Bytes::from_static(data))],
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_input_transcription_only() {
        let tracker = ModelStateTracker::default();
        let event = RawLiveEvent {
            input_transcription: Some("Hola".to_string()),
            ..Default::default()
        };

        let (out, next) = classify_event(&tracker, &event);
        assert_eq!(out.input_transcript.as_deref(), Some("Hola"));
        assert!(out.model_state.is_none());
        assert!(out.output_transcript.is_none());
        assert_eq!(next, tracker);
    }

    #[test]
    fn test_first_audio_part_starts_speaking() {
        let (out, next) = classify_event(&ModelStateTracker::default(), &audio_turn(b"\x01\x02"));

        assert_eq!(out.model_state, Some(ModelState::Speaking));
        assert_eq!(out.audio, Some(Bytes::from_static(b"\x01\x02")));
        assert!(next.is_speaking);
        assert_eq!(next.turn_count, 0);
    }

    #[test]
    fn test_subsequent_audio_does_not_repeat_speaking() {
        let (out, next) = classify_event(&speaking(), &audio_turn(b"\x03"));

        assert!(out.model_state.is_none());
        assert_eq!(out.audio, Some(Bytes::from_static(b"\x03")));
        assert!(next.is_speaking);
    }

    #[test]
    fn test_turn_complete_returns_to_listening() {
        let event = RawLiveEvent {
            turn_complete: true,
            ..Default::default()
        };

        let (out, next) = classify_event(&speaking(), &event);
        assert!(out.turn_complete);
        assert_eq!(out.model_state, Some(ModelState::Listening));
        assert!(!next.is_speaking);
        assert_eq!(next.turn_count, 1);
    }

    #[test]
    fn test_repeated_turn_complete_keeps_not_speaking() {
        let event = RawLiveEvent {
            turn_complete: true,
            ..Default::default()
        };
        let mut tracker = speaking();

        tracker.observe(&event);
        let out = tracker.observe(&event);

        assert!(!tracker.is_speaking);
        assert_eq!(tracker.turn_count, 2);
        assert_eq!(out.model_state, Some(ModelState::Listening));
    }

    #[test]
    fn test_interrupted() {
        let event = RawLiveEvent {
            interrupted: true,
            ..Default::default()
        };

        let (out, next) = classify_event(&speaking(), &event);
        assert!(out.interrupted);
        assert!(!out.turn_complete);
        assert_eq!(out.model_state, Some(ModelState::Listening));
        assert!(!next.is_speaking);
        assert_eq!(next.turn_count, 0);
    }

    #[test]
    fn test_turn_complete_overrides_speaking() {
        let mut event = audio_turn(b"\x00");
        event.turn_complete = true;

        let (out, next) = classify_event(&ModelStateTracker::default(), &event);
        assert_eq!(out.model_state, Some(ModelState::Listening));
        assert!(out.audio.is_some());
        assert!(!next.is_speaking);
    }

    #[test]
    fn test_grounding_metadata_alone_is_thinking() {
        let event = RawLiveEvent {
            grounding_metadata: Some(json!({"webSearchQueries": ["clima"]})),
            ..Default::default()
        };

        let (out, next) = classify_event(&speaking(), &event);
        assert_eq!(out.model_state, Some(ModelState::Thinking));
        assert!(next.is_speaking, "thinking does not touch is_speaking");
    }

    #[test]
    fn test_grounding_metadata_loses_to_other_states() {
        let event = RawLiveEvent {
            grounding_metadata: Some(json!({})),
            interrupted: true,
            ..Default::default()
        };

        let (out, _) = classify_event(&speaking(), &event);
        assert_eq!(out.model_state, Some(ModelState::Listening));
    }

    #[test]
    fn test_last_text_part_wins() {
        let event = RawLiveEvent {
            output_transcription: Some("from transcription".to_string()),
            model_turn: Some(ModelTurn {
                parts: vec![
                    TurnPart::text("first"),
                    TurnPart::text(""),
                    TurnPart::text("second"),
                ],
            }),
            ..Default::default()
        };

        let (out, _) = classify_event(&speaking(), &event);
        assert_eq!(out.output_transcript.as_deref(), Some("second"));
    }

    #[test]
    fn test_empty_model_turn_still_starts_speaking() {
        let event = RawLiveEvent {
            model_turn: Some(ModelTurn::default()),
            ..Default::default()
        };

        let (out, next) = classify_event(&ModelStateTracker::default(), &event);
        assert_eq!(out.model_state, Some(ModelState::Speaking));
        assert!(out.audio.is_none());
        assert!(next.is_speaking);
    }

    #[test]
    fn test_empty_event_classifies_empty() {
        let (out, next) = classify_event(&speaking(), &RawLiveEvent::default());
        assert!(out.is_empty());
        assert_eq!(next, speaking());
    }

    #[test]
    fn test_classification_is_deterministic() {
        let tracker = ModelStateTracker {
            is_speaking: false,
            turn_count: 7,
        };
        let mut event = audio_turn(b"\x10\x20");
        event.input_transcription = Some("¿qué hora es?".to_string());

        let first = classify_event(&tracker, &event);
        let second = classify_event(&tracker, &event);
        assert_eq!(first, second);
    }

    #[test]
    fn test_model_state_serialization() {
        assert_eq!(
            serde_json::to_string(&ModelState::Listening).unwrap(),
            "\"listening\""
        );
        assert_eq!(ModelState::Thinking.to_string(), "thinking");
    }
}
