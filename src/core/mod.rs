pub mod live;

// Re-export commonly used types for convenience
pub use live::{
    AudioFormat, BaseLive, BoxedLive, ClassifiedEvent, ConnectionState, GeminiLive,
    GeminiLiveConfig, GeminiVoice, LiveError, LiveResult, ModelState, ModelStateTracker,
    RawLiveEvent, classify_event,
};
