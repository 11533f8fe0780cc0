mod interface;
mod simulated;

pub use interface::{
    can_switch_lens, completion_channel, select_lens, ActiveRecording, CameraProvider,
    CaptureDevice, CompletionSender, LensFacing, OutputTarget, RecordingCompletion,
    RecordingFailure, RecordingHandle, RecordingResult, Rotation, SavedRecording, UseCaseConfig,
};
pub use simulated::{
    metadata_path, RecordingMetadata, SimulatedCameraProvider, SimulatedCaptureDevice,
    SimulatedState,
};
