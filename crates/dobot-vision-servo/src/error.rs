use dobot_vision_core::{ArmError, VisionError};

/// Reasons a servo run ends without converging.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ServoError {
    #[error("frame acquisition failed")]
    FrameAcquisition(#[source] VisionError),
    #[error("object not found in frame")]
    NoCentroid,
    #[error(transparent)]
    Vision(VisionError),
    #[error(transparent)]
    Arm(#[from] ArmError),
    #[error("no convergence after {iterations} corrections (last error {last_error_px:?} px)")]
    IterationLimit {
        iterations: usize,
        last_error_px: [f64; 2],
    },
    #[error("servo timed out after {elapsed_ms} ms")]
    Timeout { elapsed_ms: u64 },
    #[error("servo cancelled")]
    Cancelled,
    #[error("servo worker exited without a result")]
    WorkerLost,
}

impl From<VisionError> for ServoError {
    fn from(err: VisionError) -> Self {
        match err {
            VisionError::Acquisition(_) => ServoError::FrameAcquisition(err),
            VisionError::NoCentroid => ServoError::NoCentroid,
            other => ServoError::Vision(other),
        }
    }
}
