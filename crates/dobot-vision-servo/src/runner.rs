//! Background execution of a servo run.
//!
//! The loop blocks on every arm move, so a caller that must stay responsive
//! (a UI, a supervisor) hands the arm and camera to a worker thread and polls
//! for the single final result.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use dobot_vision_core::{ArmController, VisionPipeline};

use crate::{CancelToken, ServoError, ServoOutcome, VisualServoLoop};

/// Final result of a background run, with the collaborators handed back.
#[derive(Debug)]
pub struct ServoReport<A, V> {
    pub result: Result<ServoOutcome, ServoError>,
    pub arm: A,
    pub vision: V,
}

/// Handle to a servo run on a worker thread.
pub struct ServoHandle<A, V> {
    receiver: Receiver<ServoReport<A, V>>,
    cancel: CancelToken,
    worker: Option<JoinHandle<()>>,
}

/// Spawns servo loops on worker threads.
pub struct ServoRunner;

impl ServoRunner {
    pub fn spawn<A, V>(servo: VisualServoLoop, mut arm: A, mut vision: V) -> ServoHandle<A, V>
    where
        A: ArmController + Send + 'static,
        V: VisionPipeline + Send + 'static,
    {
        let (sender, receiver) = mpsc::sync_channel(1);
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let worker = thread::spawn(move || {
            let result = servo.run_with_cancel(&mut arm, &mut vision, &token);
            if let Err(err) = &result {
                log::warn!("background servo run failed: {err}");
            }
            // receiver may already be gone; nothing left to notify then
            let _ = sender.send(ServoReport {
                result,
                arm,
                vision,
            });
        });
        ServoHandle {
            receiver,
            cancel,
            worker: Some(worker),
        }
    }
}

impl<A, V> ServoHandle<A, V> {
    /// Ask the worker to stop at its next sampling or correction boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Non-blocking poll. `Ok(None)` while the run is still in progress.
    pub fn try_result(&mut self) -> Result<Option<ServoReport<A, V>>, ServoError> {
        match self.receiver.try_recv() {
            Ok(report) => {
                self.join();
                Ok(Some(report))
            }
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                self.join();
                Err(ServoError::WorkerLost)
            }
        }
    }

    /// Block until the run finishes.
    pub fn wait(mut self) -> Result<ServoReport<A, V>, ServoError> {
        let report = self.receiver.recv().map_err(|_| ServoError::WorkerLost);
        self.join();
        report
    }

    fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("servo worker panicked");
            }
        }
    }
}
