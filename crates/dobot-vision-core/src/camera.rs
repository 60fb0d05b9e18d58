//! Camera handles owned by slot id.
//!
//! A host typically keeps one camera above the workspace for locating
//! objects and an optional second one (e.g. an endoscope next to the
//! gripper) for servoing. Both live in one [`CameraRegistry`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{BinarizationParams, Detection, Frame, ObjectLocator, VisionError, VisionPipeline};

/// Small integer id a camera handle is stored under.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CameraSlot(pub u8);

/// Result of a registry operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraStatus {
    Connected,
    Released,
    NotFound,
}

/// An open camera device.
pub trait Camera {
    fn read_frame(&mut self) -> Result<Frame, VisionError>;
}

/// Opens camera devices by index (e.g. `/dev/video<N>`).
pub trait CameraBackend {
    type Camera: Camera;

    fn open(&mut self, device_index: u32) -> Option<Self::Camera>;
}

/// Owns zero or more open cameras keyed by [`CameraSlot`].
pub struct CameraRegistry<B: CameraBackend> {
    backend: B,
    slots: BTreeMap<CameraSlot, B::Camera>,
}

impl<B: CameraBackend> CameraRegistry<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            slots: BTreeMap::new(),
        }
    }

    /// Open `device_index` into `slot`, replacing whatever was there.
    pub fn open(&mut self, slot: CameraSlot, device_index: u32) -> CameraStatus {
        match self.backend.open(device_index) {
            Some(camera) => {
                if self.slots.insert(slot, camera).is_some() {
                    log::debug!("camera slot {} replaced", slot.0);
                }
                log::info!("camera device {device_index} connected on slot {}", slot.0);
                CameraStatus::Connected
            }
            None => {
                log::warn!("camera device {device_index} not found");
                CameraStatus::NotFound
            }
        }
    }

    /// Drop the camera in `slot`.
    pub fn close(&mut self, slot: CameraSlot) -> CameraStatus {
        match self.slots.remove(&slot) {
            Some(_) => CameraStatus::Released,
            None => CameraStatus::NotFound,
        }
    }

    /// Exchange the cameras held in two slots. Both must be open.
    pub fn swap(&mut self, a: CameraSlot, b: CameraSlot) -> CameraStatus {
        if a == b {
            return if self.slots.contains_key(&a) {
                CameraStatus::Connected
            } else {
                CameraStatus::NotFound
            };
        }
        if !(self.slots.contains_key(&a) && self.slots.contains_key(&b)) {
            return CameraStatus::NotFound;
        }
        let (Some(cam_a), Some(cam_b)) = (self.slots.remove(&a), self.slots.remove(&b)) else {
            return CameraStatus::NotFound;
        };
        self.slots.insert(a, cam_b);
        self.slots.insert(b, cam_a);
        CameraStatus::Connected
    }

    pub fn is_open(&self, slot: CameraSlot) -> bool {
        self.slots.contains_key(&slot)
    }

    pub fn open_slots(&self) -> impl Iterator<Item = CameraSlot> + '_ {
        self.slots.keys().copied()
    }

    /// Read one frame from `slot`.
    pub fn capture(&mut self, slot: CameraSlot) -> Result<Frame, VisionError> {
        self.slots
            .get_mut(&slot)
            .ok_or_else(|| VisionError::Acquisition(format!("no camera on slot {}", slot.0)))?
            .read_frame()
    }

    #[inline]
    pub fn camera_mut(&mut self, slot: CameraSlot) -> Option<&mut B::Camera> {
        self.slots.get_mut(&slot)
    }
}

/// [`VisionPipeline`] reading from one registry slot and locating with `L`.
pub struct RegistryPipeline<'a, B: CameraBackend, L> {
    registry: &'a mut CameraRegistry<B>,
    slot: CameraSlot,
    locator: L,
}

impl<'a, B: CameraBackend, L: ObjectLocator> RegistryPipeline<'a, B, L> {
    pub fn new(registry: &'a mut CameraRegistry<B>, slot: CameraSlot, locator: L) -> Self {
        Self {
            registry,
            slot,
            locator,
        }
    }
}

impl<B: CameraBackend, L: ObjectLocator> VisionPipeline for RegistryPipeline<'_, B, L> {
    fn capture_frame(&mut self) -> Result<Frame, VisionError> {
        self.registry.capture(self.slot)
    }

    fn binarize_and_locate(
        &mut self,
        frame: &Frame,
        params: &BinarizationParams,
    ) -> Result<Detection, VisionError> {
        self.locator.locate(frame, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MomentsLocator;

    struct FakeCamera {
        id: u32,
    }

    impl Camera for FakeCamera {
        fn read_frame(&mut self) -> Result<Frame, VisionError> {
            let mut frame = Frame::filled(8, 8, 0);
            frame.put(self.id as i64, 1, 255);
            Ok(frame)
        }
    }

    /// Devices 0..count exist.
    struct FakeBackend {
        count: u32,
    }

    impl CameraBackend for FakeBackend {
        type Camera = FakeCamera;

        fn open(&mut self, device_index: u32) -> Option<FakeCamera> {
            (device_index < self.count).then_some(FakeCamera { id: device_index })
        }
    }

    #[test]
    fn open_close_report_status() {
        let mut reg = CameraRegistry::new(FakeBackend { count: 2 });
        assert_eq!(reg.open(CameraSlot(0), 0), CameraStatus::Connected);
        assert_eq!(reg.open(CameraSlot(1), 5), CameraStatus::NotFound);
        assert!(reg.is_open(CameraSlot(0)));
        assert!(!reg.is_open(CameraSlot(1)));
        assert_eq!(reg.close(CameraSlot(0)), CameraStatus::Released);
        assert_eq!(reg.close(CameraSlot(0)), CameraStatus::NotFound);
    }

    #[test]
    fn swap_exchanges_devices() {
        let mut reg = CameraRegistry::new(FakeBackend { count: 2 });
        reg.open(CameraSlot(0), 0);
        assert_eq!(reg.swap(CameraSlot(0), CameraSlot(1)), CameraStatus::NotFound);
        // A failed swap must not lose the open camera.
        assert!(reg.is_open(CameraSlot(0)));

        reg.open(CameraSlot(1), 1);
        assert_eq!(reg.swap(CameraSlot(0), CameraSlot(1)), CameraStatus::Connected);
        assert_eq!(reg.camera_mut(CameraSlot(0)).unwrap().id, 1);
        assert_eq!(reg.camera_mut(CameraSlot(1)).unwrap().id, 0);
        assert_eq!(reg.open_slots().collect::<Vec<_>>(), vec![CameraSlot(0), CameraSlot(1)]);
    }

    #[test]
    fn capture_from_empty_slot_is_acquisition_error() {
        let mut reg = CameraRegistry::new(FakeBackend { count: 1 });
        assert!(matches!(
            reg.capture(CameraSlot(3)),
            Err(VisionError::Acquisition(_))
        ));
    }

    #[test]
    fn registry_pipeline_locates_on_bound_slot() {
        let mut reg = CameraRegistry::new(FakeBackend { count: 4 });
        reg.open(CameraSlot(2), 3);
        let mut pipeline = RegistryPipeline::new(&mut reg, CameraSlot(2), MomentsLocator);
        let frame = pipeline.capture_frame().unwrap();
        let params = BinarizationParams {
            min_area: 1,
            ..BinarizationParams::default()
        };
        let det = pipeline.binarize_and_locate(&frame, &params).unwrap();
        assert_eq!(det.centroid, Some((3, 1)));
    }
}
