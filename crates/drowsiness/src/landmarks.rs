//! Facial landmark types and the inference seam

use camera_capture::VideoFrame;
use serde::{Deserialize, Serialize};

use crate::DrowsinessError;

/// Upper eyelid of the left eye in the 468-point face mesh
pub const LEFT_EYE_UPPER_LID: usize = 159;
/// Lower eyelid of the left eye in the 468-point face mesh
pub const LEFT_EYE_LOWER_LID: usize = 145;
/// Point count of the standard face mesh
pub const FACE_MESH_POINTS: usize = 468;

/// A single landmark in normalized frame coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkPoint {
    /// Horizontal position (0..1 of frame width)
    pub x: f32,
    /// Vertical position (0..1 of frame height)
    pub y: f32,
    /// Relative depth
    pub z: f32,
}

impl LandmarkPoint {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Landmarks of one detected face, addressable by mesh index
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkSet {
    points: Vec<LandmarkPoint>,
}

impl LandmarkSet {
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        Self { points }
    }

    /// Build from a flat `[x0, y0, z0, x1, ...]` buffer, dividing x/y by `scale`.
    ///
    /// Trailing values that do not form a full triple are ignored.
    pub fn from_flat(values: &[f32], scale: f32) -> Self {
        let scale = if scale > 0.0 { scale } else { 1.0 };
        let points = values
            .chunks_exact(3)
            .map(|p| LandmarkPoint::new(p[0] / scale, p[1] / scale, p[2] / scale))
            .collect();
        Self { points }
    }

    /// Landmark by mesh index
    pub fn get(&self, index: usize) -> Option<&LandmarkPoint> {
        self.points.get(index)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Vertical distance between two eyelid landmarks.
    ///
    /// `None` if either index is missing from the set.
    pub fn eye_aperture(&self, upper: usize, lower: usize) -> Option<f32> {
        let upper = self.get(upper)?;
        let lower = self.get(lower)?;
        Some((upper.y - lower.y).abs())
    }
}

/// Facial landmark inference service.
///
/// Built once and shared by reference. `Ok(None)` means no face was found
/// in the frame, which is a normal outcome.
pub trait LandmarkInference {
    fn infer(&self, frame: &VideoFrame) -> Result<Option<LandmarkSet>, DrowsinessError>;
}

impl<T: LandmarkInference + ?Sized> LandmarkInference for &T {
    fn infer(&self, frame: &VideoFrame) -> Result<Option<LandmarkSet>, DrowsinessError> {
        (**self).infer(frame)
    }
}

impl<T: LandmarkInference + ?Sized> LandmarkInference for std::sync::Arc<T> {
    fn infer(&self, frame: &VideoFrame) -> Result<Option<LandmarkSet>, DrowsinessError> {
        (**self).infer(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flat_normalizes() {
        let set = LandmarkSet::from_flat(&[96.0, 48.0, 1.0, 192.0, 0.0, 0.0, 7.0], 192.0);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0), Some(&LandmarkPoint::new(0.5, 0.25, 1.0 / 192.0)));
        assert_eq!(set.get(1).map(|p| p.x), Some(1.0));
        assert!(set.get(2).is_none());
    }

    #[test]
    fn test_eye_aperture() {
        let mut points = vec![LandmarkPoint::default(); FACE_MESH_POINTS];
        points[LEFT_EYE_UPPER_LID].y = 0.40;
        points[LEFT_EYE_LOWER_LID].y = 0.43;
        let set = LandmarkSet::new(points);

        let aperture = set.eye_aperture(LEFT_EYE_UPPER_LID, LEFT_EYE_LOWER_LID).unwrap();
        assert!((aperture - 0.03).abs() < 1e-6);
        // order does not matter
        let swapped = set.eye_aperture(LEFT_EYE_LOWER_LID, LEFT_EYE_UPPER_LID).unwrap();
        assert_eq!(aperture, swapped);
    }

    #[test]
    fn test_eye_aperture_missing_points() {
        let set = LandmarkSet::new(vec![LandmarkPoint::default(); 10]);
        assert!(set.eye_aperture(LEFT_EYE_UPPER_LID, LEFT_EYE_LOWER_LID).is_none());
        assert!(LandmarkSet::default().is_empty());
    }
}
