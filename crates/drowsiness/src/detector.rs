//! Face mesh landmark model

use std::path::Path;

use camera_capture::VideoFrame;
use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use tracing::{debug, error, info};

use crate::config::ModelConfig;
use crate::landmarks::{LandmarkInference, LandmarkSet};
use crate::DrowsinessError;

/// Face mesh landmarker using ONNX Runtime.
///
/// Expects a single-face mesh model taking an NHWC `1 x S x S x 3` input
/// scaled to 0..1, with the landmark tensor (`N * 3` values in input
/// pixels) as first output and the face-presence logit as second.
///
/// There is no face detection or ROI crop stage: the whole frame is
/// resized into the model. Landmark models are trained on face-centred
/// crops, so frames must already be framed on the face (a webcam facing
/// the user at arm's length, or pre-cropped replay frames). Off-centre or
/// small faces yield low presence scores and are reported as no face.
pub struct FaceMeshLandmarker {
    session: Session,
    input_size: u32,
    face_confidence: f32,
}

impl FaceMeshLandmarker {
    pub fn new(config: &ModelConfig) -> Result<Self, DrowsinessError> {
        config.validate()?;
        let path = config
            .path
            .as_deref()
            .ok_or_else(|| DrowsinessError::ModelLoad("no face mesh model path configured".into()))?;

        if !Path::new(path).is_file() {
            error!("Face mesh model not found at {}", path);
            return Err(DrowsinessError::ModelLoad(format!("model file not found: {}", path)));
        }

        info!("Loading face mesh model from {}", path);
        let session = Session::builder()
            .and_then(|builder| builder.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|builder| builder.commit_from_file(path))
            .map_err(|e| {
                error!("Failed to load face mesh model: {}", e);
                DrowsinessError::ModelLoad(e.to_string())
            })?;

        Ok(Self {
            session,
            input_size: config.input_size,
            face_confidence: config.face_confidence,
        })
    }
}

impl LandmarkInference for FaceMeshLandmarker {
    fn infer(&self, frame: &VideoFrame) -> Result<Option<LandmarkSet>, DrowsinessError> {
        let input = preprocess(frame, self.input_size)?;

        let outputs = self
            .session
            .run(ort::inputs![input].map_err(|e| DrowsinessError::Inference(e.to_string()))?)
            .map_err(|e| DrowsinessError::Inference(e.to_string()))?;

        if outputs.len() > 1 {
            let presence = outputs[1]
                .try_extract_tensor::<f32>()
                .map_err(|e| DrowsinessError::Inference(e.to_string()))?;
            let logit = presence.iter().copied().next().unwrap_or(f32::NEG_INFINITY);
            let probability = sigmoid(logit);
            if probability < self.face_confidence {
                debug!("No face (presence {:.3})", probability);
                return Ok(None);
            }
        }

        let landmarks = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| DrowsinessError::Inference(e.to_string()))?;
        let flat: Vec<f32> = landmarks.iter().copied().collect();

        Ok(decode_landmarks(&flat, self.input_size))
    }
}

/// Resize a frame to the model resolution and pack it as NHWC floats in 0..1
pub fn preprocess(frame: &VideoFrame, size: u32) -> Result<Array4<f32>, DrowsinessError> {
    let img = frame
        .to_rgb_image()
        .ok_or_else(|| DrowsinessError::ImageProcessing("Failed to create image buffer".into()))?;

    let resized = image::imageops::resize(&img, size, size, image::imageops::FilterType::Triangle);

    let side = size as usize;
    let mut input = Array4::<f32>::zeros((1, side, side, 3));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            input[[0, y as usize, x as usize, c]] = pixel[c] as f32 / 255.0;
        }
    }
    Ok(input)
}

/// Turn the raw landmark tensor into normalized points.
///
/// An empty tensor means the model produced no face.
pub fn decode_landmarks(flat: &[f32], input_size: u32) -> Option<LandmarkSet> {
    let set = LandmarkSet::from_flat(flat, input_size as f32);
    if set.is_empty() {
        None
    } else {
        Some(set)
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_path() {
        let result = FaceMeshLandmarker::new(&ModelConfig::default());
        assert!(matches!(result, Err(DrowsinessError::ModelLoad(_))));
    }

    #[test]
    fn test_model_file_not_found() {
        let config = ModelConfig {
            path: Some("/nonexistent/face_mesh.onnx".into()),
            ..Default::default()
        };
        assert!(matches!(
            FaceMeshLandmarker::new(&config),
            Err(DrowsinessError::ModelLoad(_))
        ));
    }

    #[test]
    fn test_preprocess_shape_and_range() {
        let mut frame = VideoFrame::blank(8, 4);
        frame.data.iter_mut().for_each(|v| *v = 255);

        let input = preprocess(&frame, 16).unwrap();
        assert_eq!(input.shape(), &[1, 16, 16, 3]);
        assert!(input.iter().all(|v| (*v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_preprocess_rejects_malformed_frame() {
        let frame = VideoFrame::new(vec![0; 7], 4, 4, 0, 0);
        assert!(matches!(
            preprocess(&frame, 16),
            Err(DrowsinessError::ImageProcessing(_))
        ));
    }

    #[test]
    fn test_decode_landmarks() {
        assert!(decode_landmarks(&[], 192).is_none());

        let set = decode_landmarks(&[96.0, 192.0, 0.0], 192).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(0).map(|p| (p.x, p.y)), Some((0.5, 1.0)));
    }

    #[test]
    fn test_sigmoid() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
    }
}
