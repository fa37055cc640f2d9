mod detections;
mod health;

pub use detections::{create_detection, create_detection_batch, get_detection, list_detections};
pub use health::health_check;
