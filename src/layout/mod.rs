//! Page layout reconstruction from OCR word boxes.
//!
//! Each page is transcribed on its own: recognized words are filtered by
//! confidence and mapped from image pixels to page coordinates, producing
//! positioned runs in the engine's native order.

pub mod transcriber;

pub use transcriber::{PageTranscriber, PageTranscription, PositionedRun};
