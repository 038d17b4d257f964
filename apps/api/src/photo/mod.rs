pub mod handlers;
pub mod ocr;
pub mod solution;
