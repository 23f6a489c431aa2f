pub mod blur_transform;
mod gaussian;
pub mod icon_transform;
pub mod pixelate_transform;
pub mod redactor_factory;
