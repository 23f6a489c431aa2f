pub mod fs_frame_storage;
pub mod memory_frame_storage;
pub mod png_frame_codec;
