pub mod http_face_oracle;
pub mod recorded_face_oracle;
