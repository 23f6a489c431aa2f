pub mod shared {
    pub mod constants;
    pub mod frame;
    pub mod frame_ref;
    pub mod region;
    pub mod video_data;
}

pub mod detection {
    pub mod domain {
        pub mod face_oracle;
        pub mod raw_detection;
        pub mod region_builder;
    }
    pub mod infrastructure;
}

pub mod tracking {
    pub mod domain {
        pub mod faces_positions;
        pub mod frame_dataset;
        pub mod frame_mapper;
        pub mod gap_filler;
        pub mod sampler;
    }
}

pub mod redaction {
    pub mod domain {
        pub mod frame_redactor;
        pub mod patch;
    }
    pub mod infrastructure;
}

pub mod storage {
    pub mod domain {
        pub mod frame_storage;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod check_video_use_case;
    pub mod config;
    pub mod pipeline_logger;
    pub mod redact_shard_use_case;
    pub mod redact_video_use_case;
    pub mod shard_executor;
    pub mod shard_plan;
    pub mod track_faces_use_case;
    pub mod infrastructure {
        pub mod threaded_shard_executor;
    }
}
