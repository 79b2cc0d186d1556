pub mod pipeline_logger;
pub mod reconstruct_image_use_case;
pub mod reconstruct_video_use_case;
pub mod reconstruction_summary;
