//! Loading and editing ComfyUI workflow graphs.
pub mod graph;

pub use graph::{apply_params_map, collect_output_images, ensure_filename_prefix, load_workflow, OutputImage};
