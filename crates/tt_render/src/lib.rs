pub mod batch;
pub mod camera;
pub mod gpu_context;
pub mod quad_pipeline;
pub mod vertex;

pub use batch::{Color, QuadBatch};
pub use camera::{Camera2D, CameraUniform};
pub use gpu_context::GpuContext;
pub use quad_pipeline::QuadRenderer;
pub use vertex::QuadVertex;
