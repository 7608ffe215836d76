pub mod generate_mesh;
pub mod run_application;
pub mod show_runtime_info;

pub use generate_mesh::GenerateMeshUseCase;
pub use run_application::RunApplicationUseCase;
pub use show_runtime_info::ShowRuntimeInfoUseCase;
