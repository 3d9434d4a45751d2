pub mod plasma_scene;
pub mod scene_renderer;
