mod canvas;

pub use canvas::CanvasClient;
