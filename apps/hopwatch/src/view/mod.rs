pub mod draw;
pub mod model;

pub use draw::{render_frame, UiOpts};
pub use model::ViewState;
