//! Terminal console: the site tree, the map canvas and the entity editor.

pub mod app;
pub mod dashboard;
pub mod form;
pub mod map_view;

pub use app::{App, InputMode, Screen};
pub use form::{EditorForm, Field};
pub use map_view::{DrawMode, MapView, Viewport};
