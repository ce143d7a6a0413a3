//! The geofence hierarchy editor: containment checks, the entity store, the
//! drawing session, persistence and the tree table projection.

pub mod context;
pub mod coordinator;
pub mod draft;
pub mod projection;
pub mod session;
pub mod store;
pub mod validator;

pub use context::{Command, EditorContext, Notice, NoticeLevel, Verb};
pub use coordinator::HierarchyCoordinator;
pub use draft::{EntityDraft, GroupDraft, SiteDraft, SpotDraft};
pub use projection::{ExpansionState, TreeRow};
pub use session::{ModalState, SessionEvent, SessionState};
pub use store::{SpatialStore, Stored};
pub use validator::{point_in_polygon, polygon_in_polygon};
