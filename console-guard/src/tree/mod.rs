pub mod editor;

pub use editor::{CheckChange, PermissionTreeEditor, TreeSelectionState};
