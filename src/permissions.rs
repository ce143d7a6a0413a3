//! Role lookup consumed as a yes/no capability check.

use crate::model::EntityKind;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Edit,
    Delete,
    View,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::View => "view",
        })
    }
}

pub trait PermissionCheck {
    fn can_perform(&self, action: Action, kind: EntityKind) -> bool;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Admin,
    Operator,
    Viewer,
}

/// Static role table: admins do everything, operators manage groups and
/// spots inside existing sites, viewers only look.
#[derive(Debug, Clone, Copy)]
pub struct RolePermissions {
    role: Role,
}

impl RolePermissions {
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self { role }
    }
}

impl PermissionCheck for RolePermissions {
    fn can_perform(&self, action: Action, kind: EntityKind) -> bool {
        match (self.role, action) {
            (Role::Admin, _) | (_, Action::View) => true,
            (Role::Operator, _) => kind != EntityKind::Site,
            (Role::Viewer, _) => false,
        }
    }
}

impl<P: PermissionCheck + ?Sized> PermissionCheck for &P {
    fn can_perform(&self, action: Action, kind: EntityKind) -> bool {
        (**self).can_perform(action, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_cannot_touch_sites() {
        let perms = RolePermissions::new(Role::Operator);
        assert!(perms.can_perform(Action::View, EntityKind::Site));
        assert!(!perms.can_perform(Action::Create, EntityKind::Site));
        assert!(!perms.can_perform(Action::Delete, EntityKind::Site));
        assert!(perms.can_perform(Action::Create, EntityKind::Group));
        assert!(perms.can_perform(Action::Delete, EntityKind::Spot));
    }

    #[test]
    fn test_viewer_is_read_only() {
        let perms = RolePermissions::new(Role::Viewer);
        assert!(perms.can_perform(Action::View, EntityKind::Spot));
        assert!(!perms.can_perform(Action::Edit, EntityKind::Spot));
        assert!(!perms.can_perform(Action::Create, EntityKind::Group));
    }

    #[test]
    fn test_admin_can_do_everything() {
        let perms = RolePermissions::new(Role::Admin);
        assert!(perms.can_perform(Action::Delete, EntityKind::Site));
    }
}
