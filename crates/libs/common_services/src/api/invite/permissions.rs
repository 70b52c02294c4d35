use crate::database::invite::invite::PermissionSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Display;
use utoipa::ToSchema;

/// An action a visitor can take on a gallery or one of its photos.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    View,
    Favorite,
    Comment,
    Download,
    RequestPurchase,
}

impl Operation {
    pub const ALL: [Self; 5] = [
        Self::View,
        Self::Favorite,
        Self::Comment,
        Self::Download,
        Self::RequestPurchase,
    ];
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::View => "viewing",
            Self::Favorite => "favoriting",
            Self::Comment => "commenting",
            Self::Download => "downloading",
            Self::RequestPurchase => "purchase requests",
        };
        f.write_str(s)
    }
}

/// Straight flag lookup. Holding a valid invite grants nothing by itself, and no flag
/// implies another.
#[must_use]
pub const fn is_allowed(permissions: &PermissionSet, operation: Operation) -> bool {
    match operation {
        Operation::View => permissions.can_view,
        Operation::Favorite => permissions.can_favorite,
        Operation::Comment => permissions.can_comment,
        Operation::Download => permissions.can_download,
        Operation::RequestPurchase => permissions.can_request_purchase,
    }
}

impl PermissionSet {
    /// The operations the UI may offer.
    #[must_use]
    pub fn allowed_operations(&self) -> Vec<Operation> {
        Operation::ALL
            .into_iter()
            .filter(|op| is_allowed(self, *op))
            .collect()
    }
}
