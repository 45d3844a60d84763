use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(ProductId);

/// Fixed category set accepted by the remote catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    #[default]
    Clothes,
    Electronics,
    Furniture,
    Shoes,
    Miscellaneous,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Clothes,
        Category::Electronics,
        Category::Furniture,
        Category::Shoes,
        Category::Miscellaneous,
    ];

    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(Self::Clothes),
            2 => Some(Self::Electronics),
            3 => Some(Self::Furniture),
            4 => Some(Self::Shoes),
            5 => Some(Self::Miscellaneous),
            _ => None,
        }
    }

    pub fn id(self) -> i64 {
        match self {
            Self::Clothes => 1,
            Self::Electronics => 2,
            Self::Furniture => 3,
            Self::Shoes => 4,
            Self::Miscellaneous => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Clothes => "Clothes",
            Self::Electronics => "Electronics",
            Self::Furniture => "Furniture",
            Self::Shoes => "Shoes",
            Self::Miscellaneous => "Miscellaneous",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
