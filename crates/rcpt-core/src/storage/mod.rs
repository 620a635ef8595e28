//! File naming, folder routing and destination writers.

mod naming;
mod source;
mod writer;

pub use naming::{extension_for, extension_for_content_type, generate_file_name, sanitize_label};
pub use source::{local_path, SourceImage};
pub use writer::{
    write_receipt_file, CustomFolderWriter, DefaultFolderWriter, DestinationWriter, StoredFile,
    WriteReport,
};

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Physical folder group for exported images. Distinct from the expense
/// category the user sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Fuel,
    Other,
}

impl Bucket {
    /// Folder name under `Receipts/`.
    pub fn folder_name(&self) -> &'static str {
        match self {
            Self::Fuel => "Fuel",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder_name())
    }
}

/// Route a category to its bucket: `Fuel` (any case) or everything else.
pub fn route_folder(category: &str) -> Bucket {
    let bucket = if category.eq_ignore_ascii_case("Fuel") {
        Bucket::Fuel
    } else {
        Bucket::Other
    };
    debug!("Category '{}' routed to {} bucket", category, bucket);
    bucket
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuel_any_case() {
        for category in ["Fuel", "fuel", "FUEL", "FuEl"] {
            assert_eq!(route_folder(category), Bucket::Fuel, "{}", category);
        }
    }

    #[test]
    fn test_everything_else_is_other() {
        for category in [
            "",
            "Uncategorized",
            "Food",
            "Travel",
            "Entertainment",
            "Office Supplies",
            "Fuel ",
            "Fuels",
            "Diesel",
        ] {
            assert_eq!(route_folder(category), Bucket::Other, "{:?}", category);
        }
    }

    #[test]
    fn test_folder_names() {
        assert_eq!(Bucket::Fuel.folder_name(), "Fuel");
        assert_eq!(Bucket::Other.to_string(), "Other");
    }
}
