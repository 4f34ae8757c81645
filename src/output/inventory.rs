//! Mirror inventory
//!
//! Walks an existing mirror and counts artifacts by kind, using only file
//! names. Enough to judge how complete a mirror is without opening anything.

use crate::mirror::ArtifactKind;
use crate::MirrorError;
use ignore::WalkBuilder;
use std::path::Path;

/// Artifact counts found under a mirror root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorInventory {
    pub directories: u64,
    pub info: u64,
    pub records: u64,
    pub missing: u64,
    /// Files that are not artifacts (leftover temporaries and the like)
    pub other_files: u64,
}

impl MirrorInventory {
    pub fn artifacts(&self) -> u64 {
        self.info + self.records + self.missing
    }
}

/// Scans `root` recursively
///
/// Hidden files are included so interrupted writes show up under
/// `other_files`. Ignore files are not honored: the mirror is data.
pub fn scan_mirror(root: &Path) -> Result<MirrorInventory, MirrorError> {
    if !root.is_dir() {
        return Err(MirrorError::io(
            root,
            std::io::Error::new(std::io::ErrorKind::NotFound, "mirror root is not a directory"),
        ));
    }

    let mut inventory = MirrorInventory::default();
    let walker = WalkBuilder::new(root).standard_filters(false).build();

    for entry in walker {
        let entry = entry.map_err(|e| {
            MirrorError::io(
                root,
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "walk failed")),
            )
        })?;

        let Some(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            if entry.depth() > 0 {
                inventory.directories += 1;
            }
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        match ArtifactKind::parse_file_name(&name) {
            Some((ArtifactKind::Info, _)) => inventory.info += 1,
            Some((ArtifactKind::Record, _)) => inventory.records += 1,
            Some((ArtifactKind::Missing, _)) => inventory.missing += 1,
            None => inventory.other_files += 1,
        }
    }

    Ok(inventory)
}

/// Prints an inventory to stdout
pub fn print_inventory(root: &Path, inventory: &MirrorInventory) {
    println!("=== Mirror Inventory ===\n");
    println!("Root: {}", root.display());
    println!("  Directories: {}", inventory.directories);
    println!("  Listings (_INFO):    {}", inventory.info);
    println!("  Records (RECORD):    {}", inventory.records);
    println!("  Missing (_MISSING):  {}", inventory.missing);
    if inventory.other_files > 0 {
        println!("  Other files:         {}", inventory.other_files);
    }
}
