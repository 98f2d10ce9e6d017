//! # Traversal Driver (`pipeline::traverse`)
//!
//! File: cli/src/pipeline/traverse.rs
//!
//! Walks one source path and emits every entry below it. Each walked entry
//! is snapshotted into a `SourceEntry`, its archive path is made relative,
//! it is recorded in the caller's list, the walker is allowed to descend into
//! it, and it is emitted. The walk session is closed whether the loop ends
//! at EOF or on an error.
//!
//! When the archive is being written to a file inside the walked tree, that
//! file is left out.
//!
use crate::common::archive::writer::ArchiveWriter;
use crate::common::fs::entry::SourceEntry;
use crate::common::fs::walk::DiskWalker;
use crate::core::error::Result;
use std::path::Path;
use tracing::{debug, info, warn};

/// Archives everything below `root`, appending one `SourceEntry` per walked
/// object to `added`. Entries are recorded before they are emitted, so on
/// failure the last element is the entry that failed.
pub fn traverse(
    writer: &mut ArchiveWriter<'_>,
    root: &Path,
    block_size: usize,
    added: &mut Vec<SourceEntry>,
) -> Result<()> {
    let mut walker = DiskWalker::open(root)?;
    let result = walk_all(&mut walker, writer, block_size, added);
    match (result, walker.close()) {
        (Ok(()), close) => close,
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            warn!("Failed to close disk walk at {:?}: {}", root, close_err);
            Err(e)
        }
    }
}

fn walk_all(
    walker: &mut DiskWalker,
    writer: &mut ArchiveWriter<'_>,
    block_size: usize,
    added: &mut Vec<SourceEntry>,
) -> Result<()> {
    let start = added.len();
    while let Some(mut raw) = walker.next_header()? {
        if raw.file_id().is_some() && raw.file_id() == writer.skip_file() {
            info!("Skipping {:?}: it is the archive being written", raw.pathname());
            continue;
        }
        let mut entry = SourceEntry::from_raw(&raw);
        entry.normalize(&mut raw);
        added.push(entry);
        walker.descend();

        let idx = added.len() - 1;
        super::emit::emit(writer, &mut added[idx], &raw, block_size)?;
        info!("a {}", added[idx].archive_path().display());
    }
    debug!(
        "Finished {:?}: {} entries",
        walker.root(),
        added.len() - start
    );
    Ok(())
}
