// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reading and writing datastore state files

use anyhow::Context;
use camino::Utf8Path;
use camino_tempfile::NamedUtf8TempFile;
use provision_db_queries::db::datastore::StoreSnapshot;
use std::io::Write;

pub fn load(path: &Utf8Path) -> anyhow::Result<StoreSnapshot> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {path}"))
}

/// Writes `snapshot` to `path`, replacing whatever was there in one step
pub fn save(path: &Utf8Path, snapshot: &StoreSnapshot) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let mut file = NamedUtf8TempFile::new_in(dir)
        .with_context(|| format!("creating temporary file in {dir}"))?;
    serde_json::to_writer_pretty(&mut file, snapshot)
        .with_context(|| format!("serializing state for {path}"))?;
    file.write_all(b"\n")
        .with_context(|| format!("writing state for {path}"))?;
    file.persist(path).with_context(|| format!("replacing {path}"))?;
    Ok(())
}
