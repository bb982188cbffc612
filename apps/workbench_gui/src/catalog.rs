//! Entity catalog loading, with a built-in demo set used when no external
//! catalog file is configured.

use directory::EntityDirectory;
use shared::domain::{EntityKind, EntityRef, Nid, PublicId};
use uuid::Uuid;

pub fn load(catalog_path: Option<&std::path::PathBuf>) -> EntityDirectory {
    if let Some(path) = catalog_path {
        match std::fs::read_to_string(path) {
            Ok(raw) => match EntityDirectory::from_catalog_json(&raw) {
                Ok(directory) => return directory,
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "malformed catalog; using demo data");
                }
            },
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "unreadable catalog; using demo data");
            }
        }
    }
    demo()
}

fn demo() -> EntityDirectory {
    let entries = [
        (101, "SARS-CoV-2 RNA", EntityKind::Concept),
        (102, "Influenza A antigen", EntityKind::Concept),
        (103, "Detected", EntityKind::Concept),
        (104, "Not detected", EntityKind::Concept),
        (105, "Allowable results", EntityKind::ComponentSet),
        (106, "Nasopharyngeal swab", EntityKind::Concept),
        (107, "Serum specimen", EntityKind::Concept),
    ];
    let mut directory = EntityDirectory::new();
    for (nid, description, kind) in entries {
        directory.insert(EntityRef {
            nid: Nid(nid),
            public_id: PublicId(Uuid::new_v5(&Uuid::NAMESPACE_OID, description.as_bytes())),
            description: description.to_string(),
            kind,
        });
    }
    directory
}
