use qwery_store::{IdPrefix, StorageKey};

/// Parse an entity kind by name (`project`) or tag (`prj`).
pub fn parse_entity(value: &str) -> anyhow::Result<IdPrefix> {
    IdPrefix::parse(value).ok_or_else(|| {
        let known = IdPrefix::ALL
            .iter()
            .map(|prefix| prefix.entity_name())
            .collect::<Vec<_>>()
            .join(", ");
        anyhow::anyhow!("Unknown entity \"{}\". Expected one of: {}", value, known)
    })
}

/// Split CLI arguments into key segments; `a/b/c` counts as three.
fn split_segments(args: &[String]) -> Vec<&str> {
    args.iter()
        .flat_map(|arg| arg.split('/'))
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Parse a document key.
pub fn parse_key(args: &[String]) -> anyhow::Result<StorageKey> {
    let segments = split_segments(args);
    if segments.is_empty() {
        return Err(anyhow::anyhow!("Key must have at least one segment"));
    }
    StorageKey::new(segments).map_err(|e| anyhow::anyhow!("Invalid key: {}", e))
}

/// Parse a listing prefix; `None` when no segments were given.
pub fn parse_prefix(args: &[String]) -> anyhow::Result<Option<StorageKey>> {
    let segments = split_segments(args);
    if segments.is_empty() {
        return Ok(None);
    }
    let prefix =
        StorageKey::new(segments).map_err(|e| anyhow::anyhow!("Invalid prefix: {}", e))?;
    Ok(Some(prefix))
}
