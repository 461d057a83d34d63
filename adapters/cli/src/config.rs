//! Prototype catalog manifest loaded from TOML.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use glam::{Quat, Vec3};
use gridcrawl_core::{PrefabConfiguration, PrefabId, PrefabKind, PrototypeKey, Transform, Waypoint};
use gridcrawl_system_builder::SchedulerConfig;
use gridcrawl_system_pool::{hooks, PrewarmEntry, Prototype, PrototypeCatalog, PrototypeKind};
use serde::Deserialize;

const SUPPORTED_CATALOG_VERSION: u32 = 1;

/// Everything the host needs to construct and warm up a scheduler.
#[derive(Debug)]
pub(crate) struct Catalog {
    pub(crate) config: SchedulerConfig,
    pub(crate) prototypes: PrototypeCatalog,
    pub(crate) prewarm: Vec<PrewarmEntry>,
    pub(crate) prefabs: Vec<PrefabConfiguration>,
}

/// Reads and validates the catalog manifest at `path`.
pub(crate) fn load(path: &Path) -> Result<Catalog> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog manifest at {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid catalog manifest {}", path.display()))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    version: u32,
    tile_prototype: String,
    wall_kind: String,
    #[serde(default)]
    prototypes: Vec<PrototypeEntry>,
    #[serde(default)]
    prewarm: Vec<PrewarmLine>,
    #[serde(default)]
    prefabs: Vec<PrefabEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PrototypeEntry {
    key: String,
    kind: String,
    #[serde(default)]
    pool_bound: bool,
    setup: Option<String>,
    #[serde(default)]
    waypoints: Vec<WaypointEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WaypointEntry {
    position: [f32; 3],
    speed: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PrewarmLine {
    prototype: String,
    count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PrefabEntry {
    prototype: String,
    kind: String,
    position: [f32; 3],
    #[serde(default)]
    heading: f32,
    offset: Option<f32>,
}

fn parse(contents: &str) -> Result<Catalog> {
    let manifest: Manifest =
        toml::from_str(contents).context("failed to parse catalog manifest toml contents")?;
    if manifest.version != SUPPORTED_CATALOG_VERSION {
        bail!(
            "unsupported catalog manifest version {}; expected {}",
            manifest.version,
            SUPPORTED_CATALOG_VERSION
        );
    }

    let mut prototypes = PrototypeCatalog::new();
    for entry in manifest.prototypes {
        let prototype = prototype_from_entry(entry)?;
        let key = prototype.key().clone();
        if prototypes.insert(prototype).is_some() {
            bail!("catalog manifest contains duplicate prototype `{key}`");
        }
    }

    let tile_prototype = PrototypeKey::new(manifest.tile_prototype);
    match prototypes.get(&tile_prototype).map(Prototype::kind) {
        Some(PrototypeKind::Tile) => {}
        Some(kind) => bail!("tile prototype `{tile_prototype}` is declared as {kind:?}"),
        None => bail!("tile prototype `{tile_prototype}` is not declared"),
    }

    let prewarm = manifest
        .prewarm
        .into_iter()
        .map(|line| PrewarmEntry::new(PrototypeKey::new(line.prototype), line.count))
        .collect();

    let prefabs = manifest
        .prefabs
        .into_iter()
        .zip(0_u64..)
        .map(|(entry, id)| prefab_from_entry(entry, PrefabId::new(id)))
        .collect::<Result<Vec<_>>>()?;

    Ok(Catalog {
        config: SchedulerConfig::new(tile_prototype, PrototypeKey::new(manifest.wall_kind)),
        prototypes,
        prewarm,
        prefabs,
    })
}

fn prototype_from_entry(entry: PrototypeEntry) -> Result<Prototype> {
    let kind = parse_kind(&entry.kind)
        .with_context(|| format!("prototype `{}` has an invalid kind", entry.key))?;
    let mut prototype = Prototype::new(PrototypeKey::new(entry.key), kind);

    if entry.pool_bound {
        prototype = prototype.with_pool_binding();
    }
    if let Some(name) = entry.setup {
        let Some(hook) = hooks::by_name(&name) else {
            bail!(
                "unknown setup hook `{name}` for prototype `{}`; known hooks: {}",
                prototype.key(),
                hooks::NAMES.join(", ")
            );
        };
        prototype = prototype.with_setup(hook);
    }
    if !entry.waypoints.is_empty() {
        let preset = entry
            .waypoints
            .into_iter()
            .map(|waypoint| Waypoint::new(Vec3::from_array(waypoint.position), waypoint.speed))
            .collect();
        prototype = prototype.with_waypoint_preset(preset);
    }

    Ok(prototype)
}

fn prefab_from_entry(entry: PrefabEntry, id: PrefabId) -> Result<PrefabConfiguration> {
    let PrototypeKind::Prefab(kind) = parse_kind(&entry.kind)
        .with_context(|| format!("prefab `{}` has an invalid kind", entry.prototype))?
    else {
        bail!("prefab `{}` cannot be a grid tile", entry.prototype);
    };

    let transform = Transform::new(
        Vec3::from_array(entry.position),
        Quat::from_rotation_y(entry.heading.to_radians()),
    );
    let prototype = PrototypeKey::new(entry.prototype);

    let is_wall = matches!(
        kind,
        PrefabKind::Wall
            | PrefabKind::WallBetween
            | PrefabKind::WallForMovement
            | PrefabKind::WallOnWall
    );
    if is_wall {
        let offset = entry.offset.unwrap_or(0.0);
        return Ok(PrefabConfiguration::wall(
            id,
            prototype,
            kind,
            transform,
            offset,
            Vec::new(),
        ));
    }
    if entry.offset.is_some() {
        bail!("prefab `{prototype}` is not a wall and cannot carry an offset");
    }

    Ok(PrefabConfiguration::new(id, prototype, kind, transform))
}

fn parse_kind(name: &str) -> Result<PrototypeKind> {
    let kind = match name {
        "tile" => PrototypeKind::Tile,
        "wall" => PrototypeKind::Prefab(PrefabKind::Wall),
        "wall_between" => PrototypeKind::Prefab(PrefabKind::WallBetween),
        "wall_for_movement" => PrototypeKind::Prefab(PrefabKind::WallForMovement),
        "wall_on_wall" => PrototypeKind::Prefab(PrefabKind::WallOnWall),
        "enemy" => PrototypeKind::Prefab(PrefabKind::Enemy),
        "item" => PrototypeKind::Prefab(PrefabKind::Item),
        "prop" => PrototypeKind::Prefab(PrefabKind::Prop),
        "prefab_tile" => PrototypeKind::Prefab(PrefabKind::PrefabTile),
        _ => bail!("unknown prototype kind `{name}`"),
    };
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridcrawl_core::PrefabData;

    const SHIPPED: &str = include_str!("../../../assets/catalog.toml");

    #[test]
    fn shipped_catalog_parses() {
        let catalog = parse(SHIPPED).expect("shipped catalog should parse");

        assert_eq!(catalog.config.tile_prototype, PrototypeKey::new("floor_tile"));
        assert_eq!(catalog.prototypes.of_kind(PrototypeKind::Tile).count(), 1);
        assert!(!catalog.prewarm.is_empty());
        assert!(
            catalog
                .prefabs
                .iter()
                .any(|prefab| prefab.data.class() == gridcrawl_core::ConfigurationClass::Wall),
            "shipped catalog should exercise wall placement"
        );
    }

    #[test]
    fn manifest_rejects_unsupported_version() {
        let manifest = r#"
            version = 2
            tile_prototype = "tile"
            wall_kind = "stone"
        "#;

        assert!(parse(manifest).is_err(), "version 2 must be rejected");
    }

    #[test]
    fn manifest_requires_declared_tile_prototype() {
        let manifest = r#"
            version = 1
            tile_prototype = "tile"
            wall_kind = "stone"

            [[prototypes]]
            key = "tile"
            kind = "prop"
        "#;

        let error = parse(manifest).expect_err("tile prototype must be a tile");
        assert!(error.to_string().contains("declared as"));
    }

    #[test]
    fn manifest_rejects_unknown_setup_hooks() {
        let manifest = r#"
            version = 1
            tile_prototype = "tile"
            wall_kind = "stone"

            [[prototypes]]
            key = "tile"
            kind = "tile"
            setup = "explode"
        "#;

        let error = parse(manifest).expect_err("unknown hook must be rejected");
        assert!(format!("{error:#}").contains("explode"));
    }

    #[test]
    fn manifest_rejects_duplicate_prototypes() {
        let manifest = r#"
            version = 1
            tile_prototype = "tile"
            wall_kind = "stone"

            [[prototypes]]
            key = "tile"
            kind = "tile"

            [[prototypes]]
            key = "tile"
            kind = "tile"
        "#;

        assert!(parse(manifest).is_err(), "duplicate keys must be rejected");
    }

    #[test]
    fn prefabs_receive_sequential_identities_and_wall_data() {
        let manifest = r#"
            version = 1
            tile_prototype = "tile"
            wall_kind = "stone"

            [[prototypes]]
            key = "tile"
            kind = "tile"
            setup = "clear_walls"

            [[prototypes]]
            key = "lift"
            kind = "wall_for_movement"
            pool_bound = true
            waypoints = [
                { position = [0.0, 0.0, 0.0], speed = 1.0 },
                { position = [0.0, 2.0, 0.0] },
            ]

            [[prefabs]]
            prototype = "barrel"
            kind = "prop"
            position = [2.0, 0.0, 2.0]
            heading = 90.0

            [[prefabs]]
            prototype = "lift"
            kind = "wall_for_movement"
            position = [1.0, 0.0, 2.0]
            offset = 0.5
        "#;

        let catalog = parse(manifest).expect("manifest should parse");

        let ids: Vec<_> = catalog.prefabs.iter().map(|prefab| prefab.id).collect();
        assert_eq!(ids, vec![PrefabId::new(0), PrefabId::new(1)]);
        assert_eq!(catalog.prefabs[0].data, PrefabData::Plain);
        assert_eq!(
            catalog.prefabs[1].data,
            PrefabData::Wall {
                offset: 0.5,
                waypoints: Vec::new()
            }
        );
        let lift = catalog
            .prototypes
            .get(&PrototypeKey::new("lift"))
            .expect("declared");
        assert!(lift.pool_bound());
        assert_eq!(lift.waypoint_preset().len(), 2);
        assert_eq!(lift.waypoint_preset()[1].speed_modifier, None);
    }

    #[test]
    fn offsets_are_reserved_for_walls() {
        let manifest = r#"
            version = 1
            tile_prototype = "tile"
            wall_kind = "stone"

            [[prototypes]]
            key = "tile"
            kind = "tile"

            [[prefabs]]
            prototype = "barrel"
            kind = "prop"
            position = [0.0, 0.0, 0.0]
            offset = 1.0
        "#;

        assert!(parse(manifest).is_err());
    }
}
