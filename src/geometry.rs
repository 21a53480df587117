//! Geometrische Kernfunktionen für die Freiraum-Zerlegung.
//!
//! Dieses Modul liefert die Rotationsaufzählung für Kistentypen, den
//! Guillotine-Schnitt einer Region nach einer Platzierung sowie eine
//! AABB-Überschneidungsprüfung für platzierte Kisten.

use std::cmp::Ordering;

use crate::model::{FreeRegion, Placement};
use crate::types::{EPSILON_FIT, Vec3};

/// Erzeugt alle unterscheidbaren achsenparallelen Orientierungen eines
/// Kantenmaßes.
///
/// Alle 6 Permutationen der drei Kantenlängen werden erzeugt und jeweils
/// absteigend sortiert kanonisiert; doppelte kanonische Formen werden in
/// Einfügereihenfolge verworfen. Die Komponenten des Ergebnisses werden
/// stromabwärts positional auf die feste Achsenreihenfolge (x, y, z)
/// angewendet.
///
/// # Parameter
/// * `dims` - Kantenlängen (Länge, Breite, Höhe) wie geliefert
///
/// # Rückgabewert
/// Deduplizierte Orientierungen in deterministischer Reihenfolge
pub fn orientations(dims: (f64, f64, f64)) -> Vec<Vec3> {
    let (a, b, c) = dims;
    let permutations = [
        (a, b, c),
        (a, c, b),
        (b, a, c),
        (b, c, a),
        (c, a, b),
        (c, b, a),
    ];

    let mut result: Vec<Vec3> = Vec::new();
    for (p, q, r) in permutations {
        let mut edges = [p, q, r];
        edges.sort_by(|x, y| y.partial_cmp(x).unwrap_or(Ordering::Equal));
        let canonical = Vec3::new(edges[0], edges[1], edges[2]);
        if !result.contains(&canonical) {
            result.push(canonical);
        }
    }
    result
}

/// Zerlegt eine Region nach einer Platzierung in bis zu drei Restregionen.
///
/// Die drei Reste werden je Achse unabhängig aus der URSPRÜNGLICHEN Region
/// und der platzierten Kiste berechnet; sie bilden im Allgemeinen keine
/// disjunkte Partition des Restvolumens. Reste, deren Länge entlang der
/// Schnittachse die Toleranz nicht überschreitet, entfallen.
///
/// # Parameter
/// * `region` - Die verbrauchte Region
/// * `placed_pos` - Position der platzierten Kiste (an allen Aufrufstellen
///   gleich `region.position`)
/// * `placed_dims` - Gewählte Orientierung der platzierten Kiste
///
/// # Rückgabewert
/// 0 bis 3 Restregionen in fester Achsenreihenfolge (x, y, z)
pub fn split_region(region: &FreeRegion, placed_pos: Vec3, placed_dims: Vec3) -> Vec<FreeRegion> {
    let mut residuals = Vec::new();

    let remaining_x = region.dims.x - (placed_pos.x - region.position.x + placed_dims.x);
    if remaining_x > EPSILON_FIT {
        residuals.push(FreeRegion::new(
            Vec3::new(
                placed_pos.x + placed_dims.x,
                region.position.y,
                region.position.z,
            ),
            Vec3::new(remaining_x, region.dims.y, region.dims.z),
        ));
    }

    let remaining_y = region.dims.y - (placed_pos.y - region.position.y + placed_dims.y);
    if remaining_y > EPSILON_FIT {
        residuals.push(FreeRegion::new(
            Vec3::new(
                region.position.x,
                placed_pos.y + placed_dims.y,
                region.position.z,
            ),
            Vec3::new(placed_dims.x, remaining_y, region.dims.z),
        ));
    }

    let remaining_z = region.dims.z - (placed_pos.z - region.position.z + placed_dims.z);
    if remaining_z > EPSILON_FIT {
        residuals.push(FreeRegion::new(
            Vec3::new(
                region.position.x,
                region.position.y,
                placed_pos.z + placed_dims.z,
            ),
            Vec3::new(placed_dims.x, placed_dims.y, remaining_z),
        ));
    }

    residuals
}

/// Prüft, ob zwei platzierte Kisten sich räumlich überschneiden.
///
/// Axis-Aligned Bounding Box Prüfung: zwei Kisten überschneiden sich NICHT,
/// wenn sie in mindestens einer Achse vollständig getrennt sind. Berührende
/// Flächen gelten nicht als Überschneidung.
///
/// # Parameter
/// * `a` - Erste platzierte Kiste
/// * `b` - Zweite platzierte Kiste
///
/// # Rückgabewert
/// `true` wenn sich die Kisten überschneiden, sonst `false`
#[allow(dead_code)]
pub fn intersects(a: &Placement, b: &Placement) -> bool {
    let (ax, ay, az) = a.position;
    let (al, aw, ah) = a.dims;
    let (bx, by, bz) = b.position;
    let (bl, bw, bh) = b.dims;

    !(ax + al <= bx
        || bx + bl <= ax
        || ay + aw <= by
        || by + bw <= ay
        || az + ah <= bz
        || bz + bh <= az)
}
