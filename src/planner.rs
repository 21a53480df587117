//! Planungslogik für die Beladung eines einzelnen Containers.
//!
//! Dieses Modul implementiert die gierige Freiraum-Zerlegung: Regionen
//! werden von unten nach oben ausgewählt, pro Region wird zuerst eine
//! große Kiste versucht, andernfalls wird die Region fortlaufend mit
//! kleinen Kisten gefüllt. Jede Platzierung zerlegt die verbrauchte Region
//! per Guillotine-Schnitt in bis zu drei Restregionen.
//!
//! Es gibt kein Backtracking: eine platzierte Kiste wird nie wieder
//! entfernt oder verschoben.

use std::cmp::Ordering;

use serde::Serialize;

use crate::geometry;
use crate::model::{CaseKind, FreeRegion, PackJob, Placement};
use crate::types::{Dimensional, EPSILON_FIT, Vec3};

/// Ereignisse, die während des Packens auftreten, um Live-Visualisierung zu
/// ermöglichen.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum PackEvent {
    /// Ein Packlauf wurde gestartet.
    JobStarted {
        container: (f64, f64, f64),
        requested_large: u32,
        requested_small: u32,
    },
    /// Eine Kiste wurde platziert.
    CasePlaced {
        kind: CaseKind,
        position: (f64, f64, f64),
        dims: (f64, f64, f64),
        large_placed: u32,
        small_placed: u32,
    },
    /// Packlauf abgeschlossen.
    Finished {
        large_placed: u32,
        small_placed: u32,
        utilization_percent: f64,
    },
}

/// Ergebnis eines Packlaufs: Platzierungsliste und erreichte Stückzahlen.
#[derive(Clone, Debug, PartialEq)]
pub struct PackOutcome {
    pub placements: Vec<Placement>,
    pub large_placed: u32,
    pub small_placed: u32,
}

impl PackOutcome {
    /// Gesamtzahl der Platzierungen.
    pub fn placement_count(&self) -> usize {
        self.placements.len()
    }
}

/// Abgeleitete Kennzahlen eines Packlaufs.
///
/// Die Platzierungsrate je Typ ist `None`, wenn für den Typ nichts
/// angefordert wurde; sie wird nie als 0 erfunden.
#[derive(Clone, Debug, Serialize, utoipa::ToSchema)]
pub struct PackSummary {
    pub requested_large: u32,
    pub requested_small: u32,
    pub large_placed: u32,
    pub small_placed: u32,
    /// Platzierungsrate großer Kisten in Prozent, `null` falls nicht anwendbar.
    #[schema(nullable = true)]
    pub large_rate: Option<f64>,
    /// Platzierungsrate kleiner Kisten in Prozent, `null` falls nicht anwendbar.
    #[schema(nullable = true)]
    pub small_rate: Option<f64>,
    pub utilization_percent: f64,
    pub is_complete: bool,
}

impl PackSummary {
    /// Leitet die Kennzahlen aus Auftrag und Ergebnis ab.
    pub fn derive(job: &PackJob, outcome: &PackOutcome) -> Self {
        Self {
            requested_large: job.requested_large,
            requested_small: job.requested_small,
            large_placed: outcome.large_placed,
            small_placed: outcome.small_placed,
            large_rate: placement_rate(outcome.large_placed, job.requested_large),
            small_rate: placement_rate(outcome.small_placed, job.requested_small),
            utilization_percent: utilization_percent(job, outcome),
            is_complete: outcome.large_placed == job.requested_large
                && outcome.small_placed == job.requested_small,
        }
    }
}

/// Berechnet die volumetrische Auslastung in Prozent.
///
/// Verwendet das kanonische Volumen je Kistentyp mal erreichter Stückzahl,
/// geteilt durch das Containervolumen.
pub fn utilization_percent(job: &PackJob, outcome: &PackOutcome) -> f64 {
    let used = outcome.large_placed as f64 * job.large.volume()
        + outcome.small_placed as f64 * job.small.volume();
    used / job.container_volume() * 100.0
}

/// Platzierungsrate in Prozent, `None` bei Stückzahl 0.
fn placement_rate(placed: u32, requested: u32) -> Option<f64> {
    if requested == 0 {
        None
    } else {
        Some(placed as f64 / requested as f64 * 100.0)
    }
}

/// Führt einen Packlauf ohne Fortschrittsmeldungen aus.
///
/// # Parameter
/// * `job` - Validierter Packauftrag
///
/// # Rückgabewert
/// `PackOutcome` mit Platzierungsliste und Stückzahlen
pub fn pack_job(job: &PackJob) -> PackOutcome {
    pack_job_with_progress(job, |_| {})
}

/// Führt einen Packlauf mit Live-Progress-Callback aus.
///
/// Ruft für den Start, jede Platzierung und den Abschluss ein Callback auf
/// (geeignet für SSE/WebSocket). Der Lauf ist deterministisch: identische
/// Aufträge liefern bitgleiche Ergebnisse.
///
/// # Parameter
/// * `job` - Validierter Packauftrag
/// * `on_event` - Callback für jedes `PackEvent`
pub fn pack_job_with_progress(
    job: &PackJob,
    mut on_event: impl FnMut(&PackEvent),
) -> PackOutcome {
    on_event(&PackEvent::JobStarted {
        container: job.container,
        requested_large: job.requested_large,
        requested_small: job.requested_small,
    });

    let mut regions = vec![FreeRegion::new(Vec3::zero(), job.container_vec3())];
    let mut placements: Vec<Placement> = Vec::new();
    let mut large_placed: u32 = 0;
    let mut small_placed: u32 = 0;

    while !regions.is_empty()
        && (large_placed < job.requested_large || small_placed < job.requested_small)
    {
        sort_regions(&mut regions);
        let region = regions.remove(0);

        // Zuerst eine große Kiste versuchen, solange deren Soll offen ist.
        let mut placed_large_case = false;
        if large_placed < job.requested_large {
            if let Some(orientation) = first_fit(job.large.orientations(), &region.dims) {
                let placement = Placement {
                    kind: job.large.kind,
                    position: region.position.as_tuple(),
                    dims: orientation.as_tuple(),
                };
                placements.push(placement);
                large_placed += 1;
                on_event(&PackEvent::CasePlaced {
                    kind: placement.kind,
                    position: placement.position,
                    dims: placement.dims,
                    large_placed,
                    small_placed,
                });
                regions.extend(geometry::split_region(&region, region.position, orientation));
                placed_large_case = true;
            }
        }

        // Andernfalls dieselbe Region fortlaufend mit kleinen Kisten füllen:
        // der erste Rest wird zum neuen Arbeitsbereich, die übrigen Reste
        // gehen zurück in die Auswahl.
        if !placed_large_case && small_placed < job.requested_small {
            let mut slot = region;
            while small_placed < job.requested_small {
                let Some(orientation) = first_fit(job.small.orientations(), &slot.dims) else {
                    break;
                };
                let placement = Placement {
                    kind: job.small.kind,
                    position: slot.position.as_tuple(),
                    dims: orientation.as_tuple(),
                };
                placements.push(placement);
                small_placed += 1;
                on_event(&PackEvent::CasePlaced {
                    kind: placement.kind,
                    position: placement.position,
                    dims: placement.dims,
                    large_placed,
                    small_placed,
                });
                let mut residuals = geometry::split_region(&slot, slot.position, orientation);
                if residuals.is_empty() {
                    // Slot restlos verbraucht.
                    slot.dims = Vec3::zero();
                } else {
                    slot = residuals.remove(0);
                    regions.extend(residuals);
                }
            }
        }
    }

    let outcome = PackOutcome {
        placements,
        large_placed,
        small_placed,
    };
    on_event(&PackEvent::Finished {
        large_placed,
        small_placed,
        utilization_percent: utilization_percent(job, &outcome),
    });
    outcome
}

/// Sortiert die Regionsauswahl stabil nach (z-Position, dann Volumen).
///
/// Niedrige Regionen zuerst erzwingt schichtweises Füllen von unten; bei
/// gleicher Höhe gewinnt die kleinere Region. Gleichstände behalten ihre
/// Einfügereihenfolge.
fn sort_regions(regions: &mut [FreeRegion]) {
    regions.sort_by(|a, b| {
        a.position
            .z
            .partial_cmp(&b.position.z)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                a.volume()
                    .partial_cmp(&b.volume())
                    .unwrap_or(Ordering::Equal)
            })
    });
}

/// Liefert die erste Orientierung in Aufzählungsreihenfolge, die in die
/// Region passt.
fn first_fit(orientations: &[Vec3], region_dims: &Vec3) -> Option<Vec3> {
    orientations
        .iter()
        .copied()
        .find(|o| o.fits_within(region_dims, EPSILON_FIT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::intersects;

    /// Auftrag mit den Maßen der bekannten Deployment-Umgebung.
    fn depot_job(requested_large: u32, requested_small: u32) -> PackJob {
        PackJob::new(
            (6058.0, 2591.0, 2438.0),
            (1105.0, 1265.0, 975.0),
            (221.0, 96.3, 90.3),
            requested_large,
            requested_small,
        )
        .expect("valid depot job")
    }

    #[test]
    fn zero_requests_yield_empty_outcome() {
        let job = depot_job(0, 0);
        let outcome = pack_job(&job);

        assert!(outcome.placements.is_empty());
        assert_eq!(outcome.large_placed, 0);
        assert_eq!(outcome.small_placed, 0);

        let summary = PackSummary::derive(&job, &outcome);
        assert_eq!(summary.utilization_percent, 0.0);
        assert_eq!(summary.large_rate, None);
        assert_eq!(summary.small_rate, None);
        assert!(summary.is_complete);
    }

    #[test]
    fn large_only_fills_ten() {
        let job = depot_job(10, 0);
        let outcome = pack_job(&job);

        assert_eq!(outcome.large_placed, 10);
        assert_eq!(outcome.small_placed, 0);
        assert_eq!(outcome.placement_count(), 10);

        // Erste Platzierung an der Minimalecke, Bodenlage zuerst.
        assert_eq!(outcome.placements[0].position, (0.0, 0.0, 0.0));
        assert_eq!(outcome.placements[0].dims, (1265.0, 1105.0, 975.0));
        for placement in &outcome.placements[..4] {
            assert_eq!(placement.position.2, 0.0);
        }

        let utilization = utilization_percent(&job, &outcome);
        assert!((utilization - 35.61451512190847).abs() < 1e-9);
        assert!(utilization < 100.0);
    }

    #[test]
    fn large_only_placements_do_not_overlap() {
        let outcome = pack_job(&depot_job(10, 0));
        for (i, a) in outcome.placements.iter().enumerate() {
            for b in &outcome.placements[i + 1..] {
                assert!(!intersects(a, b), "Platzierungen überschneiden sich");
            }
        }
    }

    #[test]
    fn capacity_limits_large_cases() {
        // Der Container fasst höchstens 16 große Kisten; eine Unterdeckung
        // ist ein normales Ergebnis, kein Fehler.
        let job = depot_job(40, 0);
        let outcome = pack_job(&job);

        assert_eq!(outcome.large_placed, 16);
        let summary = PackSummary::derive(&job, &outcome);
        assert!(!summary.is_complete);
        assert_eq!(summary.large_rate, Some(40.0));
    }

    #[test]
    fn small_only_places_all_hundred() {
        let job = depot_job(0, 100);
        let outcome = pack_job(&job);

        assert_eq!(outcome.small_placed, 100);
        assert_eq!(outcome.large_placed, 0);
        assert!(outcome.placements.iter().all(|p| p.kind == CaseKind::Small));

        let utilization = utilization_percent(&job, &outcome);
        assert!((utilization - 0.5021990974414962).abs() < 1e-9);
        assert!(utilization < 1.0);
    }

    #[test]
    fn mixed_run_satisfies_both_quotas_large_first() {
        let job = depot_job(10, 100);
        let outcome = pack_job(&job);

        assert_eq!(outcome.large_placed, 10);
        assert_eq!(outcome.small_placed, 100);
        assert_eq!(outcome.placements[0].kind, CaseKind::Large);
    }

    #[test]
    fn placement_extents_come_from_orientation_sets() {
        let job = depot_job(10, 100);
        let outcome = pack_job(&job);
        let container = job.container_vec3();

        for placement in &outcome.placements {
            let spec = match placement.kind {
                CaseKind::Large => &job.large,
                CaseKind::Small => &job.small,
            };
            let dims = Vec3::from_tuple(placement.dims);
            assert!(
                spec.orientations().contains(&dims),
                "Orientierung nicht in der Aufzählung des Kistentyps"
            );
            assert!(dims.fits_within(&container, EPSILON_FIT));
        }
    }

    #[test]
    fn idempotent_runs_produce_identical_outcomes() {
        let job = depot_job(10, 100);
        let first = pack_job(&job);
        let second = pack_job(&job);
        assert_eq!(first, second);
    }

    #[test]
    fn placed_counts_are_monotonic_in_requests() {
        let five = pack_job(&depot_job(5, 0));
        let ten = pack_job(&depot_job(10, 0));
        assert!(five.large_placed <= ten.large_placed);

        let fifty = pack_job(&depot_job(0, 50));
        let hundred = pack_job(&depot_job(0, 100));
        assert!(fifty.small_placed <= hundred.small_placed);
    }

    #[test]
    fn oversized_type_places_zero_without_fault() {
        // Kleine Kiste passt in keiner Orientierung; der andere Typ wird
        // dennoch verarbeitet.
        let job = PackJob::new(
            (6058.0, 2591.0, 2438.0),
            (1105.0, 1265.0, 975.0),
            (7000.0, 96.3, 90.3),
            5,
            50,
        )
        .expect("valid job");
        let outcome = pack_job(&job);

        assert_eq!(outcome.large_placed, 5);
        assert_eq!(outcome.small_placed, 0);
    }

    #[test]
    fn severe_scenario_fills_both_quotas() {
        let job = depot_job(16, 2138);
        let outcome = pack_job(&job);

        assert_eq!(outcome.large_placed, 16);
        assert_eq!(outcome.small_placed, 2138);

        let utilization = utilization_percent(&job, &outcome);
        assert!((utilization - 67.72024089835274).abs() < 1e-9);
    }

    #[test]
    fn mini_mixed_run_matches_expected_layout() {
        let job = PackJob::new((10.0, 10.0, 10.0), (6.0, 5.0, 4.0), (2.0, 2.0, 2.0), 1, 3)
            .expect("valid job");
        let outcome = pack_job(&job);

        let expected = vec![
            Placement {
                kind: CaseKind::Large,
                position: (0.0, 0.0, 0.0),
                dims: (6.0, 5.0, 4.0),
            },
            Placement {
                kind: CaseKind::Small,
                position: (0.0, 5.0, 0.0),
                dims: (2.0, 2.0, 2.0),
            },
            Placement {
                kind: CaseKind::Small,
                position: (2.0, 5.0, 0.0),
                dims: (2.0, 2.0, 2.0),
            },
            Placement {
                kind: CaseKind::Small,
                position: (4.0, 5.0, 0.0),
                dims: (2.0, 2.0, 2.0),
            },
        ];
        assert_eq!(outcome.placements, expected);
    }

    #[test]
    fn small_cases_fill_cube_completely() {
        let job = PackJob::new((4.0, 4.0, 4.0), (6.0, 5.0, 4.0), (2.0, 2.0, 2.0), 0, 8)
            .expect("valid job");
        let outcome = pack_job(&job);

        assert_eq!(outcome.small_placed, 8);
        let positions: Vec<_> = outcome.placements.iter().map(|p| p.position).collect();
        assert_eq!(
            positions,
            vec![
                (0.0, 0.0, 0.0),
                (2.0, 0.0, 0.0),
                (2.0, 2.0, 0.0),
                (2.0, 2.0, 2.0),
                (0.0, 2.0, 0.0),
                (0.0, 2.0, 2.0),
                (0.0, 0.0, 2.0),
                (2.0, 0.0, 2.0),
            ]
        );

        let utilization = utilization_percent(&job, &outcome);
        assert!((utilization - 100.0).abs() < 1e-9);
    }

    #[test]
    fn progress_events_bracket_the_run() {
        let job = PackJob::new((10.0, 10.0, 10.0), (6.0, 5.0, 4.0), (2.0, 2.0, 2.0), 1, 3)
            .expect("valid job");
        let mut events: Vec<PackEvent> = Vec::new();
        let outcome = pack_job_with_progress(&job, |evt| events.push(evt.clone()));

        assert_eq!(events.len(), outcome.placement_count() + 2);
        assert!(matches!(events.first(), Some(PackEvent::JobStarted { .. })));
        match events.last() {
            Some(PackEvent::Finished {
                large_placed,
                small_placed,
                ..
            }) => {
                assert_eq!(*large_placed, outcome.large_placed);
                assert_eq!(*small_placed, outcome.small_placed);
            }
            other => panic!("Abschlussereignis fehlt: {:?}", other),
        }

        let placed_events = events
            .iter()
            .filter(|e| matches!(e, PackEvent::CasePlaced { .. }))
            .count();
        assert_eq!(placed_events, outcome.placement_count());
    }

    #[test]
    fn summary_rates_follow_requests() {
        let job = depot_job(10, 0);
        let outcome = pack_job(&job);
        let summary = PackSummary::derive(&job, &outcome);

        assert_eq!(summary.large_rate, Some(100.0));
        assert_eq!(summary.small_rate, None);
        assert!(summary.is_complete);
    }
}
