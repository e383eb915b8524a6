//! Per-trajectory material accumulation.
//!
//! Walks the active-element layers and the inactive-element groups for one
//! trajectory, applies the angle-dependent scaling, and sums contributions
//! into a running [`Material`] total while recording hits and filling the
//! shared accumulators in the [`ScanContext`].

use log::debug;

use crate::geom::ray::Ray;
use crate::sim::context::ScanContext;
use crate::sim::elements::{
    InactiveElement, Orientation, ServiceCategory, Subdetector, Tracker,
};
use crate::sim::materials::Material;
use crate::sim::track::{ElementRef, Hit, HitKind, InactiveGroup, Track};

/// Accumulates the active-element material crossed by the track.
///
/// Modules entirely on the negative-z side are skipped (the scan only
/// fires into z+), as are degenerate modules. When `is_pixel` is set the
/// cell grid and category histograms are not written; occupancy and hits
/// are still recorded.
pub fn accumulate_active(
    tracker: &Tracker,
    track: &mut Track,
    ctx: &mut ScanContext,
    is_pixel: bool,
) -> Material {
    let theta = track.theta;
    let eta = track.eta;
    let ray = Ray::from_angles(theta, track.phi);
    let mut total = Material::ZERO;

    for (li, layer) in tracker.layers.iter().enumerate() {
        for (mi, module) in layer.modules.iter().enumerate() {
            if module.max_z <= 0.0 {
                continue;
            }
            if module.is_degenerate() {
                debug!("degenerate module {mi} in layer {} treated as missed", layer.name);
                continue;
            }
            let Some(distance) = ray.cross_quadrilateral(&module.corners) else {
                continue;
            };

            if is_pixel {
                ctx.pixel_occupancy[li][mi] += 1;
            } else {
                ctx.occupancy[li][mi] += 1;
            }

            // Local radius of the crossing, used for both map grids
            let r = distance * theta.sin();
            ctx.position_map.fill_rt(r, theta, module.material);

            let scaled = module
                .material
                .scaled(module.subdetector.path_scale(theta));
            total += scaled;

            if !is_pixel {
                ctx.cell_grid.fill(eta, r, scaled);
                match module.subdetector {
                    Subdetector::Barrel => ctx.histograms.active_barrel.fill(eta, scaled),
                    Subdetector::Endcap => ctx.histograms.active_endcap.fill(eta, scaled),
                }
                ctx.histograms.global.fill(eta, scaled);
            }

            track.add_hit(Hit {
                distance,
                orientation: module.subdetector.hit_orientation(),
                kind: HitKind::Active,
                material: scaled,
                element: Some(ElementRef::Module {
                    layer: li,
                    index: mi,
                }),
            });
        }
    }
    total
}

/// Accumulates the material of one inactive-element group.
///
/// Only elements reaching into z >= 0, matching the category filter (if
/// any) and covering the trajectory pseudorapidity are considered; those
/// are then confirmed with the exact disk/cylinder crossing. Elements
/// inside the tracking volume contribute to the running total, the cell
/// grid and the category histograms; elements outside it only fill the
/// "extra" histograms and leave the hit ledger alone.
pub fn accumulate_inactive(
    elements: &[InactiveElement],
    group: InactiveGroup,
    track: &mut Track,
    ctx: &mut ScanContext,
    category_filter: Option<ServiceCategory>,
    is_pixel: bool,
) -> Material {
    let theta = track.theta;
    let eta = track.eta;
    let ray = Ray::from_angles(theta, track.phi);
    let mut total = Material::ZERO;

    for (idx, elem) in elements.iter().enumerate() {
        if !elem.reaches_forward() {
            continue;
        }
        if elem.is_degenerate() {
            debug!("degenerate inactive volume {idx} in {group:?} treated as missed");
            continue;
        }
        if let Some(cat) = category_filter
            && elem.category != cat
        {
            continue;
        }
        if !elem.covers_eta(eta) {
            continue;
        }

        let (r, z, crossing) = match elem.orientation {
            Orientation::Vertical => {
                let z = elem.mid_z();
                let r = z * theta.tan();
                let hit = ray.cross_disk(z, elem.inner_radius, elem.inner_radius + elem.r_width);
                (r, z, hit)
            }
            Orientation::Horizontal => {
                let r = elem.mid_radius();
                let hit = ray.cross_cylinder(r, elem.z_offset, elem.z_offset + elem.z_length);
                (r, elem.mid_z(), hit)
            }
        };
        let Some(distance) = crossing else {
            continue;
        };

        ctx.position_map.fill_rz(r, z, elem.material);

        let scaled = elem.material.scaled(scale_factor(elem, theta));

        if elem.in_tracking_volume {
            total += scaled;
            if !is_pixel {
                ctx.cell_grid.fill(eta, r, scaled);
                match group {
                    InactiveGroup::BarrelServices => {
                        ctx.histograms.services_barrel.fill(eta, scaled)
                    }
                    InactiveGroup::EndcapServices => {
                        ctx.histograms.services_endcap.fill(eta, scaled)
                    }
                    InactiveGroup::Supports => ctx.histograms.supports.fill(eta, scaled),
                }
                ctx.histograms.global.fill(eta, scaled);
            }
            track.add_hit(Hit {
                distance,
                orientation: elem.orientation,
                kind: HitKind::Inactive,
                material: scaled,
                element: Some(ElementRef::Service { group, index: idx }),
            });
        } else if !is_pixel {
            ctx.histograms.extra.fill(eta, scaled);
        }
    }
    total
}

/// Path-length scale for an inactive volume.
///
/// Decision table over orientation and category: normal volumes scale by
/// `1/cos(theta)` (vertical) or `1/sin(theta)` (horizontal); user-defined
/// supports clamp the traversed path to
/// `min(z_length/cos(theta), r_width/sin(theta))`, normalized by the
/// nominal traversal (z_length for vertical volumes, r_width for
/// horizontal ones) so the material never grows without bound near
/// grazing angles.
fn scale_factor(elem: &InactiveElement, theta: f64) -> f64 {
    let clamped_path = (elem.z_length / theta.cos()).min(elem.r_width / theta.sin());
    match (elem.orientation, elem.category) {
        (Orientation::Vertical, ServiceCategory::UserSupport) => clamped_path / elem.z_length,
        (Orientation::Vertical, _) => 1.0 / theta.cos(),
        (Orientation::Horizontal, ServiceCategory::UserSupport) => clamped_path / elem.r_width,
        (Orientation::Horizontal, _) => 1.0 / theta.sin(),
    }
}
