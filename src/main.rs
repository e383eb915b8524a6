use anyhow::Result;
use std::f64::consts::FRAC_PI_2;

use matscan::{
    EtaScan, InactiveElement, Layer, Material, Module, Orientation, ScanConfig, ServiceCategory,
    Tracker,
};

fn main() -> Result<()> {
    env_logger::init();

    // Toy layout: three barrel layers, one endcap disk, a service tube
    // and a support ring.
    let mut tracker = Tracker::new(400.0, 1400.0);
    for (i, radius) in [100.0, 200.0, 300.0].into_iter().enumerate() {
        let module = Module::barrel(
            radius,
            -700.0,
            700.0,
            60.0,
            FRAC_PI_2,
            Material::new(0.018, 0.009),
        );
        tracker
            .layers
            .push(Layer::new(&format!("barrel_{}", i + 1), vec![module]));
    }
    tracker.layers.push(Layer::new(
        "disk_1",
        vec![Module::endcap(
            800.0,
            50.0,
            350.0,
            80.0,
            FRAC_PI_2,
            Material::new(0.020, 0.010),
        )],
    ));
    tracker.barrel_services.push(InactiveElement::new(
        320.0,
        15.0,
        0.0,
        1200.0,
        Orientation::Horizontal,
        ServiceCategory::Cabling,
        true,
        Material::new(0.012, 0.006),
    ));
    tracker.supports.push(InactiveElement::new(
        50.0,
        330.0,
        720.0,
        30.0,
        Orientation::Vertical,
        ServiceCategory::Support,
        true,
        Material::new(0.015, 0.008),
    ));
    tracker.momenta = vec![1.0, 10.0, 100.0];

    let mut config = ScanConfig::new();
    config.n_tracks = 200;
    config.eta_max = 2.4;

    let result = EtaScan::new(&tracker, config).run();

    println!("scanned {} trajectories", result.tracks.len());
    for track in result.tracks.iter().step_by(40) {
        let total = track.total_material();
        println!(
            "eta {:5.2}  hits {:2}  x/X0 {:.4}  lambda/L0 {:.4}",
            track.eta,
            track.hits.len(),
            total.radiation,
            total.interaction
        );
    }
    Ok(())
}
