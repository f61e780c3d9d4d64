//! Constant velocity travel times

use sw_core::geodesy::degrees_to_km;
use sw_core::Arrival;

use super::TravelTimeModel;

/// Straight rays through a uniform half-space
///
/// Knows the direct phases only: `P`/`p` travel at `vp_km_s`, `S`/`s` at
/// `vs_km_s`. Any other phase name has no arrival.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HomogeneousEarth {
    pub vp_km_s: f64,
    pub vs_km_s: f64,
}

impl Default for HomogeneousEarth {
    fn default() -> Self {
        Self {
            vp_km_s: 6.0,
            vs_km_s: 3.5,
        }
    }
}

impl HomogeneousEarth {
    fn velocity(&self, phase: &str) -> Option<f64> {
        match phase {
            "P" | "p" => Some(self.vp_km_s),
            "S" | "s" => Some(self.vs_km_s),
            _ => None,
        }
    }
}

impl TravelTimeModel for HomogeneousEarth {
    fn arrivals(&self, depth_km: f64, distance_deg: f64, phases: &[String]) -> Vec<Arrival> {
        let path_km = degrees_to_km(distance_deg).hypot(depth_km.max(0.0));
        let mut arrivals: Vec<Arrival> = phases
            .iter()
            .filter_map(|phase| {
                self.velocity(phase).map(|v| Arrival {
                    phase: phase.clone(),
                    time: path_km / v,
                    distance_deg,
                })
            })
            .collect();
        arrivals.sort_by(|a, b| a.time.total_cmp(&b.time));
        arrivals
    }
}
