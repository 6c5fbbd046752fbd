use crate::horizon::profile::HorizonSample;
use crate::math::AngleHelper;

/// Occlusion elevation reported when no terrain profile is loaded.
pub const NO_PROFILE_ELEVATION_DEG: f64 = -5.0;

/// Sorted terrain profile answering "how high is the skyline at this azimuth".
///
/// The profile is replaced wholesale by [`load`](Self::load); an empty model
/// is valid and reports [`NO_PROFILE_ELEVATION_DEG`] everywhere.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HorizonModel {
    azimuths: Vec<f64>,
    elevations: Vec<f64>,
}

impl HorizonModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_samples(samples: Vec<HorizonSample>) -> Self {
        let mut model = Self::new();
        model.load(samples);
        model
    }

    /// Replaces the stored profile. Input order does not matter.
    pub fn load(&mut self, samples: Vec<HorizonSample>) {
        let mut samples: Vec<HorizonSample> = samples
            .into_iter()
            .filter(|s| s.azimuth_deg.is_finite() && s.elevation_deg.is_finite())
            .map(|s| HorizonSample::new(AngleHelper::wrap_degrees(s.azimuth_deg), s.elevation_deg))
            .collect();
        samples.sort_by(|a, b| a.azimuth_deg.total_cmp(&b.azimuth_deg));

        self.azimuths = samples.iter().map(|s| s.azimuth_deg).collect();
        self.elevations = samples.iter().map(|s| s.elevation_deg).collect();
    }

    pub fn is_empty(&self) -> bool {
        self.azimuths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.azimuths.len()
    }

    pub fn samples(&self) -> impl Iterator<Item = HorizonSample> + '_ {
        self.azimuths
            .iter()
            .zip(&self.elevations)
            .map(|(&az, &el)| HorizonSample::new(az, el))
    }

    /// Minimum elevation above which the sky at `azimuth_deg` is unobstructed.
    pub fn occlusion_elevation(&self, azimuth_deg: f64) -> f64 {
        let count = self.azimuths.len();
        if count == 0 {
            return NO_PROFILE_ELEVATION_DEG;
        }

        let azimuth = AngleHelper::wrap_degrees(azimuth_deg);
        let insertion = self.azimuths.partition_point(|&a| a < azimuth);
        let (lower, upper) = if insertion == 0 || insertion == count {
            (count - 1, 0)
        } else {
            (insertion - 1, insertion)
        };

        let run = (self.azimuths[upper] - self.azimuths[lower]).rem_euclid(360.0);
        if run == 0.0 {
            return self.elevations[lower];
        }

        let offset = (azimuth - self.azimuths[lower]).rem_euclid(360.0);
        let fraction = (offset / run).clamp(0.0, 1.0);
        self.elevations[lower] + fraction * (self.elevations[upper] - self.elevations[lower])
    }

    /// Skyline sampled every `step_deg` over a full turn, closing at 360.
    pub fn silhouette(&self, step_deg: f64) -> Vec<HorizonSample> {
        if self.is_empty() || step_deg <= 0.0 {
            return Vec::new();
        }
        let steps = (360.0 / step_deg).ceil() as usize;
        (0..=steps)
            .map(|i| {
                let azimuth = (i as f64 * step_deg).min(360.0);
                HorizonSample::new(azimuth, self.occlusion_elevation(azimuth))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_profile() -> HorizonModel {
        HorizonModel::from_samples(vec![
            HorizonSample::new(270.0, 2.0),
            HorizonSample::new(0.0, 2.0),
            HorizonSample::new(180.0, 2.0),
            HorizonSample::new(90.0, 2.0),
        ])
    }

    #[test]
    fn empty_profile_reports_sentinel_everywhere() {
        let model = HorizonModel::new();
        for az in [0.0, 45.0, 180.0, 359.9, -30.0, 725.0] {
            assert_eq!(model.occlusion_elevation(az), -5.0);
        }
    }

    #[test]
    fn flat_profile_interpolates_to_itself() {
        let model = flat_profile();
        assert_eq!(model.occlusion_elevation(45.0), 2.0);
        assert_eq!(model.occlusion_elevation(300.0), 2.0);
    }

    #[test]
    fn load_sorts_unordered_input() {
        let model = flat_profile();
        let azimuths: Vec<f64> = model.samples().map(|s| s.azimuth_deg).collect();
        assert_eq!(azimuths, vec![0.0, 90.0, 180.0, 270.0]);
    }

    #[test]
    fn interpolates_linearly_between_samples() {
        let model = HorizonModel::from_samples(vec![
            HorizonSample::new(100.0, 0.0),
            HorizonSample::new(200.0, 10.0),
        ]);
        assert!((model.occlusion_elevation(150.0) - 5.0).abs() < 1e-12);
        assert!((model.occlusion_elevation(125.0) - 2.5).abs() < 1e-12);
        assert_eq!(model.occlusion_elevation(200.0), 10.0);
    }

    #[test]
    fn continuous_across_north_seam() {
        let model = HorizonModel::from_samples(vec![
            HorizonSample::new(10.0, 3.0),
            HorizonSample::new(180.0, 5.0),
            HorizonSample::new(350.0, 1.0),
        ]);
        let before = model.occlusion_elevation(359.999);
        let after = model.occlusion_elevation(0.0);
        assert!((before - after).abs() < 1e-3);
        // halfway through the 350 -> 10 wrap run
        assert!((after - 2.0).abs() < 1e-9);
        assert!((model.occlusion_elevation(5.0) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn coincident_azimuths_return_lower_sample() {
        let single = HorizonModel::from_samples(vec![HorizonSample::new(42.0, 7.5)]);
        assert_eq!(single.occlusion_elevation(0.0), 7.5);
        assert_eq!(single.occlusion_elevation(200.0), 7.5);
    }

    #[test]
    fn non_finite_samples_are_ignored() {
        let model = HorizonModel::from_samples(vec![
            HorizonSample::new(f64::NAN, 1.0),
            HorizonSample::new(20.0, f64::INFINITY),
        ]);
        assert!(model.is_empty());
    }

    #[test]
    fn silhouette_covers_full_turn() {
        let curve = flat_profile().silhouette(10.0);
        assert_eq!(curve.len(), 37);
        assert_eq!(curve.first().map(|s| s.azimuth_deg), Some(0.0));
        assert_eq!(curve.last().map(|s| s.azimuth_deg), Some(360.0));
        assert!(curve.iter().all(|s| s.elevation_deg == 2.0));
    }
}
