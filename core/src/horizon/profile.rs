use serde::{Deserialize, Serialize};

/// One terrain sample: elevation of the skyline at an azimuth, degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonSample {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
}

impl HorizonSample {
    pub fn new(azimuth_deg: f64, elevation_deg: f64) -> Self {
        Self {
            azimuth_deg,
            elevation_deg,
        }
    }
}

/// Parses the terrain table. The first row is a header; every other row is
/// comma separated with azimuth in column 2 and elevation in column 3.
/// Rows without three fields or with unparseable numbers are dropped.
pub fn parse_profile(text: &str) -> Vec<HorizonSample> {
    text.lines()
        .skip(1)
        .filter_map(parse_row)
        .collect()
}

fn parse_row(line: &str) -> Option<HorizonSample> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < 3 {
        return None;
    }
    let azimuth_deg = fields[1].parse::<f64>().ok()?;
    let elevation_deg = fields[2].parse::<f64>().ok()?;
    if !azimuth_deg.is_finite() || !elevation_deg.is_finite() {
        return None;
    }
    Some(HorizonSample::new(azimuth_deg, elevation_deg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_header_and_malformed_rows() {
        let text = "distance,azimuth,elevation\n\
                    1.2,10.0,2.5\n\
                    bad row\n\
                    3.0,abc,1.0\n\
                    0.8, 200.5 , -0.75\n\
                    \n";
        let samples = parse_profile(text);
        assert_eq!(
            samples,
            vec![
                HorizonSample::new(10.0, 2.5),
                HorizonSample::new(200.5, -0.75)
            ]
        );
    }

    #[test]
    fn parse_of_header_only_is_empty() {
        assert!(parse_profile("a,b,c").is_empty());
        assert!(parse_profile("").is_empty());
    }
}
