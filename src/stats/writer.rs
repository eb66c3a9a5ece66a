//! Per-phase statistics writing: size distributions and fitted distribution
//! tables, keyed by integer phase number inside one `StatsArtifact`.

use crate::error::GrainpipeError;

use super::artifact::StatsArtifact;

/// The dataset and column names used by the statistics contract.
pub mod names {
    pub const CRYSTAL_STRUCTURE: &str = "CrystalStructure";
    pub const CRYSTAL_STRUCTURE_NAME_ATTR: &str = "Name";
    pub const PHASE_FRACTION: &str = "PhaseFraction";
    pub const GRAIN_DIAMETER_INFO: &str = "Grain_Diameter_Info";
    pub const GRAIN_SIZE_DISTRIBUTION: &str = "Grain_Size_Distribution";
    pub const BIN_NUMBER: &str = "BinNumber";

    pub const DISTRIBUTION_TYPE_ATTR: &str = "DistributionType";
    pub const BETA_DISTRIBUTION: &str = "BetaDistribution";
    pub const LOGNORMAL_DISTRIBUTION: &str = "LogNormalDistribution";
    pub const POWERLAW_DISTRIBUTION: &str = "PowerLawDistribution";

    pub const ALPHA: &str = "Alpha";
    pub const BETA: &str = "Beta";
    pub const AVERAGE: &str = "Average";
    pub const STANDARD_DEVIATION: &str = "StandardDeviation";
    pub const EXPONENT_K: &str = "K";
}

/// Writes one run's per-phase statistics into an in-memory artifact.
#[derive(Default)]
pub struct PhaseStatsWriter {
    artifact: StatsArtifact,
}

impl PhaseStatsWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifact(&self) -> &StatsArtifact {
        &self.artifact
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, GrainpipeError> {
        self.artifact.to_bytes()
    }

    fn group(phase: i32) -> String {
        format!("Phase_{}", phase)
    }

    /// Writes the size-distribution block for one phase and returns the
    /// number of bins. Bin edges run from the minimum diameter to the
    /// maximum, inclusive, in steps of `bin_step_size`.
    #[allow(clippy::too_many_arguments)]
    pub fn write_size_distribution(
        &mut self,
        phase: i32,
        crystal_structure: u32,
        crystal_structure_name: &str,
        phase_fraction: f64,
        max_diameter: f64,
        min_diameter: f64,
        bin_step_size: f64,
        avg_log_diameter: f64,
        sd_log_diameter: f64,
    ) -> Result<usize, GrainpipeError> {
        if bin_step_size <= 0.0 {
            return Err(GrainpipeError::StatsFormatError(format!(
                "bin step size must be positive, got {}",
                bin_step_size
            )));
        }
        if max_diameter < min_diameter {
            return Err(GrainpipeError::StatsFormatError(format!(
                "maximum diameter {} is below minimum diameter {}",
                max_diameter, min_diameter
            )));
        }

        let group = Self::group(phase);

        let crystal_path = format!("{}/{}", group, names::CRYSTAL_STRUCTURE);
        self.artifact.set_scalar(crystal_path.clone(), crystal_structure);
        self.artifact.set_attribute(
            &crystal_path,
            names::CRYSTAL_STRUCTURE_NAME_ATTR,
            crystal_structure_name,
        )?;

        self.artifact
            .set_scalar(format!("{}/{}", group, names::PHASE_FRACTION), phase_fraction);
        self.artifact.set_vector(
            format!("{}/{}", group, names::GRAIN_DIAMETER_INFO),
            &[bin_step_size, max_diameter, min_diameter],
        );
        self.artifact.set_vector(
            format!("{}/{}", group, names::GRAIN_SIZE_DISTRIBUTION),
            &[avg_log_diameter, sd_log_diameter],
        );

        let mut bins = Vec::new();
        let mut d = min_diameter;
        while d <= max_diameter {
            bins.push(d);
            d += bin_step_size;
        }
        self.artifact
            .set_vector(format!("{}/{}", group, names::BIN_NUMBER), &bins);

        Ok(bins.len())
    }

    pub fn write_beta_distribution(
        &mut self,
        phase: i32,
        group_name: &str,
        alphas: &[f64],
        betas: &[f64],
    ) -> Result<(), GrainpipeError> {
        self.write_distribution_columns(
            phase,
            names::BETA_DISTRIBUTION,
            group_name,
            &[(names::ALPHA, alphas), (names::BETA, betas)],
        )
    }

    pub fn write_lognormal_distribution(
        &mut self,
        phase: i32,
        group_name: &str,
        averages: &[f64],
        std_devs: &[f64],
    ) -> Result<(), GrainpipeError> {
        self.write_distribution_columns(
            phase,
            names::LOGNORMAL_DISTRIBUTION,
            group_name,
            &[
                (names::AVERAGE, averages),
                (names::STANDARD_DEVIATION, std_devs),
            ],
        )
    }

    pub fn write_power_law_distribution(
        &mut self,
        phase: i32,
        group_name: &str,
        alphas: &[f64],
        ks: &[f64],
        betas: &[f64],
    ) -> Result<(), GrainpipeError> {
        self.write_distribution_columns(
            phase,
            names::POWERLAW_DISTRIBUTION,
            group_name,
            &[
                (names::ALPHA, alphas),
                (names::EXPONENT_K, ks),
                (names::BETA, betas),
            ],
        )
    }

    /// Writes one distribution's parallel column arrays. Any empty column
    /// aborts the whole distribution and reports the offending column; the
    /// columns must also agree in length.
    fn write_distribution_columns(
        &mut self,
        phase: i32,
        distribution_type: &str,
        group_name: &str,
        columns: &[(&str, &[f64])],
    ) -> Result<(), GrainpipeError> {
        let expected_len = columns.first().map(|(_, data)| data.len()).unwrap_or(0);
        for &(column, data) in columns {
            if data.is_empty() {
                return Err(GrainpipeError::StatsFormatError(format!(
                    "distribution '{}' column '{}' is empty; nothing was written",
                    group_name, column
                )));
            }
            if data.len() != expected_len {
                return Err(GrainpipeError::StatsFormatError(format!(
                    "distribution '{}' column '{}' has {} rows, expected {}",
                    group_name,
                    column,
                    data.len(),
                    expected_len
                )));
            }
        }

        let group = Self::group(phase);
        for &(column, data) in columns {
            let path = format!("{}/{}/{}", group, group_name, column);
            self.artifact.set_vector(path.clone(), data);
            self.artifact.set_attribute(
                &path,
                names::DISTRIBUTION_TYPE_ATTR,
                distribution_type,
            )?;
        }
        Ok(())
    }
}

//==================================================================================
// Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_distribution_bins() {
        let mut writer = PhaseStatsWriter::new();
        let bins = writer
            .write_size_distribution(1, 1, "Cubic", 1.0, 5.0, 1.0, 1.0, 0.8, 0.1)
            .unwrap();
        assert_eq!(bins, 5);
        assert_eq!(
            writer.artifact().vector::<f64>("Phase_1/BinNumber").unwrap(),
            vec![1.0, 2.0, 3.0, 4.0, 5.0]
        );
        assert_eq!(
            writer.artifact().attribute("Phase_1/CrystalStructure", "Name"),
            Some("Cubic")
        );
        assert_eq!(
            writer
                .artifact()
                .vector::<f64>("Phase_1/Grain_Diameter_Info")
                .unwrap(),
            vec![1.0, 5.0, 1.0]
        );
    }

    #[test]
    fn test_size_distribution_rejects_bad_step() {
        let mut writer = PhaseStatsWriter::new();
        assert!(writer
            .write_size_distribution(1, 1, "Cubic", 1.0, 5.0, 1.0, 0.0, 0.8, 0.1)
            .is_err());
        assert!(writer
            .write_size_distribution(1, 1, "Cubic", 1.0, 1.0, 5.0, 1.0, 0.8, 0.1)
            .is_err());
    }

    #[test]
    fn test_empty_column_aborts_and_names_the_column() {
        let mut writer = PhaseStatsWriter::new();
        let err = writer
            .write_beta_distribution(2, "SizeDistribution", &[1.0, 2.0], &[])
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("Beta"), "{}", text);
        assert!(text.contains("SizeDistribution"), "{}", text);
        // Nothing from the aborted distribution lands in the artifact.
        assert!(!writer
            .artifact()
            .contains("Phase_2/SizeDistribution/Alpha"));
    }

    #[test]
    fn test_column_length_mismatch_names_the_column() {
        let mut writer = PhaseStatsWriter::new();
        let err = writer
            .write_power_law_distribution(1, "ShapeDistribution", &[1.0], &[2.0, 3.0], &[4.0])
            .unwrap_err();
        assert!(err.to_string().contains("K"));
    }

    #[test]
    fn test_distribution_columns_carry_type_attribute() {
        let mut writer = PhaseStatsWriter::new();
        writer
            .write_lognormal_distribution(3, "SizeDistribution", &[0.5], &[0.1])
            .unwrap();
        assert_eq!(
            writer
                .artifact()
                .attribute("Phase_3/SizeDistribution/Average", "DistributionType"),
            Some("LogNormalDistribution")
        );
    }

    #[test]
    fn test_written_artifact_roundtrips() {
        let mut writer = PhaseStatsWriter::new();
        writer
            .write_size_distribution(1, 1, "Cubic", 0.75, 4.0, 2.0, 0.5, 0.8, 0.1)
            .unwrap();
        writer
            .write_beta_distribution(1, "OmegaDistribution", &[1.0, 2.0], &[3.0, 4.0])
            .unwrap();

        let bytes = writer.to_bytes().unwrap();
        let restored = StatsArtifact::from_bytes(&bytes).unwrap();
        assert_eq!(
            restored.vector::<f64>("Phase_1/BinNumber").unwrap(),
            vec![2.0, 2.5, 3.0, 3.5, 4.0]
        );
        assert_eq!(
            restored
                .vector::<f64>("Phase_1/OmegaDistribution/Beta")
                .unwrap(),
            vec![3.0, 4.0]
        );
    }
}
