use crate::error::TrajError;
use core::f64;
use nalgebra::Matrix3;

type Vec3D = [f64; 3];

#[derive(Default, Debug, Clone)]
pub struct UnitCell {
    pub cell_matrix: Matrix3<f64>,
}

impl PartialEq for UnitCell {
    fn eq(&self, other: &Self) -> bool {
        self.cell_matrix
            .iter()
            .zip(other.cell_matrix.iter())
            .all(|(a, b)| (a - b).abs() < f64::EPSILON)
    }
}

impl UnitCell {
    const EPSILON: f64 = 1e-5;

    fn deg2rad(x: f64) -> f64 {
        x * f64::consts::PI / 180.0
    }

    fn cos_degree(theta: f64) -> f64 {
        Self::deg2rad(theta).cos()
    }

    fn sin_degree(theta: f64) -> f64 {
        Self::deg2rad(theta).sin()
    }

    pub fn new() -> Self {
        UnitCell {
            cell_matrix: Matrix3::zeros(),
        }
    }

    /// An infinite cell is represented by the zero matrix
    pub fn is_infinite(&self) -> bool {
        self.cell_matrix.iter().all(|&x| x == 0.0)
    }

    /// Parse the nine whitespace separated entries of an extended XYZ
    /// `Lattice` value, filling the matrix column by column.
    pub fn parse(lattice: &str) -> Result<Self, TrajError> {
        let entries = lattice
            .split_whitespace()
            .map(str::parse::<f64>)
            .collect::<Result<Vec<_>, _>>()?;

        if entries.len() != 9 {
            return Err(TrajError::GenericError(format!(
                "lattice requires exactly 9 components, got {}",
                entries.len()
            )));
        }

        Ok(UnitCell {
            cell_matrix: Matrix3::from_iterator(entries),
        })
    }

    fn check_lengths(lengths: &Vec3D) -> Result<(), TrajError> {
        if lengths.iter().any(|&x| x < 0.0) {
            return Err(TrajError::GenericError(
                "lengths cannot be negative".to_string(),
            ));
        };

        Ok(())
    }

    fn check_angles(angles: &Vec3D) -> Result<(), TrajError> {
        if angles.iter().any(|&x| x < 0.0) {
            return Err(TrajError::GenericError(
                "angles cannot be negative".to_string(),
            ));
        };

        if angles.iter().any(|&x| x.abs() < Self::EPSILON) {
            return Err(TrajError::GenericError(
                "angles cannot be (roughly) zero".to_string(),
            ));
        }

        if angles.iter().any(|&x| x >= 180.0) {
            return Err(TrajError::GenericError(
                "angles cannot be larger than or equal to 180 degrees".to_string(),
            ));
        }

        Ok(())
    }

    pub fn from_lengths_angles(lengths: Vec3D, mut angles: Vec3D) -> Result<Self, TrajError> {
        Self::check_lengths(&lengths)?;
        Self::check_angles(&angles)?;

        if angles.iter().all(|&x| (x - 90.0).abs() < 1e-3) {
            angles.iter_mut().for_each(|x| *x = 90.0);
        }
        let mut cell_matrix: Matrix3<f64> = Matrix3::zeros();
        cell_matrix[(0, 0)] = lengths[0];

        cell_matrix[(1, 0)] = Self::cos_degree(angles[2]) * lengths[1];
        cell_matrix[(1, 1)] = Self::sin_degree(angles[2]) * lengths[1];

        cell_matrix[(2, 0)] = Self::cos_degree(angles[1]);
        cell_matrix[(2, 1)] = (Self::cos_degree(angles[0])
            - Self::cos_degree(angles[1]) * Self::cos_degree(angles[2]))
            / Self::sin_degree(angles[2]);
        cell_matrix[(2, 2)] = (1.0
            - cell_matrix[(2, 0)] * cell_matrix[(2, 0)]
            - cell_matrix[(2, 1)] * cell_matrix[(2, 1)])
            .sqrt();
        cell_matrix[(2, 0)] *= lengths[2];
        cell_matrix[(2, 1)] *= lengths[2];
        cell_matrix[(2, 2)] *= lengths[2];

        Ok(UnitCell { cell_matrix })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix3;

    #[test]
    fn test_unit_cell_new() {
        let cell = UnitCell::new();
        assert_eq!(cell.cell_matrix, Matrix3::zeros());
        assert!(cell.is_infinite());
    }

    #[test]
    fn test_unit_cell_parse() {
        let lattice = "1.0 2.0 3.0 4.0 5.0 6.0 7.0 8.0 9.0";
        let cell = UnitCell::parse(lattice).unwrap();

        let expected = Matrix3::new(1.0, 4.0, 7.0, 2.0, 5.0, 8.0, 3.0, 6.0, 9.0);
        assert_eq!(cell.cell_matrix, expected);
        assert!(!cell.is_infinite());
    }

    #[test]
    #[should_panic(expected = "lattice requires exactly 9 components")]
    fn test_unit_cell_parse_short() {
        UnitCell::parse("1.0 2.0 3.0").unwrap();
    }

    #[test]
    fn test_check_lengths_valid() {
        let lengths = [1.0, 2.0, 3.0];
        assert!(UnitCell::check_lengths(&lengths).is_ok());
    }

    #[test]
    #[should_panic(expected = "lengths cannot be negative")]
    fn test_check_lengths_invalid() {
        let lengths = [-1.0, -2.0, -3.0];
        UnitCell::check_lengths(&lengths).unwrap();
    }

    #[test]
    fn from_lengths_angles() {
        let expected = UnitCell::from_lengths_angles(
            [8.43116035, 14.50510613, 15.60911468],
            [73.31699212, 85.70200582, 89.37501529],
        )
        .unwrap();
        let mut true_cell = UnitCell::new();
        true_cell.cell_matrix[(0, 0)] = 8.43116035;
        true_cell.cell_matrix[(1, 0)] = 0.158219155128;
        true_cell.cell_matrix[(1, 1)] = 14.5042431863;
        true_cell.cell_matrix[(2, 0)] = 1.16980663624;
        true_cell.cell_matrix[(2, 1)] = 4.4685149855;
        true_cell.cell_matrix[(2, 2)] = 14.9100096405;
        let diff = expected.cell_matrix - true_cell.cell_matrix;
        assert!((diff).iter().all(|&x| x.abs() < 1e-6), "diff: {diff}");
    }

    #[test]
    #[should_panic(expected = "angles cannot be (roughly) zero")]
    fn test_check_angles_invalid_zero() {
        let angles = [0.0, 0.0, 0.0];
        UnitCell::check_angles(&angles).unwrap();
    }

    #[test]
    #[should_panic(expected = "angles cannot be larger than or equal to 180 degrees")]
    fn test_check_angles_invalid_180() {
        let angles = [180.0, 180.0, 180.0];
        UnitCell::check_angles(&angles).unwrap();
    }
}
