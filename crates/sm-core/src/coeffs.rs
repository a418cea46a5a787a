use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Coefficients d'une fonction de transfert rationnelle en z.
///
/// `b` est le numérateur, `a` le dénominateur, tous deux en puissances
/// décroissantes de z (`b[0] + b[1] z⁻¹ + ...`). Les deux vecteurs sont non
/// vides, finis, et `a[0] != 0`.
///
/// # Example
/// ```
/// use sm_core::coeffs::FilterCoefficients;
/// let c = FilterCoefficients::new(vec![1.0, 0.0], vec![6001.0, -6000.0]).unwrap();
/// assert_eq!(c.state_len(), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterCoefficients {
    b: Vec<f64>,
    a: Vec<f64>,
}

impl FilterCoefficients {
    /// Build a coefficient set, rejecting empty, non-finite or `a[0] == 0` input.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidCoefficients`] when the set is unusable.
    pub fn new(b: Vec<f64>, a: Vec<f64>) -> Result<Self, CoreError> {
        if b.is_empty() || a.is_empty() {
            return Err(CoreError::InvalidCoefficients {
                reason: format!("len(b) = {}, len(a) = {}", b.len(), a.len()),
            });
        }
        if let Some(v) = b.iter().chain(a.iter()).find(|v| !v.is_finite()) {
            return Err(CoreError::InvalidCoefficients {
                reason: format!("non-finite coefficient {v}"),
            });
        }
        if a[0] == 0.0 {
            return Err(CoreError::InvalidCoefficients {
                reason: "a[0] must be non-zero".into(),
            });
        }
        Ok(Self { b, a })
    }

    /// Pass-through pair `b = [1, 0]`, `a = [1]`.
    ///
    /// # Example
    /// ```
    /// use sm_core::coeffs::FilterCoefficients;
    /// let id = FilterCoefficients::identity();
    /// assert_eq!(id.b(), &[1.0, 0.0]);
    /// assert_eq!(id.a(), &[1.0]);
    /// ```
    #[must_use]
    pub fn identity() -> Self {
        Self {
            b: vec![1.0, 0.0],
            a: vec![1.0],
        }
    }

    /// Numerator coefficients.
    #[must_use]
    pub fn b(&self) -> &[f64] {
        &self.b
    }

    /// Denominator coefficients.
    #[must_use]
    pub fn a(&self) -> &[f64] {
        &self.a
    }

    /// Taille de la ligne à retard d'une forme directe : `max(len(a), len(b)) - 1`.
    #[must_use]
    pub fn state_len(&self) -> usize {
        self.a.len().max(self.b.len()) - 1
    }

    /// Copy scaled so that `a[0] == 1`, both vectors zero-padded to the same length.
    #[must_use]
    pub fn normalized(&self) -> (Vec<f64>, Vec<f64>) {
        let n = self.a.len().max(self.b.len());
        let a0 = self.a[0];
        let mut b = vec![0.0; n];
        let mut a = vec![0.0; n];
        for (dst, &v) in b.iter_mut().zip(&self.b) {
            *dst = v / a0;
        }
        for (dst, &v) in a.iter_mut().zip(&self.a) {
            *dst = v / a0;
        }
        (b, a)
    }

    /// Consume into `(b, a)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.b, self.a)
    }
}

/// One biquad stage: `b = [b0, b1, b2]`, `a = [a0, a1, a2]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sos {
    /// Numerator.
    pub b: [f64; 3],
    /// Denominator.
    pub a: [f64; 3],
}

impl Sos {
    /// Stage with a monic denominator (`a0 = 1`).
    #[must_use]
    pub fn new(b: [f64; 3], a1: f64, a2: f64) -> Self {
        Self {
            b,
            a: [1.0, a1, a2],
        }
    }

    /// Both poles strictly inside the unit circle (stability triangle).
    ///
    /// # Example
    /// ```
    /// use sm_core::coeffs::Sos;
    /// assert!(Sos::new([1.0, 0.0, -1.0], -1.8, 0.9).is_stable());
    /// assert!(!Sos::new([1.0, 0.0, 0.0], -2.1, 1.1).is_stable());
    /// ```
    #[must_use]
    pub fn is_stable(&self) -> bool {
        let a1 = self.a[1] / self.a[0];
        let a2 = self.a[2] / self.a[0];
        a2.abs() < 1.0 && a1.abs() < 1.0 + a2
    }

    /// All six coefficients finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.b.iter().chain(self.a.iter()).all(|v| v.is_finite())
    }
}

/// Ordered chain of second-order sections.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CascadeFile")]
pub struct Cascade {
    sections: Vec<Sos>,
}

/// Unchecked serialized form of a [`Cascade`].
#[derive(Deserialize)]
struct CascadeFile {
    sections: Vec<Sos>,
}

impl TryFrom<CascadeFile> for Cascade {
    type Error = CoreError;

    fn try_from(file: CascadeFile) -> Result<Self, Self::Error> {
        Self::new(file.sections)
    }
}

impl Cascade {
    /// Wrap an ordered list of sections, rejecting non-finite or `a0 == 0` stages.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidCoefficients`] naming the first bad stage.
    pub fn new(sections: Vec<Sos>) -> Result<Self, CoreError> {
        if let Some(i) = sections.iter().position(|s| !s.is_finite()) {
            return Err(CoreError::InvalidCoefficients {
                reason: format!("section {i}: non-finite coefficient"),
            });
        }
        if let Some(i) = sections.iter().position(|s| s.a[0] == 0.0) {
            return Err(CoreError::InvalidCoefficients {
                reason: format!("section {i}: a0 must be non-zero"),
            });
        }
        Ok(Self { sections })
    }

    /// Sections in processing order.
    #[must_use]
    pub fn sections(&self) -> &[Sos] {
        &self.sections
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// `true` when the cascade has no stage (acts as identity).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Every stage stable and finite.
    #[must_use]
    pub fn is_stable(&self) -> bool {
        self.sections.iter().all(|s| s.is_finite() && s.is_stable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_non_finite() {
        assert!(FilterCoefficients::new(vec![], vec![1.0]).is_err());
        assert!(FilterCoefficients::new(vec![1.0], vec![]).is_err());
        assert!(FilterCoefficients::new(vec![f64::NAN], vec![1.0]).is_err());
        assert!(FilterCoefficients::new(vec![1.0], vec![0.0, 1.0]).is_err());
    }

    #[test]
    fn normalized_pads_and_scales() {
        let c = FilterCoefficients::new(vec![1.0, 0.0], vec![4.0]).unwrap();
        let (b, a) = c.normalized();
        assert_eq!(b, vec![0.25, 0.0]);
        assert_eq!(a, vec![1.0, 0.0]);
        assert_eq!(c.state_len(), 1);
    }

    #[test]
    fn identity_has_one_delay() {
        assert_eq!(FilterCoefficients::identity().state_len(), 1);
    }

    #[test]
    fn cascade_stability() {
        let stable = Cascade::new(vec![Sos::new([1.0, 0.0, -1.0], -1.9, 0.92); 3]).unwrap();
        assert!(stable.is_stable());
        assert_eq!(stable.len(), 3);
        let unstable = Cascade::new(vec![Sos::new([1.0, 0.0, -1.0], -1.9, 1.0)]).unwrap();
        assert!(!unstable.is_stable());
    }

    #[test]
    fn cascade_rejects_zero_a0_and_nan() {
        let zero_a0 = Sos {
            b: [1.0, 0.0, 0.0],
            a: [0.0, 0.5, 0.0],
        };
        let ok = Sos::new([1.0, 0.0, 0.0], 0.0, 0.0);
        let err = Cascade::new(vec![ok, zero_a0]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidCoefficients { ref reason } if reason.contains("section 1")
        ));
        assert!(Cascade::new(vec![Sos::new([f64::NAN, 0.0, 0.0], 0.0, 0.0)]).is_err());
        assert!(Cascade::new(Vec::new()).unwrap().is_empty());

        let text = "[[sections]]\nb = [1.0, 0.0, 0.0]\na = [0.0, 1.0, 0.0]\n";
        assert!(toml::from_str::<Cascade>(text).is_err());
        let text = "[[sections]]\nb = [1.0, 0.0, 0.0]\na = [2.0, 1.0, 0.0]\n";
        assert_eq!(toml::from_str::<Cascade>(text).unwrap().len(), 1);
    }
}
