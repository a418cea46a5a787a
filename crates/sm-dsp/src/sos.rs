use sm_core::coeffs::{Cascade, Sos};
use sm_core::traits::{ChunkFilter, StreamState};

/// Cascade de biquads (forme directe II transposée), deux retards par section.
///
/// Une cascade vide est l'identité.
///
/// # Example
/// ```
/// use sm_core::coeffs::{Cascade, Sos};
/// use sm_core::traits::ChunkFilter;
/// use sm_dsp::sos::SosFilter;
///
/// let gain = Sos::new([0.5, 0.0, 0.0], 0.0, 0.0);
/// let mut f = SosFilter::new(&Cascade::new(vec![gain, gain]).unwrap());
/// assert_eq!(f.filter_chunk(&[4.0, -8.0]), vec![1.0, -2.0]);
/// ```
#[derive(Clone, Debug)]
pub struct SosFilter {
    sections: Vec<Sos>,
    z: Vec<[f64; 2]>,
    state: StreamState,
}

impl SosFilter {
    /// Filter with every section state zeroed. Sections are normalized to `a0 = 1`;
    /// [`Cascade`] guarantees `a0 != 0`.
    #[must_use]
    pub fn new(cascade: &Cascade) -> Self {
        let sections: Vec<Sos> = cascade
            .sections()
            .iter()
            .map(|s| {
                let a0 = s.a[0];
                Sos {
                    b: [s.b[0] / a0, s.b[1] / a0, s.b[2] / a0],
                    a: [1.0, s.a[1] / a0, s.a[2] / a0],
                }
            })
            .collect();
        let z = vec![[0.0; 2]; sections.len()];
        Self {
            sections,
            z,
            state: StreamState::Idle,
        }
    }

    /// Number of biquad stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// `true` for an empty (identity) cascade.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Per-section delay lines.
    #[must_use]
    pub fn delay_lines(&self) -> &[[f64; 2]] {
        &self.z
    }
}

#[inline(always)]
fn run_section(s: &Sos, z: &mut [f64; 2], buf: &mut [f64]) {
    let [b0, b1, b2] = s.b;
    let a1 = s.a[1];
    let a2 = s.a[2];
    let [mut z1, mut z2] = *z;
    for v in buf.iter_mut() {
        let x = *v;
        let y = b0 * x + z1;
        z1 = b1 * x - a1 * y + z2;
        z2 = b2 * x - a2 * y;
        *v = y;
    }
    *z = [z1, z2];
}

impl ChunkFilter for SosFilter {
    fn process(&mut self, input: &[f64], output: &mut [f64]) {
        debug_assert_eq!(input.len(), output.len());
        output.copy_from_slice(input);
        // Section-major: each stage runs over the whole chunk before the next
        for (s, z) in self.sections.iter().zip(self.z.iter_mut()) {
            run_section(s, z, output);
        }
        if !input.is_empty() {
            self.state = StreamState::Streaming;
        }
    }

    fn reset(&mut self) {
        for z in &mut self.z {
            *z = [0.0; 2];
        }
        self.state = StreamState::Idle;
    }

    fn stream_state(&self) -> StreamState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::butter_bandpass_sos;
    use crate::lfilter::DirectFormFilter;
    use crate::response::polymul;
    use sm_core::coeffs::FilterCoefficients;

    fn band() -> Cascade {
        butter_bandpass_sos(6, 707.0, 1414.0, 48000.0).unwrap()
    }

    fn noise(n: usize) -> Vec<f64> {
        // xorshift, deterministic
        let mut s: u64 = 0x9E37_79B9_7F4A_7C15;
        (0..n)
            .map(|_| {
                s ^= s << 13;
                s ^= s >> 7;
                s ^= s << 17;
                (s >> 11) as f64 / (1u64 << 53) as f64 - 0.5
            })
            .collect()
    }

    #[test]
    fn empty_cascade_is_identity() {
        let mut f = SosFilter::new(&Cascade::default());
        assert!(f.is_empty());
        assert_eq!(f.filter_chunk(&[1.0, 2.0, 3.0]), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn matches_expanded_direct_form() {
        let cascade = Cascade::new(band().sections()[..2].to_vec()).unwrap();
        let (mut b, mut a) = (vec![1.0], vec![1.0]);
        for s in cascade.sections() {
            b = polymul(&b, &s.b);
            a = polymul(&a, &s.a);
        }
        let x = noise(512);
        let y_sos = SosFilter::new(&cascade).filter_chunk(&x);
        let y_df = DirectFormFilter::new(&FilterCoefficients::new(b, a).unwrap()).filter_chunk(&x);
        for (u, v) in y_sos.iter().zip(&y_df) {
            assert!((u - v).abs() < 1e-9);
        }
    }

    #[test]
    fn split_equals_whole() {
        let x = noise(4096);
        let whole = SosFilter::new(&band()).filter_chunk(&x);
        let mut f = SosFilter::new(&band());
        let mut y = Vec::new();
        for chunk in x.chunks(333) {
            y.extend(f.filter_chunk(chunk));
        }
        assert_eq!(y, whole);
    }

    #[test]
    fn reset_restores_idle() {
        let mut f = SosFilter::new(&band());
        let first = f.filter_chunk(&noise(64));
        assert_eq!(f.stream_state(), StreamState::Streaming);
        assert!(f.delay_lines().iter().any(|z| z[0] != 0.0));
        f.reset();
        assert_eq!(f.stream_state(), StreamState::Idle);
        assert_eq!(f.filter_chunk(&noise(64)), first);
    }

    #[test]
    fn unnormalized_sections_are_scaled() {
        let s = Sos {
            b: [2.0, 0.0, 0.0],
            a: [2.0, 0.0, 0.0],
        };
        let mut f = SosFilter::new(&Cascade::new(vec![s]).unwrap());
        assert_eq!(f.len(), 1);
        assert_eq!(f.filter_chunk(&[3.0]), vec![3.0]);
    }
}
