use sm_core::coeffs::FilterCoefficients;
use sm_core::traits::{ChunkFilter, StreamState};

/// Filtre IIR en forme directe II transposée, état conservé entre chunks.
///
/// Les coefficients sont normalisés par `a[0]` et complétés de zéros à la
/// même longueur `n`; la ligne à retard a `n - 1` cases.
///
/// # Example
/// ```
/// use sm_core::coeffs::FilterCoefficients;
/// use sm_core::traits::ChunkFilter;
/// use sm_dsp::lfilter::DirectFormFilter;
///
/// // y[n] = 0.5 x[n] + 0.5 x[n-1]
/// let c = FilterCoefficients::new(vec![0.5, 0.5], vec![1.0]).unwrap();
/// let mut f = DirectFormFilter::new(&c);
/// assert_eq!(f.filter_chunk(&[2.0, 2.0]), vec![1.0, 2.0]);
/// assert_eq!(f.filter_chunk(&[0.0]), vec![1.0]);
/// ```
#[derive(Clone, Debug)]
pub struct DirectFormFilter {
    b: Vec<f64>,
    a: Vec<f64>,
    /// Ligne à retard (pré-allouée, jamais redimensionnée).
    z: Vec<f64>,
    state: StreamState,
}

impl DirectFormFilter {
    /// Filter with a zeroed delay line.
    #[must_use]
    pub fn new(coeffs: &FilterCoefficients) -> Self {
        let (b, a) = coeffs.normalized();
        let z = vec![0.0; coeffs.state_len()];
        Self {
            b,
            a,
            z,
            state: StreamState::Idle,
        }
    }

    /// Current delay-line contents.
    #[must_use]
    pub fn delay_line(&self) -> &[f64] {
        &self.z
    }

    /// Filter `buf` in place, updating the delay line.
    pub fn process_in_place(&mut self, buf: &mut [f64]) {
        for v in buf.iter_mut() {
            *v = self.tick(*v);
        }
        if !buf.is_empty() {
            self.state = StreamState::Streaming;
        }
    }

    #[inline(always)]
    fn tick(&mut self, x: f64) -> f64 {
        let n = self.z.len();
        if n == 0 {
            return self.b[0] * x;
        }
        let y = self.b[0] * x + self.z[0];
        for i in 0..n - 1 {
            self.z[i] = self.b[i + 1] * x + self.z[i + 1] - self.a[i + 1] * y;
        }
        self.z[n - 1] = self.b[n] * x - self.a[n] * y;
        y
    }
}

impl ChunkFilter for DirectFormFilter {
    fn process(&mut self, input: &[f64], output: &mut [f64]) {
        debug_assert_eq!(input.len(), output.len());
        output.copy_from_slice(input);
        self.process_in_place(output);
    }

    fn reset(&mut self) {
        self.z.fill(0.0);
        self.state = StreamState::Idle;
    }

    fn stream_state(&self) -> StreamState {
        self.state
    }
}
