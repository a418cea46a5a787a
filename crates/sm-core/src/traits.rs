/// État d'un filtre en streaming.
///
/// `Idle` tant qu'aucun chunk n'a été traité depuis la construction ou le
/// dernier `reset()`, `Streaming` ensuite. Il n'y a pas de retour automatique
/// vers `Idle`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StreamState {
    /// Zeroed delay line, nothing processed yet.
    #[default]
    Idle,
    /// At least one chunk processed; state carries history.
    Streaming,
}

/// Filtre appliqué chunk par chunk, avec état conservé entre les appels.
///
/// Filtrer `x[..k]` puis `x[k..]` doit produire exactement la même sortie que
/// filtrer `x` d'un seul bloc.
///
/// # Example
/// ```
/// use sm_core::traits::{ChunkFilter, StreamState};
///
/// struct Gain(f64, StreamState);
/// impl ChunkFilter for Gain {
///     fn process(&mut self, input: &[f64], output: &mut [f64]) {
///         for (o, &x) in output.iter_mut().zip(input) { *o = x * self.0; }
///         self.1 = StreamState::Streaming;
///     }
///     fn reset(&mut self) { self.1 = StreamState::Idle; }
///     fn stream_state(&self) -> StreamState { self.1 }
/// }
///
/// let mut g = Gain(2.0, StreamState::Idle);
/// assert_eq!(g.filter_chunk(&[1.0, 2.0]), vec![2.0, 4.0]);
/// assert_eq!(g.stream_state(), StreamState::Streaming);
/// ```
pub trait ChunkFilter: Send {
    /// Filtre `input` dans `output` (mêmes longueurs) et met à jour l'état.
    ///
    /// CONTRAT : ne doit PAS allouer.
    fn process(&mut self, input: &[f64], output: &mut [f64]);

    /// Remet l'état à zéro (redémarrage du flux).
    fn reset(&mut self);

    /// Current position in the Idle → Streaming state machine.
    fn stream_state(&self) -> StreamState;

    /// Allocating convenience around [`ChunkFilter::process`].
    fn filter_chunk(&mut self, input: &[f64]) -> Vec<f64> {
        let mut output = vec![0.0; input.len()];
        self.process(input, &mut output);
        output
    }
}
