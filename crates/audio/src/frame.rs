//! Audio-Frame: Block fester Laenge aus Mono-Samples

/// Ein Frame aus `chunk_size` aufeinanderfolgenden Mono-Samples.
///
/// Frames werden vom Stream-Treiber zusammengesetzt; intern entstehen
/// niemals Teil-Frames.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    samples: Vec<f32>,
}

impl AudioFrame {
    pub fn new(samples: Vec<f32>) -> Self {
        Self { samples }
    }

    /// Frame aus lauter Nullen
    pub fn silence(len: usize) -> Self {
        Self {
            samples: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    /// Skaliert alle Samples mit einem linearen Faktor
    pub fn scale(&mut self, gain: f32) {
        for s in self.samples.iter_mut() {
            *s *= gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stille_frame() {
        let f = AudioFrame::silence(1024);
        assert_eq!(f.len(), 1024);
        assert!(f.samples().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn skalieren() {
        let mut f = AudioFrame::new(vec![0.5, -1.0, 0.25]);
        f.scale(0.5);
        assert_eq!(f.samples(), &[0.25, -0.5, 0.125]);
    }

    #[test]
    fn samples_mut_schreibt_in_frame() {
        let mut f = AudioFrame::silence(4);
        f.samples_mut()[2] = 0.75;
        assert_eq!(f.samples(), &[0.0, 0.0, 0.75, 0.0]);
        assert!(!f.is_empty());
    }
}
