//! Median-Filter ueber Frequenz-Bins
//!
//! Entfernt isolierte Gain-Spitzen einzelner Bins ("musical noise").
//! Raender werden mit Nullen aufgefuellt.

/// Median-Filter mit fester, ungerader Fensterbreite
pub struct MedianFilter {
    width: usize,
    window: Vec<f32>,
    output: Vec<f32>,
}

impl MedianFilter {
    /// Erstellt einen Filter; gerade Breiten werden auf die naechste
    /// ungerade Breite angehoben.
    pub fn new(width: usize, max_len: usize) -> Self {
        let width = width.max(1) | 1;
        Self {
            width,
            window: Vec::with_capacity(width),
            output: vec![0.0; max_len],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Filtert `values` in-place
    pub fn apply(&mut self, values: &mut [f32]) {
        let len = values.len();
        if self.width == 1 || len == 0 {
            return;
        }
        if self.output.len() < len {
            self.output.resize(len, 0.0);
        }
        let half = self.width / 2;

        for i in 0..len {
            self.window.clear();
            for j in 0..self.width {
                let value = (i + j)
                    .checked_sub(half)
                    .and_then(|idx| values.get(idx))
                    .copied()
                    .unwrap_or(0.0);
                self.window.push(value);
            }
            let (_, median, _) = self.window.select_nth_unstable_by(half, f32::total_cmp);
            self.output[i] = *median;
        }
        values.copy_from_slice(&self.output[..len]);
    }
}
