//! Fensterfunktionen

use std::f32::consts::PI;

/// Symmetrisches Hann-Fenster der Laenge `len`.
///
/// `w[n] = 0.5 - 0.5 * cos(2 * pi * n / (len - 1))`, beide Enden sind 0.
pub fn hann(len: usize) -> Vec<f32> {
    match len {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => {
            let denom = (len - 1) as f32;
            (0..len)
                .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f32 / denom).cos())
                .collect()
        }
    }
}

/// Kehrwerte eines Fensters fuer die Rueckrechnung.
///
/// Werte unterhalb von `floor` werden auf `floor` angehoben, damit die
/// Nullstellen an den Raendern nicht durch 0 teilen.
pub fn inverse(window: &[f32], floor: f32) -> Vec<f32> {
    window.iter().map(|&w| 1.0 / w.max(floor)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hann_symmetrisch_mit_null_raendern() {
        let w = hann(1024);
        assert_eq!(w.len(), 1024);
        assert!(w[0].abs() < 1e-7);
        assert!(w[1023].abs() < 1e-7);
        for n in 0..512 {
            assert!((w[n] - w[1023 - n]).abs() < 1e-5, "Asymmetrie bei {n}");
        }
        assert!(w.iter().all(|&x| (0.0..=1.0).contains(&x)));
    }

    #[test]
    fn hann_sonderfaelle() {
        assert!(hann(0).is_empty());
        assert_eq!(hann(1), vec![1.0]);
    }

    #[test]
    fn inverse_begrenzt_verstaerkung() {
        let w = hann(64);
        let inv = inverse(&w, 0.01);
        assert!(inv.iter().all(|&x| x.is_finite() && x <= 100.0 + 1e-3));
        // Innerhalb des Fensters exakt invertierbar
        assert!((w[32] * inv[32] - 1.0).abs() < 1e-6);
    }
}
