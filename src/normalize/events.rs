//! Beat and downbeat backfill

/// Beats per bar assumed when deriving downbeats
pub const BEATS_PER_BAR: usize = 4;

/// Tempo range accepted from upstream; anything else is treated as absent
pub const MIN_BPM: f64 = 20.0;
pub const MAX_BPM: f64 = 400.0;

/// Whether `bpm` is a usable tempo
pub fn is_plausible_bpm(bpm: f64) -> bool {
    (MIN_BPM..=MAX_BPM).contains(&bpm)
}

/// Regular beat grid from 0 (inclusive) to `duration` (exclusive)
pub fn beat_grid(bpm: f64, duration: f64) -> Vec<f64> {
    if !is_plausible_bpm(bpm) || !(duration > 0.0 && duration.is_finite()) {
        return Vec::new();
    }
    let interval = 60.0 / bpm;
    let count = (duration / interval).ceil() as usize;
    (0..count)
        .map(|i| i as f64 * interval)
        .take_while(|&t| t < duration)
        .collect()
}

/// Keep `beats` if present, else synthesize a grid from the tempo
pub fn backfill_beats(beats: Vec<f64>, bpm: Option<f64>, default_bpm: f64, duration: f64) -> Vec<f64> {
    if !beats.is_empty() {
        return beats;
    }
    let bpm = match bpm {
        Some(b) if is_plausible_bpm(b) => b,
        Some(b) => {
            log::warn!("Ignoring implausible tempo {} BPM, using {:.1}", b, default_bpm);
            default_bpm
        }
        None => default_bpm,
    };
    let grid = beat_grid(bpm, duration);
    log::info!(
        "No beats supplied, synthesized {} beats at {:.1} BPM over {:.1}s",
        grid.len(),
        bpm,
        duration
    );
    grid
}

/// Keep `downbeats` if present, else take every bar's first beat
pub fn backfill_downbeats(downbeats: Vec<f64>, beats: &[f64]) -> Vec<f64> {
    if !downbeats.is_empty() {
        return downbeats;
    }
    beats.iter().step_by(BEATS_PER_BAR).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_at_120_bpm() {
        assert_eq!(beat_grid(120.0, 2.0), vec![0.0, 0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_grid_excludes_duration() {
        let grid = beat_grid(60.0, 3.5);
        assert_eq!(grid, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_grid_rejects_bad_inputs() {
        assert!(beat_grid(0.0, 10.0).is_empty());
        assert!(beat_grid(120.0, 0.0).is_empty());
        assert!(beat_grid(f64::NAN, 10.0).is_empty());
    }

    #[test]
    fn test_implausible_tempo_falls_back_to_default() {
        let beats = backfill_beats(Vec::new(), Some(1e12), 120.0, 4.0);
        assert_eq!(beats.len(), 8);
        let beats = backfill_beats(Vec::new(), Some(-60.0), 120.0, 2.0);
        assert_eq!(beats, vec![0.0, 0.5, 1.0, 1.5]);
        assert!(beat_grid(1e12, 10.0).is_empty());
        assert!(beat_grid(120.0, f64::INFINITY).is_empty());
    }

    #[test]
    fn test_existing_beats_are_kept() {
        let beats = vec![0.3, 0.8];
        assert_eq!(backfill_beats(beats.clone(), Some(90.0), 120.0, 10.0), beats);
    }

    #[test]
    fn test_default_bpm_used_without_tempo() {
        let beats = backfill_beats(Vec::new(), None, 120.0, 4.0);
        assert_eq!(beats.len(), 8);
        assert_eq!(beats[1], 0.5);
    }

    #[test]
    fn test_downbeats_every_fourth_beat() {
        let beats: Vec<f64> = (0..10).map(|i| i as f64 * 0.5).collect();
        assert_eq!(backfill_downbeats(Vec::new(), &beats), vec![0.0, 2.0, 4.0]);
        assert!(backfill_downbeats(Vec::new(), &[]).is_empty());
        assert_eq!(backfill_downbeats(vec![1.0], &beats), vec![1.0]);
    }
}
