use serde::{Deserialize, Serialize};

/// Three-band energy curve for one stem, one byte per frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Energy in the lowest third of the spectrum
    pub low: Vec<u8>,

    /// Energy in the middle third of the spectrum
    pub mid: Vec<u8>,

    /// Energy in the top third of the spectrum
    pub high: Vec<u8>,
}

impl Envelope {
    /// Create an all-zero envelope with `len` frames per band
    pub fn zeros(len: usize) -> Self {
        Self {
            low: vec![0; len],
            mid: vec![0; len],
            high: vec![0; len],
        }
    }

    /// Frame count, or `None` if the bands disagree
    pub fn len(&self) -> Option<usize> {
        let len = self.low.len();
        if self.mid.len() == len && self.high.len() == len {
            Some(len)
        } else {
            None
        }
    }

    /// Check if the envelope has no frames
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Whether every band is silent
    pub fn is_silent(&self) -> bool {
        self.low
            .iter()
            .chain(&self.mid)
            .chain(&self.high)
            .all(|&v| v == 0)
    }
}

/// Separated instrument stems, in the names the front end expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stem {
    Bass,
    Drum,
    Other,
    Vocal,
}

impl Stem {
    /// All stems in output order
    pub const ALL: [Stem; 4] = [Stem::Bass, Stem::Drum, Stem::Other, Stem::Vocal];

    /// Canonical key in the record
    pub fn name(&self) -> &'static str {
        match self {
            Stem::Bass => "bass",
            Stem::Drum => "drum",
            Stem::Other => "other",
            Stem::Vocal => "vocal",
        }
    }

    /// File name written by the source separator
    pub fn file_name(&self) -> &'static str {
        match self {
            Stem::Bass => "bass.wav",
            Stem::Drum => "drums.wav",
            Stem::Other => "other.wav",
            Stem::Vocal => "vocals.wav",
        }
    }
}

/// One envelope per stem at a single resolution tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StemEnvelopeSet {
    pub bass: Envelope,
    pub drum: Envelope,
    pub other: Envelope,
    pub vocal: Envelope,
}

impl StemEnvelopeSet {
    /// Zero envelopes of `len` frames for every stem
    pub fn zeros(len: usize) -> Self {
        Self {
            bass: Envelope::zeros(len),
            drum: Envelope::zeros(len),
            other: Envelope::zeros(len),
            vocal: Envelope::zeros(len),
        }
    }

    pub fn get(&self, stem: Stem) -> &Envelope {
        match stem {
            Stem::Bass => &self.bass,
            Stem::Drum => &self.drum,
            Stem::Other => &self.other,
            Stem::Vocal => &self.vocal,
        }
    }

    pub fn set(&mut self, stem: Stem, envelope: Envelope) {
        match stem {
            Stem::Bass => self.bass = envelope,
            Stem::Drum => self.drum = envelope,
            Stem::Other => self.other = envelope,
            Stem::Vocal => self.vocal = envelope,
        }
    }

    /// Shared frame count across all stems, or `None` if any differ
    pub fn frame_count(&self) -> Option<usize> {
        let first = self.bass.len()?;
        Stem::ALL
            .iter()
            .all(|&stem| self.get(stem).len() == Some(first))
            .then_some(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_envelope() {
        let env = Envelope::zeros(12);
        assert_eq!(env.len(), Some(12));
        assert!(env.is_silent());
        assert!(!env.is_empty());
    }

    #[test]
    fn test_mismatched_bands_have_no_len() {
        let env = Envelope {
            low: vec![1, 2],
            mid: vec![1],
            high: vec![1, 2],
        };
        assert_eq!(env.len(), None);
    }

    #[test]
    fn test_stem_file_mapping() {
        assert_eq!(Stem::Drum.file_name(), "drums.wav");
        assert_eq!(Stem::Vocal.file_name(), "vocals.wav");
        assert_eq!(Stem::Bass.file_name(), "bass.wav");
        assert_eq!(Stem::Other.name(), "other");
    }

    #[test]
    fn test_set_frame_count() {
        let mut set = StemEnvelopeSet::zeros(10);
        assert_eq!(set.frame_count(), Some(10));

        set.set(Stem::Vocal, Envelope::zeros(9));
        assert_eq!(set.frame_count(), None);
    }
}
